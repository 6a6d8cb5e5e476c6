use super::media::{confirm_deletion, delete_upstream};
use super::{load_config, open_service};
use crate::output::{format_size, new_table, Output};
use crate::SuggestionCommands;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use media_prune_config::{Config, PathManager};
use media_prune_core::{FileStore, LibraryStore, MediaRef, SuggestionService};

pub async fn run_suggestions(paths: &PathManager, cmd: SuggestionCommands, output: &Output) -> Result<()> {
    let mut service = open_service(paths)?;
    match cmd {
        SuggestionCommands::List { all } => list(&service, all, output),
        SuggestionCommands::Dismiss { id } => {
            let suggestion = service.dismiss(id)?;
            output.data("dismissed", &suggestion);
            output.success(format!("Dismissed suggestion {} ({})", id, suggestion.title));
            Ok(())
        }
        SuggestionCommands::Execute { id, yes } => {
            let config = load_config(paths)?;
            execute(&mut service, &config, id, yes, output).await
        }
    }
}

fn list(service: &SuggestionService<FileStore>, all: bool, output: &Output) -> Result<()> {
    let suggestions = if all {
        let mut every = service.store().load_suggestions()?;
        every.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        every
    } else {
        service.active_suggestions()?
    };

    output.data("suggestions", &suggestions);
    if suggestions.is_empty() {
        output.info("No suggestions. Run 'reclaim generate' after a sync.");
        return Ok(());
    }

    let mut table = new_table(["ID", "Type", "Title", "Size", "Rule", "Reason", "Created"]);
    for s in &suggestions {
        let title = match s.year {
            Some(year) => format!("{} ({})", s.title, year),
            None => s.title.clone(),
        };
        let id = if s.dismissed {
            format!("{} (dismissed)", s.id)
        } else {
            s.id.to_string()
        };
        table.add_row(vec![
            id,
            s.media_type.to_string(),
            title,
            format_size(s.size),
            s.rule_name.clone(),
            s.reason.clone(),
            s.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    output.table(&table);

    let reclaimable: u64 = suggestions.iter().filter(|s| !s.dismissed).map(|s| s.size).sum();
    output.info(format!(
        "{} suggestions, {} reclaimable",
        suggestions.len(),
        format_size(reclaimable)
    ));
    Ok(())
}

/// Delete the item behind a suggestion from Radarr or Sonarr, drop its
/// Overseerr request and remove it from the local catalog.
async fn execute(
    service: &mut SuggestionService<FileStore>,
    config: &Config,
    id: u64,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let suggestion = service.suggestion(id)?;
    if suggestion.dismissed {
        return Err(eyre!("Suggestion {} was already dismissed or executed", id));
    }

    let question = format!(
        "Delete {} '{}' and its files ({})?",
        suggestion.media_type.to_string().to_lowercase(),
        suggestion.title,
        format_size(suggestion.size)
    );
    if !confirm_deletion(&question, yes, output)? {
        return Ok(());
    }

    let catalog = service.catalog()?;
    let target = MediaRef {
        media_type: suggestion.media_type,
        media_id: suggestion.media_id,
    };
    delete_upstream(&catalog, config, target, output)
        .await
        .wrap_err_with(|| format!("Could not delete {}", suggestion.title))?;

    let media = service.execute(id)?;
    service.remove_media(media)?;

    output.data("executed", &media);
    output.success(format!(
        "Deleted {} ({} freed)",
        suggestion.title,
        format_size(suggestion.size)
    ));
    Ok(())
}
