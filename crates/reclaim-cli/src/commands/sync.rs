use super::progress::Spinner;
use super::{load_config, open_service};
use crate::output::{new_table, Output};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use media_prune_config::{Config, PathManager};
use media_prune_core::{CatalogSync, FileStore, SuggestionService, SyncReport};
use media_prune_sources::SourceFactoryRegistry;

/// Build the sync pipeline for every configured source
pub fn build_sync(config: &Config, regenerate: bool) -> Result<CatalogSync> {
    let sources = SourceFactoryRegistry::new()
        .create_all_sources(config)
        .wrap_err("Failed to create sources")?;
    if sources.is_empty() {
        return Err(eyre!(
            "No services are configured. Enable at least Radarr or Sonarr with 'reclaim config init'."
        ));
    }
    Ok(CatalogSync::new(sources).with_regenerate(regenerate))
}

pub async fn sync_once(
    sync: &CatalogSync,
    service: &mut SuggestionService<FileStore>,
    output: &Output,
) -> Result<SyncReport> {
    let spinner = Spinner::start(
        format!("Syncing from {}...", sync.source_names().join(", ")),
        output.is_human(),
    );
    let report = sync
        .run(service)
        .await
        .map_err(|e| eyre!("Sync failed: {:#}", e))?;
    spinner.finish();
    Ok(report)
}

pub async fn run_sync(paths: &PathManager, no_generate: bool, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");

    let config = load_config(paths)?;
    let regenerate = config.suggestions.regenerate_after_sync && !no_generate;
    let sync = build_sync(&config, regenerate)?;
    let mut service = open_service(paths)?;

    let report = sync_once(&sync, &mut service, output).await?;
    print_report(&report, output);
    Ok(())
}

pub fn print_report(report: &SyncReport, output: &Output) {
    output.data("sync", report);

    let mut table = new_table(["", "Added", "Updated", "Removed"]);
    for (label, counts) in [("Movies", report.movies), ("Series", report.series)] {
        table.add_row(vec![
            label.to_string(),
            counts.added.to_string(),
            counts.updated.to_string(),
            counts.removed.to_string(),
        ]);
    }
    output.table(&table);
    output.info(format!(
        "{} episodes on disk, {} plays and {} requests applied in {:.1}s",
        report.episodes,
        report.plays_applied,
        report.requests_applied,
        report.duration.as_secs_f64()
    ));

    for source in &report.failed_sources {
        output.warn(format!("{source} could not be reached; its data was left unchanged"));
    }
    match &report.regenerated {
        Some(generated) => output.success(format!(
            "Sync complete, {} suggestions generated",
            generated.created
        )),
        None => output.success("Sync complete"),
    }
}
