use super::open_service;
use crate::output::{new_table, Output};
use crate::{RuleArgs, RuleCommands};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use media_prune_config::PathManager;
use media_prune_core::{FileStore, RuleDraft, SuggestionService};
use media_prune_models::SuggestionRule;

pub fn run_rules(paths: &PathManager, cmd: RuleCommands, output: &Output) -> Result<()> {
    let mut service = open_service(paths)?;
    match cmd {
        RuleCommands::List => {
            let rules = service.rules()?;
            output.data("rules", &rules);

            let mut table = new_table(["ID", "Name", "Enabled", "Applies to", "Conditions", "Custom"]);
            for rule in &rules {
                let conditions = rule
                    .parse_conditions()
                    .map(|c| c.len().to_string())
                    .unwrap_or_else(|_| "invalid".to_string());
                table.add_row(vec![
                    rule.id.to_string(),
                    rule.name.clone(),
                    yes_no(rule.enabled).to_string(),
                    applies_to(rule),
                    conditions,
                    yes_no(rule.is_custom).to_string(),
                ]);
            }
            output.table(&table);
            Ok(())
        }
        RuleCommands::Show { id } => {
            let rule = service.rule(id)?;
            show_rule(&rule, output);
            Ok(())
        }
        RuleCommands::Add(args) => {
            let draft = draft_from_args(args, None)?;
            let rule = service.create_rule(draft)?;
            output.data("rule", &rule);
            output.success(format!("Created rule {} ({})", rule.id, rule.name));
            Ok(())
        }
        RuleCommands::Update { id, args } => {
            let current = service.rule(id)?;
            let draft = draft_from_args(args, Some(&current))?;
            let rule = service.update_rule(id, draft)?;
            output.data("rule", &rule);
            output.success(format!("Updated rule {} ({})", rule.id, rule.name));
            Ok(())
        }
        RuleCommands::Delete { id } => {
            let rule = service.delete_rule(id)?;
            output.data("rule", &rule);
            output.success(format!("Deleted rule {} ({})", rule.id, rule.name));
            Ok(())
        }
        RuleCommands::Enable { id } => toggle(&mut service, id, true, output),
        RuleCommands::Disable { id } => toggle(&mut service, id, false, output),
    }
}

fn toggle(service: &mut SuggestionService<FileStore>, id: u64, enabled: bool, output: &Output) -> Result<()> {
    let rule = service.set_rule_enabled(id, enabled)?;
    output.data("rule", &rule);
    output.success(format!(
        "Rule {} ({}) {}",
        rule.id,
        rule.name,
        if enabled { "enabled" } else { "disabled" }
    ));
    Ok(())
}

fn show_rule(rule: &SuggestionRule, output: &Output) {
    output.data("rule", rule);

    output.section(&format!("Rule {}: {}", rule.id, rule.name));
    if !rule.description.is_empty() {
        output.println(&rule.description);
    }
    output.println(format!(
        "Enabled: {}   Applies to: {}   Custom: {}",
        yes_no(rule.enabled),
        applies_to(rule),
        yes_no(rule.is_custom)
    ));

    match rule.parse_conditions() {
        Ok(conditions) => {
            let mut table = new_table(["#", "Field", "Operator", "Value", "Type", "Then"]);
            for (index, condition) in conditions.iter().enumerate() {
                table.add_row(vec![
                    (index + 1).to_string(),
                    condition.field.as_str().to_string(),
                    condition.operator.as_str().to_string(),
                    condition.value.clone(),
                    condition.value_type.as_str().to_string(),
                    condition
                        .logical_operator
                        .as_ref()
                        .map(|link| link.as_str().to_string())
                        .unwrap_or_default(),
                ]);
            }
            output.table(&table);
        }
        Err(e) => output.warn(format!("Stored conditions do not parse: {e}")),
    }
}

/// Merge command-line options over an existing rule (for update) or over
/// defaults (for add). Adding requires a name and conditions.
fn draft_from_args(args: RuleArgs, base: Option<&SuggestionRule>) -> Result<RuleDraft> {
    let conditions_json = match (args.conditions, args.conditions_file) {
        (Some(json), _) => Some(json),
        (None, Some(path)) => Some(
            std::fs::read_to_string(&path)
                .wrap_err_with(|| format!("Failed to read conditions from {}", path.display()))?,
        ),
        (None, None) => None,
    };

    let draft = match base {
        Some(rule) => RuleDraft {
            name: args.name.unwrap_or_else(|| rule.name.clone()),
            description: args.description.unwrap_or_else(|| rule.description.clone()),
            enabled: rule.enabled && !args.disabled,
            apply_to_movies: args.movies.unwrap_or(rule.apply_to_movies),
            apply_to_series: args.series.unwrap_or(rule.apply_to_series),
            conditions_json: conditions_json.unwrap_or_else(|| rule.conditions_json.clone()),
        },
        None => RuleDraft {
            name: args.name.ok_or_else(|| eyre!("--name is required"))?,
            description: args.description.unwrap_or_default(),
            enabled: !args.disabled,
            apply_to_movies: args.movies.unwrap_or(true),
            apply_to_series: args.series.unwrap_or(true),
            conditions_json: conditions_json
                .ok_or_else(|| eyre!("--conditions or --conditions-file is required"))?,
        },
    };
    Ok(draft)
}

fn applies_to(rule: &SuggestionRule) -> String {
    match (rule.apply_to_movies, rule.apply_to_series) {
        (true, true) => "movies, series",
        (true, false) => "movies",
        (false, true) => "series",
        (false, false) => "nothing",
    }
    .to_string()
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
