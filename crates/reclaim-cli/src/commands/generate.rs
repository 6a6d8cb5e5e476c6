use super::open_service;
use crate::output::Output;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use media_prune_config::PathManager;
use media_prune_core::GenerationReport;

pub fn run_generate(paths: &PathManager, output: &Output) -> Result<()> {
    let mut service = open_service(paths)?;

    let catalog = service.catalog().wrap_err("Failed to load catalog")?;
    if catalog.is_empty() {
        output.warn("The catalog is empty. Run 'reclaim sync' first.");
    }

    let report = service.generate_suggestions().wrap_err("Failed to generate suggestions")?;
    print_generation(&report, output);
    Ok(())
}

pub fn print_generation(report: &GenerationReport, output: &Output) {
    output.data("generate", report);

    for skipped in &report.skipped_rules {
        output.warn(format!(
            "Rule {} ({}) was skipped: {}",
            skipped.rule_id, skipped.rule_name, skipped.reason
        ));
    }
    if report.suppressed > 0 {
        output.info(format!("{} matches hidden by earlier dismissals", report.suppressed));
    }
    output.success(format!(
        "{} suggestions from {} rules in {} ms",
        report.created, report.rules_evaluated, report.elapsed_ms
    ));
}
