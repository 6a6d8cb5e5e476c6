use super::progress::Spinner;
use super::prompts::{prompt_number, prompt_secret, prompt_string, prompt_url, prompt_yes_no};
use crate::output::{new_table, Output};
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use media_prune_config::{Config, PathManager, SchedulerConfig, ServiceConfig};
use media_prune_sources::SourceFactoryRegistry;
use serde::Serialize;
use serde_json::json;
use std::time::Instant;
use tracing::{info, warn};

pub async fn run_config(paths: &PathManager, cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(paths, full, output),
        ConfigCommands::Init { template } if template => write_template(paths, output),
        ConfigCommands::Init { .. } => run_interactive_config(paths, output),
        ConfigCommands::Test { service } => test_connections(paths, service, output).await,
    }
}

#[derive(Debug, Serialize)]
struct ConnectionCheck {
    service: String,
    ok: bool,
    detail: String,
    elapsed_ms: u64,
}

/// Names to check: the one asked for, or every service with a URL and key
fn services_to_check(config: &Config, service: Option<String>) -> Vec<String> {
    match service {
        Some(name) => vec![name.trim().to_lowercase()],
        None => config
            .services()
            .into_iter()
            .filter(|(_, s)| s.is_some_and(ServiceConfig::has_credentials))
            .map(|(name, _)| name.to_string())
            .collect(),
    }
}

/// Contact each service once. Disabled services are checked too, so keys
/// can be verified before they are switched on.
async fn test_connections(paths: &PathManager, service: Option<String>, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if !config_file.exists() {
        return Err(eyre!(
            "Configuration file not found at {}. Run 'reclaim config init' to create one.",
            config_file.display()
        ));
    }
    let config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let names = services_to_check(&config, service);
    if names.is_empty() {
        output.warn("No service has a URL and API key yet. Run 'reclaim config init'.");
        return Ok(());
    }

    let registry = SourceFactoryRegistry::new();
    let mut checks = Vec::with_capacity(names.len());
    for name in names {
        let source = registry.source_for_check(&name, &config)?;
        let spinner = Spinner::start(format!("Contacting {name}..."), output.is_human());
        let started = Instant::now();
        let outcome = source.test_connection().await;
        spinner.finish();

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let check = match outcome {
            Ok(detail) => {
                info!(service = %name, elapsed_ms, "Connection test passed");
                ConnectionCheck { service: name, ok: true, detail, elapsed_ms }
            }
            Err(e) => {
                warn!(service = %name, error = %e, "Connection test failed");
                ConnectionCheck { service: name, ok: false, detail: e.to_string(), elapsed_ms }
            }
        };
        checks.push(check);
    }

    output.data("connections", &checks);
    let mut table = new_table(["Service", "Status", "Details", "Time"]);
    for check in &checks {
        table.add_row(vec![
            check.service.clone(),
            if check.ok { "ok" } else { "failed" }.to_string(),
            check.detail.clone(),
            format!("{} ms", check.elapsed_ms),
        ]);
    }
    output.table(&table);

    let failed = checks.iter().filter(|c| !c.ok).count();
    if failed > 0 {
        return Err(eyre!("{} of {} services could not be reached", failed, checks.len()));
    }
    output.success(format!("All {} services answered", checks.len()));
    Ok(())
}

fn show_config(paths: &PathManager, full: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'reclaim config init' to create one.");
        return Ok(());
    }
    let config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let services: Vec<_> = config
        .services()
        .into_iter()
        .map(|(name, service)| {
            json!({
                "service": name,
                "enabled": service.is_some_and(|s| s.enabled),
                "configured": service.is_some_and(ServiceConfig::is_configured),
                "url": service.map(|s| s.url.clone()),
                "api_key": service.map(|s| if full { s.api_key.clone() } else { mask_string(&s.api_key) }),
            })
        })
        .collect();
    output.data(
        "config",
        &json!({
            "config_file": config_file.display().to_string(),
            "data_dir": paths.data_dir().display().to_string(),
            "services": services,
            "scheduler": config.scheduler.as_ref().map(|s| json!({
                "interval_minutes": s.interval_minutes,
                "run_on_startup": s.run_on_startup,
            })),
            "regenerate_after_sync": config.suggestions.regenerate_after_sync,
        }),
    );

    let mut locations = new_table(["Location", "Path"]);
    locations.add_row(vec!["Config file".to_string(), config_file.display().to_string()]);
    locations.add_row(vec!["Data".to_string(), paths.data_dir().display().to_string()]);
    locations.add_row(vec!["Logs".to_string(), paths.log_dir().display().to_string()]);
    output.table(&locations);

    let mut table = new_table(["Service", "Enabled", "URL", "API key"]);
    for (name, service) in config.services() {
        match service {
            Some(s) => table.add_row(vec![
                name.to_string(),
                if s.enabled { "yes" } else { "no" }.to_string(),
                s.url.clone(),
                if full { s.api_key.clone() } else { mask_string(&s.api_key) },
            ]),
            None => table.add_row(vec![name.to_string(), "-".to_string(), "-".to_string(), "-".to_string()]),
        };
    }
    output.table(&table);

    match &config.scheduler {
        Some(s) => output.info(format!(
            "Daemon syncs every {} minutes{}",
            s.interval_minutes,
            if s.run_on_startup { ", starting with a sync" } else { "" }
        )),
        None => output.info("No scheduler section; the daemon uses a 360 minute interval"),
    }
    if let Err(e) = config.validate() {
        output.warn(format!("Configuration is not valid: {e}"));
    }
    Ok(())
}

fn write_template(paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if config_file.exists() {
        return Err(eyre!("{} already exists; edit it or remove it first", config_file.display()));
    }
    Config::template()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;
    output.success(format!("Template written to {}", config_file.display()));
    output.info("Enable the services you use and fill in their API keys.");
    Ok(())
}

/// Walk through every service, then the scheduler, and save
pub fn run_interactive_config(paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    let mut config = if config_file.exists() {
        Config::load_from_file(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?
    } else {
        Config::template()
    };

    output.section("Services");
    output.println("API keys are under Settings > General in Radarr, Sonarr and Overseerr,");
    output.println("and under Settings > Web Interface in Tautulli.");

    config.sources.radarr = prompt_service("Radarr", config.sources.radarr.take(), "http://localhost:7878")?;
    config.sources.sonarr = prompt_service("Sonarr", config.sources.sonarr.take(), "http://localhost:8989")?;
    config.sources.tautulli =
        prompt_service("Tautulli", config.sources.tautulli.take(), "http://localhost:8181")?;
    config.sources.overseerr =
        prompt_service("Overseerr", config.sources.overseerr.take(), "http://localhost:5055")?;

    output.section("Scheduler");
    let current = config.scheduler.take().unwrap_or_else(media_prune_config::default_scheduler_config);
    config.scheduler = Some(SchedulerConfig {
        interval_minutes: prompt_number("Minutes between syncs", current.interval_minutes)?,
        run_on_startup: prompt_yes_no("Sync when the daemon starts?", current.run_on_startup)?,
    });
    config.suggestions.regenerate_after_sync = prompt_yes_no(
        "Regenerate suggestions after every sync?",
        config.suggestions.regenerate_after_sync,
    )?;

    config
        .validate()
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.println("");
    output.success(format!("Configuration saved to {}", config_file.display()));
    let configured = config.configured_services();
    if configured.is_empty() {
        output.warn("No service is enabled yet; 'reclaim sync' will have nothing to fetch.");
    } else {
        output.info(format!("Enabled: {}", configured.join(", ")));
    }
    Ok(())
}

fn prompt_service(name: &str, current: Option<ServiceConfig>, default_url: &str) -> Result<Option<ServiceConfig>> {
    let enabled_now = current.as_ref().is_some_and(ServiceConfig::is_configured);
    if !prompt_yes_no(&format!("Use {name}?"), enabled_now)? {
        return Ok(current.map(|mut s| {
            s.enabled = false;
            s
        }));
    }

    let url_default = current
        .as_ref()
        .map(|s| s.url.as_str())
        .filter(|u| !u.is_empty())
        .unwrap_or(default_url);
    let url = prompt_url(&format!("{name} URL"), url_default)?;

    let api_key = match current.filter(ServiceConfig::is_configured) {
        Some(existing) => {
            let entered = prompt_string(
                &format!("{name} API key (leave empty to keep {})", mask_string(&existing.api_key)),
                None,
            )?;
            if entered.trim().is_empty() {
                existing.api_key
            } else {
                entered.trim().to_string()
            }
        }
        None => prompt_secret(&format!("{name} API key"))?.trim().to_string(),
    };

    Ok(Some(ServiceConfig::new(url, api_key)))
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s == "YOUR_API_KEY" {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}***{tail}")
}
