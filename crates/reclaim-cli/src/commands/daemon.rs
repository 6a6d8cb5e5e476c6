use super::sync::{build_sync, print_report, sync_once};
use super::{load_config, open_service};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use media_prune_config::{default_scheduler_config, PathManager};
use media_prune_core::{CatalogSync, FileStore, SuggestionService};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Runs a sync every `interval_minutes` until interrupted
pub struct Scheduler {
    sync: CatalogSync,
    service: SuggestionService<FileStore>,
    period: Duration,
    run_on_startup: bool,
}

impl Scheduler {
    pub fn new(
        sync: CatalogSync,
        service: SuggestionService<FileStore>,
        interval_minutes: u64,
        run_on_startup: bool,
    ) -> Result<Self> {
        if interval_minutes == 0 {
            return Err(eyre!("Interval must be at least one minute"));
        }
        Ok(Self {
            sync,
            service,
            period: Duration::from_secs(interval_minutes * 60),
            run_on_startup,
        })
    }

    pub async fn start(&mut self, output: &Output) -> Result<()> {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        if self.run_on_startup {
            info!(operation = "scheduler_startup", "Running initial sync on startup");
            self.run_once(output).await;
        }

        info!(
            operation = "scheduler_started",
            interval_minutes = self.period.as_secs() / 60,
            "Scheduler started"
        );

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    info!(operation = "scheduled_sync_start", "Starting scheduled sync");
                    self.run_once(output).await;
                }
                _ = &mut shutdown => {
                    info!(operation = "scheduler_stopped", "Shutdown signal received, stopping");
                    return Ok(());
                }
            }
        }
    }

    /// One sync; failures are logged and the loop carries on
    async fn run_once(&mut self, output: &Output) {
        match sync_once(&self.sync, &mut self.service, output).await {
            Ok(report) => {
                info!(
                    operation = "scheduled_sync_complete",
                    failed_sources = report.failed_sources.len(),
                    duration_ms = report.duration.as_millis() as u64,
                    "Scheduled sync completed"
                );
                print_report(&report, output);
            }
            Err(e) => {
                error!(operation = "scheduled_sync_error", error = %e, "Scheduled sync failed");
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

pub async fn run_daemon(
    paths: &PathManager,
    interval_override: Option<u64>,
    no_startup_sync: bool,
    output: &Output,
) -> Result<()> {
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create directories under {}: {}", paths.config_dir().display(), e))?;

    let config = load_config(paths)?;
    let scheduler_config = config.scheduler.clone().unwrap_or_else(default_scheduler_config);
    let interval_minutes = interval_override.unwrap_or(scheduler_config.interval_minutes);
    let run_on_startup = scheduler_config.run_on_startup && !no_startup_sync;

    let sync = build_sync(&config, config.suggestions.regenerate_after_sync)?;
    let service = open_service(paths)?;

    output.info(format!(
        "Syncing every {} minutes; logs in {}",
        interval_minutes,
        paths.log_dir().display()
    ));

    let mut scheduler = Scheduler::new(sync, service, interval_minutes, run_on_startup)?;
    scheduler.start(output).await
}
