use anyhow::Result;
use std::io;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Filter for the given verbosity. `RUST_LOG` wins unless `-q` was passed.
fn build_filter(verbose_level: u8, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    let default = match verbose_level {
        0 => "info",
        // keep the HTTP stack quiet at -v
        1 => "debug,hyper=warn,reqwest=warn,rustls=warn",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn wants_json() -> bool {
    std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true" || v == "1")
        .unwrap_or_else(|_| !io::stdout().is_terminal())
}

/// Daily-rotated appender for `log_path`, e.g. `reclaim.log` becomes `reclaim.2026-01-17`
fn file_appender(log_path: &PathBuf) -> Result<RollingFileAppender> {
    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;

    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;
    let prefix = file_name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file_name);

    Ok(RollingFileAppender::new(Rotation::DAILY, log_dir, prefix))
}

/// Console logging to stderr, plus a rotating file when `log_file` is given.
/// The file always gets JSON lines so it can be shipped as-is.
pub fn init_logging_with_file(verbose_level: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let json = wants_json();

    let console = if json {
        fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr)
            .boxed()
    };

    let file = match log_file {
        Some(path) => Some(
            fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(file_appender(&path)?)
                .boxed(),
        ),
        None => None,
    };

    Registry::default()
        .with(build_filter(verbose_level, quiet))
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;

    Ok(())
}
