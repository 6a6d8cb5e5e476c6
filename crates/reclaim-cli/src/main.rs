use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use commands::{clear, config, daemon, generate, media, rules, suggestions, sync};
use media_prune_config::PathManager;
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "reclaim")]
#[command(about = "Reclaim - find what your media library can live without")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the catalog from Radarr, Sonarr, Tautulli and Overseerr
    #[command(long_about = "Fetch the library from every configured service, merge it into the local catalog and regenerate suggestions (unless disabled in the configuration).")]
    Sync {
        /// Do not regenerate suggestions after the sync
        #[arg(long, action = ArgAction::SetTrue)]
        no_generate: bool,
    },
    /// Evaluate the rules against the catalog and rebuild the suggestion list
    Generate,
    /// List, dismiss or act on suggestions
    Suggestions {
        #[command(subcommand)]
        cmd: Option<SuggestionCommands>,
    },
    /// Manage suggestion rules
    #[command(long_about = "Manage suggestion rules. Conditions are given as a JSON array, e.g. '[{\"field\":\"lastWatched\",\"operator\":\"before\",\"value\":\"180\",\"valueType\":\"customDays\",\"logicalOperator\":null}]'. Every change regenerates suggestions.")]
    Rules {
        #[command(subcommand)]
        cmd: Option<RuleCommands>,
    },
    /// Browse the catalog or delete an item directly
    #[command(long_about = "List the movies, series and episodes in the local catalog, newest first, or delete one from Radarr/Sonarr. Deleting a movie or series also removes its Overseerr request.")]
    Media {
        #[command(subcommand)]
        cmd: Option<MediaCommands>,
    },
    /// Run as a long-lived process that syncs on an interval
    #[command(long_about = "Run Reclaim in the foreground, syncing the catalog and regenerating suggestions every interval. Stops cleanly on Ctrl-C or SIGTERM.")]
    Daemon {
        /// Minutes between syncs (overrides scheduler.interval_minutes)
        #[arg(long, value_name = "MINUTES")]
        interval_minutes: Option<u64>,

        /// Skip the sync on startup
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_sync: bool,
    },
    /// Show or create the configuration
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Delete stored data
    #[command(long_about = "Delete locally stored data. --catalog removes the catalog snapshot (the next sync rebuilds it), --suggestions removes every suggestion including dismissed ones, --all does both. Rules are never cleared.")]
    Clear {
        /// Clear the catalog and suggestions
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        /// Clear the catalog snapshot
        #[arg(long, action = ArgAction::SetTrue)]
        catalog: bool,

        /// Clear all suggestions, including dismissed ones
        #[arg(long, action = ArgAction::SetTrue)]
        suggestions: bool,
    },
}

#[derive(Subcommand)]
pub enum SuggestionCommands {
    /// List active suggestions
    List {
        /// Include dismissed suggestions
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,
    },
    /// Hide a suggestion; it will not come back for the same rule
    Dismiss { id: u64 },
    /// Delete the suggested item from Radarr/Sonarr and clean up its request
    Execute {
        id: u64,

        /// Do not ask for confirmation
        #[arg(long, short = 'y', action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum MediaCommands {
    /// List catalog items; without filters both movies and series are shown
    List {
        #[arg(long, action = ArgAction::SetTrue)]
        movies: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        series: bool,

        /// Also list every series' episodes
        #[arg(long, action = ArgAction::SetTrue)]
        episodes: bool,
    },
    /// Delete a movie, series or episode file upstream and from the catalog
    Delete {
        #[arg(value_enum)]
        target: MediaTarget,

        /// Catalog id, as shown by 'reclaim media list'
        id: u64,

        /// Do not ask for confirmation
        #[arg(long, short = 'y', action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaTarget {
    Movie,
    Series,
    Episode,
}

#[derive(Subcommand)]
pub enum RuleCommands {
    /// List all rules
    List,
    /// Show a rule with its conditions
    Show { id: u64 },
    /// Create a custom rule
    Add(RuleArgs),
    /// Change an existing rule; omitted options keep their current value
    Update {
        id: u64,
        #[command(flatten)]
        args: RuleArgs,
    },
    /// Delete a custom rule
    Delete { id: u64 },
    /// Enable a rule
    Enable { id: u64 },
    /// Disable a rule
    Disable { id: u64 },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RuleArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Conditions as a JSON array
    #[arg(long, conflicts_with = "conditions_file")]
    pub conditions: Option<String>,

    /// Read the conditions JSON from a file
    #[arg(long, value_name = "PATH")]
    pub conditions_file: Option<PathBuf>,

    /// Evaluate the rule against movies
    #[arg(long)]
    pub movies: Option<bool>,

    /// Evaluate the rule against series
    #[arg(long)]
    pub series: Option<bool>,

    /// Create or leave the rule disabled
    #[arg(long, action = ArgAction::SetTrue)]
    pub disabled: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current configuration (API keys masked)
    Show {
        /// Show API keys unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Interactive setup wizard
    Init {
        /// Write a template without prompting
        #[arg(long, action = ArgAction::SetTrue)]
        template: bool,
    },
    /// Check that services answer with the configured URL and API key
    Test {
        /// radarr, sonarr, tautulli or overseerr; every service with a key when omitted
        service: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let paths = PathManager::default();

    // the daemon is usually unattended, so it also keeps a rotating log file
    let log_file = matches!(cli.command, Commands::Daemon { .. }).then(|| paths.daemon_log_file());
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync { no_generate } => sync::run_sync(&paths, no_generate, &output).await,
        Commands::Generate => generate::run_generate(&paths, &output),
        Commands::Suggestions { cmd } => {
            let cmd = cmd.unwrap_or(SuggestionCommands::List { all: false });
            suggestions::run_suggestions(&paths, cmd, &output).await
        }
        Commands::Media { cmd } => {
            let cmd = cmd.unwrap_or(MediaCommands::List {
                movies: false,
                series: false,
                episodes: false,
            });
            media::run_media(&paths, cmd, &output).await
        }
        Commands::Rules { cmd } => rules::run_rules(&paths, cmd.unwrap_or(RuleCommands::List), &output),
        Commands::Daemon {
            interval_minutes,
            no_startup_sync,
        } => daemon::run_daemon(&paths, interval_minutes, no_startup_sync, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(&paths, cmd, &output).await
        }
        Commands::Clear {
            all,
            catalog,
            suggestions,
        } => clear::run_clear(&paths, all, catalog, suggestions, &output),
    }
}
