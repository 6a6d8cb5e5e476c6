pub mod clear;
pub mod config;
pub mod daemon;
pub mod generate;
pub mod media;
pub mod progress;
pub mod prompts;
pub mod rules;
pub mod suggestions;
pub mod sync;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use media_prune_config::{Config, PathManager};
use media_prune_core::{FileStore, SuggestionService};

/// Load and validate the config file, pointing at `reclaim config init` when it is missing
pub fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    if !config_file.exists() {
        return Err(eyre!(
            "Configuration file not found at {}. Run 'reclaim config init' to create one.",
            config_file.display()
        ));
    }
    let config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;
    Ok(config)
}

pub fn open_service(paths: &PathManager) -> Result<SuggestionService<FileStore>> {
    let store = FileStore::new(paths.data_dir())
        .wrap_err_with(|| format!("Failed to open data directory {}", paths.data_dir().display()))?;
    Ok(SuggestionService::new(store))
}
