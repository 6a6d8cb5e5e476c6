use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourceConfig,
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,
    #[serde(default)]
    pub suggestions: SuggestionOptions,
}

/// Connection settings for the four upstream services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub radarr: Option<ServiceConfig>,
    #[serde(default)]
    pub sonarr: Option<ServiceConfig>,
    #[serde(default)]
    pub tautulli: Option<ServiceConfig>,
    #[serde(default)]
    pub overseerr: Option<ServiceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub url: String,
    pub api_key: String,
}

impl ServiceConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            enabled: true,
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    /// Enabled with a URL and a real API key
    pub fn is_configured(&self) -> bool {
        self.enabled && self.has_credentials()
    }

    /// URL and a real API key are filled in, enabled or not
    pub fn has_credentials(&self) -> bool {
        !self.url.trim().is_empty() && !self.api_key.trim().is_empty() && self.api_key != PLACEHOLDER_API_KEY
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionOptions {
    /// Regenerate suggestions after every successful catalog sync
    #[serde(default = "default_true")]
    pub regenerate_after_sync: bool,
}

impl Default for SuggestionOptions {
    fn default() -> Self {
        Self {
            regenerate_after_sync: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval_minutes() -> u64 {
    360 // Every 6 hours
}

pub fn default_scheduler_config() -> SchedulerConfig {
    SchedulerConfig {
        interval_minutes: default_interval_minutes(),
        run_on_startup: default_true(),
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Starter file written by `config init`, every service disabled with placeholder values
    pub fn template() -> Self {
        let placeholder = |url: &str| ServiceConfig {
            enabled: false,
            url: url.to_string(),
            api_key: PLACEHOLDER_API_KEY.to_string(),
        };
        Self {
            sources: SourceConfig {
                radarr: Some(placeholder("http://localhost:7878")),
                sonarr: Some(placeholder("http://localhost:8989")),
                tautulli: Some(placeholder("http://localhost:8181")),
                overseerr: Some(placeholder("http://localhost:5055")),
            },
            scheduler: Some(default_scheduler_config()),
            suggestions: SuggestionOptions::default(),
        }
    }

    /// Services in a fixed order, paired with their names
    pub fn services(&self) -> [(&'static str, Option<&ServiceConfig>); 4] {
        [
            ("radarr", self.sources.radarr.as_ref()),
            ("sonarr", self.sources.sonarr.as_ref()),
            ("tautulli", self.sources.tautulli.as_ref()),
            ("overseerr", self.sources.overseerr.as_ref()),
        ]
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, service) in self.services() {
            let Some(service) = service else { continue };
            if !service.enabled {
                continue;
            }
            if !(service.url.starts_with("http://") || service.url.starts_with("https://")) {
                return Err(anyhow::anyhow!("{} url must start with http:// or https://", name));
            }
            if service.api_key.is_empty() || service.api_key == PLACEHOLDER_API_KEY {
                return Err(anyhow::anyhow!("{} is enabled but api_key is not configured", name));
            }
        }

        if let Some(scheduler) = &self.scheduler {
            if scheduler.interval_minutes == 0 {
                return Err(anyhow::anyhow!("scheduler.interval_minutes must be greater than zero"));
            }
        }

        Ok(())
    }

    /// Get list of configured and enabled services
    pub fn configured_services(&self) -> Vec<String> {
        self.services()
            .into_iter()
            .filter(|(_, service)| service.is_some_and(ServiceConfig::is_configured))
            .map(|(name, _)| name.to_string())
            .collect()
    }
}
