pub mod config;
pub mod paths;

pub use config::{Config, SchedulerConfig, ServiceConfig, SourceConfig, SuggestionOptions, default_scheduler_config};
pub use paths::{PathManager, container_base_path};
