//! Source factory pattern for creating catalog sources from configuration

use media_prune_config::{Config, ServiceConfig};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::SourceError;
use crate::traits::CatalogSource;
use crate::{OverseerrClient, RadarrClient, SonarrClient, TautulliClient};

pub trait SourceFactory: Send + Sync {
    /// The name of the source this factory creates
    fn source_name(&self) -> &'static str;

    fn service_config<'a>(&self, config: &'a Config) -> Option<&'a ServiceConfig>;

    fn build(&self, service: &ServiceConfig) -> Result<Box<dyn CatalogSource>, SourceError>;

    /// Create the source, or None when it is disabled or unconfigured
    fn create_source(&self, config: &Config) -> Result<Option<Box<dyn CatalogSource>>, SourceError> {
        match self.service_config(config) {
            Some(service) if service.is_configured() => self.build(service).map(Some),
            _ => {
                debug!("{} is not configured, skipping", self.source_name());
                Ok(None)
            }
        }
    }
}

/// Registry of source factories
pub struct SourceFactoryRegistry {
    factories: BTreeMap<&'static str, Box<dyn SourceFactory>>,
}

impl SourceFactoryRegistry {
    /// Create a new registry with all built-in factories registered
    pub fn new() -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
        };
        registry.register(Box::new(RadarrFactory));
        registry.register(Box::new(SonarrFactory));
        registry.register(Box::new(TautulliFactory));
        registry.register(Box::new(OverseerrFactory));
        registry
    }

    pub fn register(&mut self, factory: Box<dyn SourceFactory>) {
        self.factories.insert(factory.source_name(), factory);
    }

    /// Create all enabled sources from configuration
    pub fn create_all_sources(&self, config: &Config) -> Result<Vec<Box<dyn CatalogSource>>, SourceError> {
        let mut sources = Vec::new();
        for factory in self.factories.values() {
            if let Some(source) = factory.create_source(config)? {
                sources.push(source);
            }
        }
        Ok(sources)
    }

    /// Build one source by name for a connection check. Disabled services are
    /// built too, as long as their credentials are filled in.
    pub fn source_for_check(&self, name: &str, config: &Config) -> Result<Box<dyn CatalogSource>, SourceError> {
        let name = name.to_ascii_lowercase();
        let factory = self
            .factories
            .get(name.as_str())
            .ok_or(SourceError::UnknownSource(name.clone()))?;
        match factory.service_config(config) {
            Some(service) if service.has_credentials() => factory.build(service),
            _ => Err(SourceError::NotConfigured(factory.source_name())),
        }
    }

    pub fn registered_sources(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for SourceFactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a Radarr client for deletions, if Radarr is configured
pub fn radarr_client(config: &Config) -> Result<RadarrClient, SourceError> {
    match config.sources.radarr.as_ref().filter(|s| s.is_configured()) {
        Some(service) => RadarrClient::new(&service.url, &service.api_key),
        None => Err(SourceError::NotConfigured("Radarr")),
    }
}

pub fn sonarr_client(config: &Config) -> Result<SonarrClient, SourceError> {
    match config.sources.sonarr.as_ref().filter(|s| s.is_configured()) {
        Some(service) => SonarrClient::new(&service.url, &service.api_key),
        None => Err(SourceError::NotConfigured("Sonarr")),
    }
}

/// Overseerr is optional for deletions, so absence is not an error here
pub fn overseerr_client(config: &Config) -> Result<Option<OverseerrClient>, SourceError> {
    config
        .sources
        .overseerr
        .as_ref()
        .filter(|s| s.is_configured())
        .map(|service| OverseerrClient::new(&service.url, &service.api_key))
        .transpose()
}

macro_rules! service_factory {
    ($factory:ident, $name:literal, $field:ident, $client:ident) => {
        struct $factory;

        impl SourceFactory for $factory {
            fn source_name(&self) -> &'static str {
                $name
            }

            fn service_config<'a>(&self, config: &'a Config) -> Option<&'a ServiceConfig> {
                config.sources.$field.as_ref()
            }

            fn build(&self, service: &ServiceConfig) -> Result<Box<dyn CatalogSource>, SourceError> {
                Ok(Box::new($client::new(&service.url, &service.api_key)?))
            }
        }
    };
}

service_factory!(RadarrFactory, "radarr", radarr, RadarrClient);
service_factory!(SonarrFactory, "sonarr", sonarr, SonarrClient);
service_factory!(TautulliFactory, "tautulli", tautulli, TautulliClient);
service_factory!(OverseerrFactory, "overseerr", overseerr, OverseerrClient);
