use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use media_prune_sources::{CatalogSource, SourcePayload};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::merge::{apply_movies, apply_plays, apply_requests, apply_series, MergeCounts};
use crate::service::{GenerationReport, SuggestionService};
use crate::store::LibraryStore;

/// Pulls every configured source and folds the results into the stored catalog
pub struct CatalogSync {
    sources: Vec<Box<dyn CatalogSource>>,
    regenerate_after_sync: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub movies: MergeCounts,
    pub series: MergeCounts,
    pub episodes: usize,
    pub plays_applied: usize,
    pub requests_applied: usize,
    pub failed_sources: Vec<String>,
    pub regenerated: Option<GenerationReport>,
    #[serde(skip)]
    pub duration: Duration,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed_sources.is_empty()
    }
}

impl CatalogSync {
    pub fn new(sources: Vec<Box<dyn CatalogSource>>) -> Self {
        Self {
            sources,
            regenerate_after_sync: true,
        }
    }

    pub fn with_regenerate(mut self, regenerate: bool) -> Self {
        self.regenerate_after_sync = regenerate;
        self
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.source_name()).collect()
    }

    /// Fetch all sources concurrently, then apply what arrived.
    ///
    /// A failing source is logged and skipped; the data it would have
    /// refreshed stays as it was.
    #[instrument(skip(self, service))]
    pub async fn run<S: LibraryStore>(&self, service: &mut SuggestionService<S>) -> Result<SyncReport> {
        let start = Instant::now();
        let mut report = SyncReport::default();

        info!(
            operation = "sync_start",
            sources = ?self.source_names(),
            "Starting catalog sync"
        );

        let fetches = self.sources.iter().map(|source| async move {
            let name = source.source_name().to_string();
            let result = source.fetch().await;
            (name, result)
        });
        let results = join_all(fetches).await;

        let mut payloads = Vec::new();
        for (name, result) in results {
            match result {
                Ok(payload) => {
                    debug!(source = %name, kind = payload.kind(), items = payload.len(), "Fetched");
                    payloads.push(payload);
                }
                Err(e) => {
                    error!(
                        operation = "fetch",
                        source = %name,
                        status = "error",
                        error = %e,
                        "Failed to fetch from {}",
                        name
                    );
                    report.failed_sources.push(name);
                }
            }
        }

        // catalog shape first, so plays and requests can find new items
        payloads.sort_by_key(apply_order);

        let mut catalog = service.catalog()?;
        let now = Utc::now();
        for payload in payloads {
            match payload {
                SourcePayload::Movies(movies) => {
                    report.movies = apply_movies(&mut catalog, movies, now);
                }
                SourcePayload::Series(series) => {
                    report.series = apply_series(&mut catalog, series, now);
                }
                SourcePayload::Plays(plays) => {
                    report.plays_applied += apply_plays(&mut catalog, plays);
                }
                SourcePayload::Requests(requests) => {
                    report.requests_applied += apply_requests(&mut catalog, &requests);
                }
            }
        }
        report.episodes = catalog.episodes.len();
        service.save_catalog(&catalog)?;

        info!(
            operation = "sync_complete",
            movies = catalog.movies.len(),
            series = catalog.series.len(),
            episodes = report.episodes,
            plays = report.plays_applied,
            requests = report.requests_applied,
            failed = report.failed_sources.len(),
            "Catalog sync finished"
        );

        if self.regenerate_after_sync {
            match service.generate_suggestions() {
                Ok(generated) => report.regenerated = Some(generated),
                Err(e) => warn!(error = %e, "Suggestion generation after sync failed"),
            }
        }

        report.duration = start.elapsed();
        Ok(report)
    }
}

fn apply_order(payload: &SourcePayload) -> u8 {
    match payload {
        SourcePayload::Movies(_) => 0,
        SourcePayload::Series(_) => 1,
        SourcePayload::Plays(_) => 2,
        SourcePayload::Requests(_) => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use media_prune_models::MediaKind;
    use media_prune_sources::{MediaRequest, PlayRecord, PlayTarget, RemoteMovie, SourceError};

    struct FixedSource {
        name: &'static str,
        payload: Option<SourcePayload>,
    }

    #[async_trait]
    impl CatalogSource for FixedSource {
        fn source_name(&self) -> &str {
            self.name
        }

        async fn fetch(&self) -> Result<SourcePayload, SourceError> {
            self.payload
                .clone()
                .ok_or(SourceError::NotConfigured("fixed"))
        }

        async fn test_connection(&self) -> Result<String, SourceError> {
            Ok(self.name.to_string())
        }
    }

    fn source(name: &'static str, payload: SourcePayload) -> Box<dyn CatalogSource> {
        Box::new(FixedSource {
            name,
            payload: Some(payload),
        })
    }

    fn broken(name: &'static str) -> Box<dyn CatalogSource> {
        Box::new(FixedSource { name, payload: None })
    }

    fn remote_movie(radarr_id: u64, title: &str) -> RemoteMovie {
        RemoteMovie {
            radarr_id,
            tmdb_id: None,
            title: title.to_string(),
            year: Some(1995),
            quality: "Bluray-1080p".to_string(),
            size_on_disk: 4_000,
            added: None,
            path: String::new(),
            monitored: true,
            poster_url: None,
        }
    }

    #[tokio::test]
    async fn test_sync_applies_all_payload_kinds() {
        let watched_at = Utc::now() - ChronoDuration::days(2);
        // listed out of order on purpose
        let sync = CatalogSync::new(vec![
            source(
                "overseerr",
                SourcePayload::Requests(vec![MediaRequest {
                    request_id: 9,
                    kind: MediaKind::Movie,
                    service_id: Some(1),
                    tmdb_id: None,
                    title: None,
                    requested_by: Some("alice".to_string()),
                    created_at: Some(watched_at),
                }]),
            ),
            source(
                "tautulli",
                SourcePayload::Plays(vec![PlayRecord {
                    user: "bob".to_string(),
                    watched_at,
                    target: PlayTarget::Movie {
                        title: "Heat".to_string(),
                    },
                }]),
            ),
            source("radarr", SourcePayload::Movies(vec![remote_movie(1, "Heat")])),
        ])
        .with_regenerate(false);
        let mut service = SuggestionService::new(MemoryStore::new());

        let report = sync.run(&mut service).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(report.movies.added, 1);
        assert_eq!(report.plays_applied, 1);
        assert_eq!(report.requests_applied, 1);
        assert!(report.regenerated.is_none());

        let catalog = service.catalog().unwrap();
        let heat = &catalog.movies[0];
        assert_eq!(heat.watched_by.as_deref(), Some("bob"));
        assert_eq!(heat.requested_by.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_failed_source_keeps_existing_data() {
        let mut service = SuggestionService::new(MemoryStore::new());
        CatalogSync::new(vec![source("radarr", SourcePayload::Movies(vec![remote_movie(1, "Heat")]))])
            .with_regenerate(false)
            .run(&mut service)
            .await
            .unwrap();

        let report = CatalogSync::new(vec![broken("radarr")])
            .with_regenerate(false)
            .run(&mut service)
            .await
            .unwrap();

        assert_eq!(report.failed_sources, vec!["radarr".to_string()]);
        assert_eq!(report.movies, MergeCounts::default());
        assert_eq!(service.catalog().unwrap().movies.len(), 1);
    }

    #[tokio::test]
    async fn test_sync_regenerates_suggestions() {
        let mut service = SuggestionService::new(MemoryStore::new());
        let sync = CatalogSync::new(vec![source("radarr", SourcePayload::Movies(vec![remote_movie(1, "Heat")]))]);

        let report = sync.run(&mut service).await.unwrap();

        let generated = report.regenerated.unwrap();
        assert_eq!(generated.rules_evaluated, 3);
    }
}
