use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::arr::{non_zero, parse_timestamp, poster_url, status_summary, ArrImage, ArrQuality, UNKNOWN_QUALITY};
use crate::error::SourceError;
use crate::http::ServiceClient;
use crate::payload::{RemoteEpisode, RemoteSeries, SourcePayload};
use crate::traits::CatalogSource;

const SERVICE: &str = "Sonarr";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrSeries {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    added: Option<String>,
    #[serde(default)]
    monitored: bool,
    #[serde(default)]
    tmdb_id: Option<u64>,
    #[serde(default)]
    statistics: Option<SonarrStatistics>,
    #[serde(default)]
    images: Vec<ArrImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrStatistics {
    #[serde(default)]
    size_on_disk: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SonarrEpisode {
    id: u64,
    #[serde(default)]
    episode_file_id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    season_number: u32,
    #[serde(default)]
    episode_number: u32,
    #[serde(default)]
    air_date_utc: Option<String>,
    #[serde(default)]
    has_file: bool,
}

#[derive(Debug, Deserialize)]
struct SonarrEpisodeFile {
    id: u64,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    path: String,
    #[serde(default)]
    quality: Option<ArrQuality>,
}

fn parse_list<T: for<'de> Deserialize<'de>>(body: Value) -> Result<Vec<T>, SourceError> {
    serde_json::from_value(body).map_err(|e| SourceError::parse(SERVICE, e.to_string()))
}

/// Join the `episode` and `episodefile` listings of one series.
/// Only episodes with a file on disk are kept.
pub fn parse_episodes(series_title: &str, episodes: Value, files: Value) -> Result<Vec<RemoteEpisode>, SourceError> {
    let episodes: Vec<SonarrEpisode> = parse_list(episodes)?;
    let files: HashMap<u64, SonarrEpisodeFile> = parse_list::<SonarrEpisodeFile>(files)?
        .into_iter()
        .map(|f| (f.id, f))
        .collect();

    let mut parsed = Vec::new();
    for episode in episodes.into_iter().filter(|e| e.has_file) {
        let (size_on_disk, file_path, quality) = match files.get(&episode.episode_file_id) {
            Some(file) => (file.size, file.path.clone(), ArrQuality::name(file.quality.as_ref())),
            None => {
                warn!(
                    "Episode {} S{:02}E{:02} of {} has episodeFileId {} but no file data was found",
                    episode.title,
                    episode.season_number,
                    episode.episode_number,
                    series_title,
                    episode.episode_file_id
                );
                (0, String::new(), UNKNOWN_QUALITY.to_string())
            }
        };
        parsed.push(RemoteEpisode {
            sonarr_episode_id: episode.id,
            episode_file_id: episode.episode_file_id,
            season_number: episode.season_number,
            episode_number: episode.episode_number,
            title: episode.title,
            air_date: parse_timestamp(episode.air_date_utc.as_deref()),
            size_on_disk,
            file_path,
            quality,
        });
    }
    Ok(parsed)
}

/// Parse the body of `GET /api/v3/series`. Episodes are filled in separately.
pub fn parse_series(body: Value) -> Result<Vec<RemoteSeries>, SourceError> {
    let series: Vec<SonarrSeries> = parse_list(body)?;
    Ok(series
        .into_iter()
        .map(|s| RemoteSeries {
            sonarr_id: s.id,
            tmdb_id: non_zero(s.tmdb_id),
            poster_url: poster_url(&s.images),
            title: s.title,
            year: non_zero(s.year),
            added: parse_timestamp(s.added.as_deref()),
            total_size: s.statistics.map(|st| st.size_on_disk).unwrap_or(0),
            monitored: s.monitored,
            episodes: Vec::new(),
        })
        .collect())
}

pub struct SonarrClient {
    http: ServiceClient,
}

impl SonarrClient {
    pub fn new(url: &str, api_key: &str) -> Result<Self, SourceError> {
        Ok(Self {
            http: ServiceClient::with_api_key_header(SERVICE, url, api_key)?,
        })
    }

    pub async fn series(&self) -> Result<Vec<RemoteSeries>, SourceError> {
        let mut series = parse_series(self.http.get_json("api/v3/series", &[]).await?)?;

        for show in &mut series {
            let id = show.sonarr_id.to_string();
            let query = [("seriesId", id.as_str())];
            let (episodes, files) = futures::try_join!(
                self.http.get_json("api/v3/episode", &query),
                self.http.get_json("api/v3/episodefile", &query),
            )?;
            show.episodes = parse_episodes(&show.title, episodes, files)?;
            debug!(series = %show.title, episodes = show.episodes.len(), "Fetched episodes");
        }

        info!(
            "Fetched {} series with {} episodes from Sonarr",
            series.len(),
            series.iter().map(|s| s.episodes.len()).sum::<usize>()
        );
        Ok(series)
    }

    pub async fn delete_series(&self, sonarr_id: u64) -> Result<(), SourceError> {
        let path = format!("api/v3/series/{sonarr_id}");
        let status = self.http.delete(&path, &[("deleteFiles", "true")]).await?;
        if !status.is_success() {
            return Err(self.http.status_error(&path, status));
        }
        debug!(sonarr_id, "Deleted series from Sonarr");
        Ok(())
    }

    /// Delete a single episode file, leaving the series in place
    pub async fn delete_episode_file(&self, episode_file_id: u64) -> Result<(), SourceError> {
        let path = format!("api/v3/episodefile/{episode_file_id}");
        let status = self.http.delete(&path, &[]).await?;
        if !status.is_success() {
            return Err(self.http.status_error(&path, status));
        }
        debug!(episode_file_id, "Deleted episode file from Sonarr");
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for SonarrClient {
    fn source_name(&self) -> &str {
        "sonarr"
    }

    async fn fetch(&self) -> Result<SourcePayload, SourceError> {
        Ok(SourcePayload::Series(self.series().await?))
    }

    async fn test_connection(&self) -> Result<String, SourceError> {
        let body = self.http.get_json("api/v3/system/status", &[]).await?;
        Ok(status_summary(&body, SERVICE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_series() {
        let body = json!([{
            "id": 5,
            "title": "The Wire",
            "year": 2002,
            "added": "2022-01-01T00:00:00Z",
            "monitored": true,
            "tmdbId": 1438,
            "statistics": { "sizeOnDisk": 40_000_000_000u64, "episodeFileCount": 60 },
            "images": [{ "coverType": "poster", "remoteUrl": "http://img/wire.jpg" }]
        }]);

        let series = parse_series(body).unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].sonarr_id, 5);
        assert_eq!(series[0].total_size, 40_000_000_000);
        assert_eq!(series[0].tmdb_id, Some(1438));
        assert_eq!(series[0].poster_url.as_deref(), Some("http://img/wire.jpg"));
        assert!(series[0].episodes.is_empty());
    }

    #[test]
    fn test_parse_episodes_joins_files_and_skips_missing() {
        let episodes = json!([
            { "id": 100, "episodeFileId": 900, "title": "The Target", "seasonNumber": 1,
              "episodeNumber": 1, "airDateUtc": "2002-06-02T01:00:00Z", "hasFile": true },
            { "id": 101, "episodeFileId": 0, "title": "The Detail", "seasonNumber": 1,
              "episodeNumber": 2, "hasFile": false },
            { "id": 102, "episodeFileId": 902, "title": "The Buys", "seasonNumber": 1,
              "episodeNumber": 3, "hasFile": true }
        ]);
        let files = json!([
            { "id": 900, "size": 1_500_000_000u64, "path": "/tv/wire/s01e01.mkv",
              "quality": { "quality": { "name": "WEBDL-1080p" } } }
        ]);

        let parsed = parse_episodes("The Wire", episodes, files).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].sonarr_episode_id, 100);
        assert_eq!(parsed[0].size_on_disk, 1_500_000_000);
        assert_eq!(parsed[0].quality, "WEBDL-1080p");
        assert!(parsed[0].air_date.is_some());

        // file listing did not include 902
        assert_eq!(parsed[1].sonarr_episode_id, 102);
        assert_eq!(parsed[1].size_on_disk, 0);
        assert_eq!(parsed[1].file_path, "");
        assert_eq!(parsed[1].quality, "Unknown");
    }
}
