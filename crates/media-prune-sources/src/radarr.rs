use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::arr::{non_zero, parse_timestamp, poster_url, status_summary, ArrImage, ArrQuality};
use crate::error::SourceError;
use crate::http::ServiceClient;
use crate::payload::{RemoteMovie, SourcePayload};
use crate::traits::CatalogSource;

const SERVICE: &str = "Radarr";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RadarrMovie {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    year: Option<u32>,
    #[serde(default)]
    size_on_disk: u64,
    #[serde(default)]
    added: Option<String>,
    #[serde(default)]
    path: String,
    #[serde(default)]
    monitored: bool,
    #[serde(default)]
    tmdb_id: Option<u64>,
    #[serde(default)]
    movie_file: Option<RadarrMovieFile>,
    #[serde(default)]
    images: Vec<ArrImage>,
}

#[derive(Debug, Deserialize)]
struct RadarrMovieFile {
    #[serde(default)]
    quality: Option<ArrQuality>,
}

impl From<RadarrMovie> for RemoteMovie {
    fn from(movie: RadarrMovie) -> Self {
        let quality = ArrQuality::name(movie.movie_file.as_ref().and_then(|f| f.quality.as_ref()));
        RemoteMovie {
            radarr_id: movie.id,
            tmdb_id: non_zero(movie.tmdb_id),
            poster_url: poster_url(&movie.images),
            title: movie.title,
            year: non_zero(movie.year),
            quality,
            size_on_disk: movie.size_on_disk,
            added: parse_timestamp(movie.added.as_deref()),
            path: movie.path,
            monitored: movie.monitored,
        }
    }
}

/// Parse the body of `GET /api/v3/movie`
pub fn parse_movies(body: Value) -> Result<Vec<RemoteMovie>, SourceError> {
    let movies: Vec<RadarrMovie> =
        serde_json::from_value(body).map_err(|e| SourceError::parse(SERVICE, e.to_string()))?;
    Ok(movies.into_iter().map(RemoteMovie::from).collect())
}

pub struct RadarrClient {
    http: ServiceClient,
}

impl RadarrClient {
    pub fn new(url: &str, api_key: &str) -> Result<Self, SourceError> {
        Ok(Self {
            http: ServiceClient::with_api_key_header(SERVICE, url, api_key)?,
        })
    }

    pub async fn movies(&self) -> Result<Vec<RemoteMovie>, SourceError> {
        let body = self.http.get_json("api/v3/movie", &[]).await?;
        let movies = parse_movies(body)?;
        info!("Fetched {} movies from Radarr", movies.len());
        Ok(movies)
    }

    /// Delete a movie and its files. Returns the TMDB id so the matching request can be cleaned up.
    pub async fn delete_movie(&self, radarr_id: u64) -> Result<Option<u64>, SourceError> {
        let path = format!("api/v3/movie/{radarr_id}");
        let movie: RadarrMovie = serde_json::from_value(self.http.get_json(&path, &[]).await?)
            .map_err(|e| SourceError::parse(SERVICE, e.to_string()))?;
        let tmdb_id = non_zero(movie.tmdb_id);

        let status = self.http.delete(&path, &[("deleteFiles", "true")]).await?;
        if !status.is_success() {
            return Err(self.http.status_error(&path, status));
        }
        debug!(radarr_id, ?tmdb_id, "Deleted movie from Radarr");
        Ok(tmdb_id)
    }
}

#[async_trait]
impl CatalogSource for RadarrClient {
    fn source_name(&self) -> &str {
        "radarr"
    }

    async fn fetch(&self) -> Result<SourcePayload, SourceError> {
        Ok(SourcePayload::Movies(self.movies().await?))
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
    fn test_parse_movies() {
        let body = json!([
            {
                "id": 12,
                "title": "Heat",
                "year": 1995,
                "sizeOnDisk": 8_000_000_000u64,
                "added": "2023-04-01T10:00:00Z",
                "path": "/movies/Heat (1995)",
                "monitored": true,
                "tmdbId": 949,
                "movieFile": { "quality": { "quality": { "id": 7, "name": "Bluray-1080p" } } },
                "images": [
                    { "coverType": "poster", "remoteUrl": "http://image.tmdb.org/heat.jpg" }
                ]
            },
            {
                "id": 13,
                "title": "Wanted",
                "year": 0,
                "monitored": false,
                "tmdbId": 0,
                "images": []
            }
        ]);

        let movies = parse_movies(body).unwrap();

        assert_eq!(movies.len(), 2);
        let heat = &movies[0];
        assert_eq!(heat.radarr_id, 12);
        assert_eq!(heat.tmdb_id, Some(949));
        assert_eq!(heat.year, Some(1995));
        assert_eq!(heat.quality, "Bluray-1080p");
        assert_eq!(heat.size_on_disk, 8_000_000_000);
        assert_eq!(heat.poster_url.as_deref(), Some("http://image.tmdb.org/heat.jpg"));
        assert!(heat.added.is_some());

        let wanted = &movies[1];
        assert_eq!(wanted.quality, "Unknown");
        assert_eq!(wanted.year, None);
        assert_eq!(wanted.tmdb_id, None);
        assert_eq!(wanted.size_on_disk, 0);
        assert!(wanted.added.is_none());
    }

    #[test]
    fn test_parse_movies_rejects_non_array() {
        let err = parse_movies(json!({ "message": "Unauthorized" })).unwrap_err();
        assert!(matches!(err, SourceError::Parse { service: "Radarr", .. }));
    }
}
