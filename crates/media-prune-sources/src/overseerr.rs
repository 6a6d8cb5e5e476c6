use async_trait::async_trait;
use media_prune_models::MediaKind;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::arr::parse_timestamp;
use crate::error::SourceError;
use crate::http::ServiceClient;
use crate::payload::{MediaRequest, SourcePayload};
use crate::traits::CatalogSource;

const SERVICE: &str = "Overseerr";

#[derive(Debug, Deserialize)]
struct RequestPage {
    #[serde(default)]
    results: Vec<OverseerrRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverseerrRequest {
    id: u64,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    requested_by: Option<OverseerrUser>,
    #[serde(default)]
    media: Option<OverseerrMedia>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverseerrUser {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverseerrMedia {
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    tmdb_id: Option<u64>,
    #[serde(default)]
    external_service_id: Option<u64>,
    #[serde(default)]
    service_id: Option<u64>,
    #[serde(default, rename = "serviceId4k")]
    service_id_4k: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

fn media_kind(media_type: Option<&str>) -> Option<MediaKind> {
    match media_type? {
        "movie" => Some(MediaKind::Movie),
        "tv" => Some(MediaKind::Series),
        _ => None,
    }
}

fn wire_media_type(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "movie",
        MediaKind::Series => "tv",
    }
}

fn parse_page(body: Value) -> Result<Vec<OverseerrRequest>, SourceError> {
    let page: RequestPage = serde_json::from_value(body).map_err(|e| SourceError::parse(SERVICE, e.to_string()))?;
    Ok(page.results)
}

/// Parse a page of `GET /api/v1/request`. Requests for anything but movies and tv are dropped.
pub fn parse_requests(body: Value) -> Result<Vec<MediaRequest>, SourceError> {
    let mut requests = Vec::new();
    for request in parse_page(body)? {
        let Some(media) = request.media else {
            continue;
        };
        let Some(kind) = media_kind(media.media_type.as_deref()) else {
            continue;
        };
        requests.push(MediaRequest {
            request_id: request.id,
            kind,
            service_id: media.external_service_id.or(media.service_id).or(media.service_id_4k),
            tmdb_id: media.tmdb_id,
            title: media.title.or(media.name),
            requested_by: request.requested_by.and_then(|u| u.display_name),
            created_at: parse_timestamp(request.created_at.as_deref()),
        });
    }
    Ok(requests)
}

/// Request ids whose media matches the TMDB id and kind
fn matching_request_ids(body: Value, tmdb_id: u64, kind: MediaKind) -> Result<Vec<u64>, SourceError> {
    let wanted = wire_media_type(kind);
    Ok(parse_page(body)?
        .into_iter()
        .filter(|r| {
            r.media
                .as_ref()
                .is_some_and(|m| m.tmdb_id == Some(tmdb_id) && m.media_type.as_deref() == Some(wanted))
        })
        .map(|r| r.id)
        .collect())
}

pub struct OverseerrClient {
    http: ServiceClient,
}

impl OverseerrClient {
    pub fn new(url: &str, api_key: &str) -> Result<Self, SourceError> {
        Ok(Self {
            http: ServiceClient::with_api_key_header(SERVICE, url, api_key)?,
        })
    }

    pub async fn requests(&self) -> Result<Vec<MediaRequest>, SourceError> {
        let body = self
            .http
            .get_json("api/v1/request", &[("take", "100"), ("sort", "added")])
            .await?;
        let requests = parse_requests(body)?;
        info!("Fetched {} requests from Overseerr", requests.len());
        Ok(requests)
    }

    /// Remove the request for a deleted item so it can be requested again.
    /// Returns false when no request matched. A request that is already gone counts as deleted.
    pub async fn delete_request_by_tmdb(&self, tmdb_id: u64, kind: MediaKind) -> Result<bool, SourceError> {
        let body = self
            .http
            .get_json("api/v1/request", &[("filter", "all"), ("take", "100"), ("skip", "0")])
            .await?;
        let Some(request_id) = matching_request_ids(body, tmdb_id, kind)?.into_iter().next() else {
            debug!(tmdb_id, %kind, "No Overseerr request matched");
            return Ok(false);
        };

        let path = format!("api/v1/request/{request_id}");
        let status = self.http.delete(&path, &[]).await?;
        if status.is_success() || status == StatusCode::NOT_FOUND {
            info!(request_id, tmdb_id, "Deleted Overseerr request");
            Ok(true)
        } else {
            warn!(request_id, %status, "Failed to delete Overseerr request");
            Err(self.http.status_error(&path, status))
        }
    }
}

#[async_trait]
impl CatalogSource for OverseerrClient {
    fn source_name(&self) -> &str {
        "overseerr"
    }

    async fn fetch(&self) -> Result<SourcePayload, SourceError> {
        Ok(SourcePayload::Requests(self.requests().await?))
    }

    async fn test_connection(&self) -> Result<String, SourceError> {
        let body = self.http.get_json("api/v1/settings/main", &[]).await?;
        Ok(body
            .get("applicationTitle")
            .and_then(Value::as_str)
            .filter(|title| !title.is_empty())
            .unwrap_or(SERVICE)
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> Value {
        json!({
            "pageInfo": { "pages": 1, "results": 4 },
            "results": [
                { "id": 1, "createdAt": "2024-09-01T12:00:00.000Z",
                  "requestedBy": { "displayName": "alice" },
                  "media": { "mediaType": "movie", "tmdbId": 949, "externalServiceId": 12, "serviceId": 0 } },
                { "id": 2, "createdAt": "2024-09-02T12:00:00.000Z",
                  "requestedBy": { "displayName": "bob" },
                  "media": { "mediaType": "tv", "tmdbId": 1438, "serviceId": 5, "name": "The Wire" } },
                { "id": 3, "media": { "mediaType": "tv", "tmdbId": 1399, "serviceId4k": 9 } },
                { "id": 4, "media": { "mediaType": "music", "tmdbId": 1 } }
            ]
        })
    }

    #[test]
    fn test_parse_requests() {
        let requests = parse_requests(page()).unwrap();

        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].kind, MediaKind::Movie);
        assert_eq!(requests[0].service_id, Some(12));
        assert_eq!(requests[0].requested_by.as_deref(), Some("alice"));
        assert!(requests[0].created_at.is_some());

        assert_eq!(requests[1].kind, MediaKind::Series);
        assert_eq!(requests[1].service_id, Some(5));
        assert_eq!(requests[1].title.as_deref(), Some("The Wire"));

        assert_eq!(requests[2].service_id, Some(9));
        assert_eq!(requests[2].requested_by, None);
    }

    #[test]
    fn test_matching_request_ids_checks_kind() {
        assert_eq!(matching_request_ids(page(), 949, MediaKind::Movie).unwrap(), vec![1]);
        assert!(matching_request_ids(page(), 949, MediaKind::Series).unwrap().is_empty());
        assert_eq!(matching_request_ids(page(), 1438, MediaKind::Series).unwrap(), vec![2]);
    }
}
