use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::http::ServiceClient;
use crate::payload::{PlayRecord, PlayTarget, SourcePayload};
use crate::traits::CatalogSource;

const SERVICE: &str = "Tautulli";
const HISTORY_LENGTH: &str = "1000";

/// Tautulli sends indexes either as numbers or as numeric strings
fn as_index(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let seconds = match value? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    DateTime::from_timestamp(seconds, 0)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Parse a `get_history` response.
///
/// Rows without a user or a stop time are dropped, and so are rows that are
/// neither a movie nor a fully numbered episode.
pub fn parse_history(body: &Value) -> Result<Vec<PlayRecord>, SourceError> {
    let rows = body
        .pointer("/response/data/data")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::parse(SERVICE, "missing response.data.data"))?;

    let mut plays = Vec::new();
    for row in rows {
        let (Some(user), Some(watched_at)) = (non_empty_str(row.get("user")), as_timestamp(row.get("stopped"))) else {
            continue;
        };

        let target = match row.get("media_type").and_then(Value::as_str) {
            Some("movie") => non_empty_str(row.get("title")).map(|title| PlayTarget::Movie {
                title: title.to_string(),
            }),
            Some("episode") => match (
                non_empty_str(row.get("grandparent_title")),
                as_index(row.get("parent_media_index")),
                as_index(row.get("media_index")),
            ) {
                (Some(series_title), Some(season), Some(episode)) => Some(PlayTarget::Episode {
                    series_title: series_title.to_string(),
                    season,
                    episode,
                }),
                _ => None,
            },
            _ => None,
        };

        if let Some(target) = target {
            plays.push(PlayRecord {
                user: user.to_string(),
                watched_at,
                target,
            });
        }
    }

    debug!("Parsed {} plays from {} history rows", plays.len(), rows.len());
    Ok(plays)
}

/// Check a `get_server_info` response and name the Plex server behind it
pub fn parse_server_info(body: &Value) -> Result<String, SourceError> {
    let response = body
        .get("response")
        .ok_or_else(|| SourceError::parse(SERVICE, "missing response"))?;
    if response.get("result").and_then(Value::as_str) != Some("success") {
        let message = non_empty_str(response.get("message")).unwrap_or("request was not successful");
        return Err(SourceError::parse(SERVICE, message));
    }
    let name = non_empty_str(response.pointer("/data/pms_name")).unwrap_or("Plex");
    Ok(match non_empty_str(response.pointer("/data/pms_version")) {
        Some(version) => format!("{SERVICE} for {name} {version}"),
        None => format!("{SERVICE} for {name}"),
    })
}

pub struct TautulliClient {
    http: ServiceClient,
    api_key: String,
}

impl TautulliClient {
    pub fn new(url: &str, api_key: &str) -> Result<Self, SourceError> {
        Ok(Self {
            http: ServiceClient::plain(SERVICE, url)?,
            api_key: api_key.to_string(),
        })
    }

    pub async fn history(&self) -> Result<Vec<PlayRecord>, SourceError> {
        let query = [
            ("apikey", self.api_key.as_str()),
            ("cmd", "get_history"),
            ("length", HISTORY_LENGTH),
        ];
        let body = self.http.get_json("api/v2", &query).await?;
        let plays = parse_history(&body)?;
        info!("Fetched {} plays from Tautulli", plays.len());
        Ok(plays)
    }
}

#[async_trait]
impl CatalogSource for TautulliClient {
    fn source_name(&self) -> &str {
        "tautulli"
    }

    async fn fetch(&self) -> Result<SourcePayload, SourceError> {
        Ok(SourcePayload::Plays(self.history().await?))
    }

    async fn test_connection(&self) -> Result<String, SourceError> {
        let query = [("apikey", self.api_key.as_str()), ("cmd", "get_server_info")];
        let body = self.http.get_json("api/v2", &query).await?;
        parse_server_info(&body)
    }
}
