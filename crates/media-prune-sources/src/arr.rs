// Shapes shared by the Radarr and Sonarr v3 APIs.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

pub(crate) const UNKNOWN_QUALITY: &str = "Unknown";

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArrImage {
    #[serde(default)]
    pub cover_type: String,
    #[serde(default)]
    pub remote_url: Option<String>,
}

/// `quality.quality.name` on a movie or episode file
#[derive(Debug, Deserialize, Default)]
pub(crate) struct ArrQuality {
    #[serde(default)]
    pub quality: Option<ArrQualityName>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct ArrQualityName {
    #[serde(default)]
    pub name: Option<String>,
}

impl ArrQuality {
    pub fn name(quality: Option<&ArrQuality>) -> String {
        quality
            .and_then(|q| q.quality.as_ref())
            .and_then(|q| q.name.clone())
            .unwrap_or_else(|| UNKNOWN_QUALITY.to_string())
    }
}

pub(crate) fn poster_url(images: &[ArrImage]) -> Option<String> {
    images
        .iter()
        .find(|image| image.cover_type == "poster")
        .and_then(|image| image.remote_url.clone())
}

/// Timestamps come back as ISO strings; anything unparsable is treated as missing
pub(crate) fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// `appName version` from a `system/status` body
pub(crate) fn status_summary(body: &Value, fallback: &str) -> String {
    let name = body.get("appName").and_then(Value::as_str).unwrap_or(fallback);
    match body.get("version").and_then(Value::as_str) {
        Some(version) => format!("{name} {version}"),
        None => name.to_string(),
    }
}

/// The arr APIs use 0 for "unknown" on years and external ids
pub(crate) fn non_zero<T: PartialEq + Default>(value: Option<T>) -> Option<T> {
    value.filter(|v| *v != T::default())
}
