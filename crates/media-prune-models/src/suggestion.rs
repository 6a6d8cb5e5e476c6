use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::media::MediaKind;

/// A recommendation to delete one movie or series, produced by one rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub id: u64,
    pub media_type: MediaKind,
    pub media_id: u64,
    pub title: String,
    pub year: Option<u32>,
    pub size: u64,
    #[serde(default)]
    pub poster_url: Option<String>,
    pub rule_name: String,
    pub reason: String,
    #[serde(default)]
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
}

/// Identity of a suggestion across generation runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuggestionKey {
    pub media_type: MediaKind,
    pub media_id: u64,
    pub rule_name: String,
}

impl Suggestion {
    pub fn key(&self) -> SuggestionKey {
        SuggestionKey {
            media_type: self.media_type,
            media_id: self.media_id,
            rule_name: self.rule_name.clone(),
        }
    }
}
