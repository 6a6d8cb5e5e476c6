use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::watch_history::WatchHistory;

/// Which half of the catalog an item belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaKind {
    Movie,
    Series,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "Movie"),
            MediaKind::Series => write!(f, "Series"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: u64,
    pub radarr_id: u64,
    pub tmdb_id: Option<u64>,
    pub title: String,
    pub year: Option<u32>,
    pub quality: String,
    pub size_on_disk: u64,
    pub added: DateTime<Utc>,
    pub requested_date: Option<DateTime<Utc>>,
    pub requested_by: Option<String>,
    pub last_watched: Option<DateTime<Utc>>,
    pub watched_by: Option<String>,
    pub watch_history: WatchHistory,
    pub folder_path: String,
    pub monitored: bool,
    pub poster_url: Option<String>,
}

impl Movie {
    /// Replace the watch history and refresh the derived last-watched fields
    pub fn set_watch_history(&mut self, history: WatchHistory) {
        let latest = history.latest();
        self.last_watched = latest.map(|e| e.watched_at);
        self.watched_by = latest.map(|e| e.user.clone());
        self.watch_history = history;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Series {
    pub id: u64,
    pub sonarr_id: u64,
    pub tmdb_id: Option<u64>,
    pub title: String,
    pub year: Option<u32>,
    pub added: DateTime<Utc>,
    pub requested_date: Option<DateTime<Utc>>,
    pub requested_by: Option<String>,
    pub total_size: u64,
    pub monitored: bool,
    pub poster_url: Option<String>,
}

/// An episode file on disk. Owned by its series: removing the series removes its episodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub id: u64,
    pub series_id: u64,
    pub sonarr_episode_id: u64,
    pub episode_file_id: u64,
    pub season_number: u32,
    pub episode_number: u32,
    pub title: String,
    pub quality: String,
    pub size_on_disk: u64,
    pub air_date: Option<DateTime<Utc>>,
    pub last_watched: Option<DateTime<Utc>>,
    pub watched_by: Option<String>,
    pub watch_history: WatchHistory,
    pub file_path: String,
}

impl Episode {
    pub fn set_watch_history(&mut self, history: WatchHistory) {
        let latest = history.latest();
        self.last_watched = latest.map(|e| e.watched_at);
        self.watched_by = latest.map(|e| e.user.clone());
        self.watch_history = history;
    }

    /// `S01E02` style label used in log lines
    pub fn label(&self) -> String {
        format!("S{:02}E{:02}", self.season_number, self.episode_number)
    }
}
