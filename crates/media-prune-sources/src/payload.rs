use chrono::{DateTime, Utc};
use media_prune_models::MediaKind;

/// A movie as Radarr reports it
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteMovie {
    pub radarr_id: u64,
    pub tmdb_id: Option<u64>,
    pub title: String,
    pub year: Option<u32>,
    pub quality: String,
    pub size_on_disk: u64,
    pub added: Option<DateTime<Utc>>,
    pub path: String,
    pub monitored: bool,
    pub poster_url: Option<String>,
}

/// A series as Sonarr reports it, with the episodes that have a file on disk
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSeries {
    pub sonarr_id: u64,
    pub tmdb_id: Option<u64>,
    pub title: String,
    pub year: Option<u32>,
    pub added: Option<DateTime<Utc>>,
    pub total_size: u64,
    pub monitored: bool,
    pub poster_url: Option<String>,
    pub episodes: Vec<RemoteEpisode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEpisode {
    pub sonarr_episode_id: u64,
    pub episode_file_id: u64,
    pub season_number: u32,
    pub episode_number: u32,
    pub title: String,
    pub air_date: Option<DateTime<Utc>>,
    pub size_on_disk: u64,
    pub file_path: String,
    pub quality: String,
}

/// What a play in the history refers to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlayTarget {
    Movie { title: String },
    Episode { series_title: String, season: u32, episode: u32 },
}

/// One finished play from the watch history
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRecord {
    pub user: String,
    pub watched_at: DateTime<Utc>,
    pub target: PlayTarget,
}

/// A request made through the request manager
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRequest {
    pub request_id: u64,
    pub kind: MediaKind,
    /// Radarr or Sonarr id of the requested item
    pub service_id: Option<u64>,
    pub tmdb_id: Option<u64>,
    pub title: Option<String>,
    pub requested_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourcePayload {
    Movies(Vec<RemoteMovie>),
    Series(Vec<RemoteSeries>),
    Plays(Vec<PlayRecord>),
    Requests(Vec<MediaRequest>),
}

impl SourcePayload {
    pub fn len(&self) -> usize {
        match self {
            SourcePayload::Movies(items) => items.len(),
            SourcePayload::Series(items) => items.len(),
            SourcePayload::Plays(items) => items.len(),
            SourcePayload::Requests(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SourcePayload::Movies(_) => "movies",
            SourcePayload::Series(_) => "series",
            SourcePayload::Plays(_) => "plays",
            SourcePayload::Requests(_) => "requests",
        }
    }
}
