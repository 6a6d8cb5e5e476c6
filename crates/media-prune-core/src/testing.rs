// Fixture builders shared by the unit tests of this crate.

use chrono::{Duration, Utc};
use media_prune_models::{Episode, Movie, Series, WatchHistory};

pub fn movie(id: u64, title: &str) -> Movie {
    Movie {
        id,
        radarr_id: id + 100,
        tmdb_id: Some(id + 1000),
        title: title.to_string(),
        year: Some(2020),
        quality: "Bluray-1080p".to_string(),
        size_on_disk: 1_000_000,
        added: Utc::now() - Duration::days(365),
        requested_date: None,
        requested_by: None,
        last_watched: None,
        watched_by: None,
        watch_history: WatchHistory::new(),
        folder_path: format!("/movies/{title}"),
        monitored: true,
        poster_url: None,
    }
}

pub fn series(id: u64, title: &str) -> Series {
    Series {
        id,
        sonarr_id: id + 200,
        tmdb_id: Some(id + 2000),
        title: title.to_string(),
        year: Some(2002),
        added: Utc::now() - Duration::days(365),
        requested_date: None,
        requested_by: None,
        total_size: 5_000_000,
        monitored: true,
        poster_url: None,
    }
}

pub fn episode(id: u64, series_id: u64, season: u32, number: u32) -> Episode {
    Episode {
        id,
        series_id,
        sonarr_episode_id: id + 300,
        episode_file_id: id + 400,
        season_number: season,
        episode_number: number,
        title: format!("Episode {number}"),
        quality: "HDTV-720p".to_string(),
        size_on_disk: 500_000,
        air_date: None,
        last_watched: None,
        watched_by: None,
        watch_history: WatchHistory::new(),
        file_path: format!("/tv/{series_id}/S{season:02}E{number:02}.mkv"),
    }
}
