// Field resolution: maps a symbolic field name onto a movie or series.
// Fields that do not apply to the media type resolve to Absent.

use media_prune_models::{Episode, FieldName, Movie, Series};
use std::collections::HashSet;

use crate::value::FieldValue;

pub fn resolve_movie_field(movie: &Movie, field: &FieldName) -> FieldValue {
    match field {
        FieldName::LastWatched => FieldValue::from_date(movie.last_watched),
        FieldName::Added => FieldValue::Date(movie.added),
        FieldName::RequestedDate => FieldValue::from_date(movie.requested_date),
        FieldName::RequestedBy => FieldValue::from_text(movie.requested_by.as_deref()),
        FieldName::WatchedBy => FieldValue::from_text(movie.watched_by.as_deref()),
        FieldName::SizeOnDisk => FieldValue::from_size(movie.size_on_disk),
        FieldName::Year => FieldValue::from_year(movie.year),
        FieldName::Monitored => FieldValue::Boolean(movie.monitored),
        FieldName::WatchCount => FieldValue::from_count(movie.watch_history.watch_count()),
        FieldName::Title => FieldValue::Text(movie.title.clone()),
        FieldName::Quality => FieldValue::Text(movie.quality.clone()),
        FieldName::TotalSize | FieldName::EpisodeCount | FieldName::Unknown(_) => FieldValue::Absent,
    }
}

pub fn resolve_series_field(series: &Series, episodes: &[&Episode], field: &FieldName) -> FieldValue {
    match field {
        FieldName::LastWatched => FieldValue::from_date(series_last_watched(episodes)),
        FieldName::Added => FieldValue::Date(series.added),
        FieldName::RequestedDate => FieldValue::from_date(series.requested_date),
        FieldName::RequestedBy => FieldValue::from_text(series.requested_by.as_deref()),
        FieldName::TotalSize => FieldValue::from_size(series.total_size),
        FieldName::Year => FieldValue::from_year(series.year),
        FieldName::Monitored => FieldValue::Boolean(series.monitored),
        FieldName::WatchCount => FieldValue::from_count(series_watch_count(episodes)),
        FieldName::Title => FieldValue::Text(series.title.clone()),
        FieldName::EpisodeCount => FieldValue::from_count(episodes.len()),
        FieldName::WatchedBy | FieldName::SizeOnDisk | FieldName::Quality | FieldName::Unknown(_) => {
            FieldValue::Absent
        }
    }
}

/// Most recent play across every episode of the series
fn series_last_watched(episodes: &[&Episode]) -> Option<chrono::DateTime<chrono::Utc>> {
    episodes.iter().filter_map(|e| e.last_watched).max()
}

/// Distinct users over the union of all episode histories
fn series_watch_count(episodes: &[&Episode]) -> usize {
    let users: HashSet<&str> = episodes
        .iter()
        .flat_map(|e| e.watch_history.distinct_users())
        .collect();
    users.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{episode, movie, series};
    use chrono::{Duration, Utc};
    use media_prune_models::{WatchEvent, WatchHistory};

    #[test]
    fn test_movie_scalar_fields() {
        let mut m = movie(7, "Heat");
        m.size_on_disk = 500;
        m.year = Some(1995);
        m.monitored = false;
        m.quality = "Bluray-1080p".to_string();

        assert_eq!(resolve_movie_field(&m, &FieldName::SizeOnDisk), FieldValue::Integer(500));
        assert_eq!(resolve_movie_field(&m, &FieldName::Year), FieldValue::Integer(1995));
        assert_eq!(resolve_movie_field(&m, &FieldName::Monitored), FieldValue::Boolean(false));
        assert_eq!(resolve_movie_field(&m, &FieldName::Title), FieldValue::Text("Heat".into()));
        assert_eq!(
            resolve_movie_field(&m, &FieldName::Quality),
            FieldValue::Text("Bluray-1080p".into())
        );
        assert_eq!(resolve_movie_field(&m, &FieldName::LastWatched), FieldValue::Absent);
        assert_eq!(resolve_movie_field(&m, &FieldName::RequestedBy), FieldValue::Absent);
    }

    #[test]
    fn test_movie_watch_count() {
        let mut m = movie(1, "Heat");
        assert_eq!(resolve_movie_field(&m, &FieldName::WatchCount), FieldValue::Integer(0));

        let now = Utc::now();
        m.set_watch_history(WatchHistory::from_events(vec![
            WatchEvent::new("alice", now - Duration::days(3)),
            WatchEvent::new("alice", now - Duration::days(1)),
        ]));
        assert_eq!(resolve_movie_field(&m, &FieldName::WatchCount), FieldValue::Integer(1));
    }

    #[test]
    fn test_series_only_fields_are_absent_on_movies() {
        let m = movie(1, "Heat");
        assert_eq!(resolve_movie_field(&m, &FieldName::TotalSize), FieldValue::Absent);
        assert_eq!(resolve_movie_field(&m, &FieldName::EpisodeCount), FieldValue::Absent);
        assert_eq!(
            resolve_movie_field(&m, &FieldName::Unknown("rating".into())),
            FieldValue::Absent
        );
    }

    #[test]
    fn test_series_derived_fields_scan_episodes() {
        let now = Utc::now();
        let s = series(3, "The Wire");
        let mut e1 = episode(1, 3, 1, 1);
        let mut e2 = episode(2, 3, 1, 2);
        let e3 = episode(3, 3, 1, 3);
        e1.set_watch_history(WatchHistory::from_events(vec![
            WatchEvent::new("alice", now - Duration::days(40)),
            WatchEvent::new("bob", now - Duration::days(30)),
        ]));
        e2.set_watch_history(WatchHistory::from_events(vec![WatchEvent::new(
            "alice",
            now - Duration::days(5),
        )]));
        let episodes = vec![&e1, &e2, &e3];

        assert_eq!(
            resolve_series_field(&s, &episodes, &FieldName::LastWatched),
            FieldValue::Date(now - Duration::days(5))
        );
        assert_eq!(
            resolve_series_field(&s, &episodes, &FieldName::WatchCount),
            FieldValue::Integer(2)
        );
        assert_eq!(
            resolve_series_field(&s, &episodes, &FieldName::EpisodeCount),
            FieldValue::Integer(3)
        );
    }

    #[test]
    fn test_series_without_watched_episodes() {
        let s = series(3, "The Wire");
        let e1 = episode(1, 3, 1, 1);
        assert_eq!(resolve_series_field(&s, &[&e1], &FieldName::LastWatched), FieldValue::Absent);
        assert_eq!(resolve_series_field(&s, &[], &FieldName::WatchCount), FieldValue::Integer(0));
        assert_eq!(resolve_series_field(&s, &[], &FieldName::WatchedBy), FieldValue::Absent);
        assert_eq!(resolve_series_field(&s, &[], &FieldName::SizeOnDisk), FieldValue::Absent);
    }
}
