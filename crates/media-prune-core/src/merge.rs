//! Applying fetched source data to the local catalog.
//!
//! Movies and series are upserted by their Radarr/Sonarr id and pruned when a
//! successful fetch no longer reports them. Local ids, watch data and request
//! data survive an upsert.

use chrono::{DateTime, Utc};
use media_prune_models::{Catalog, Episode, MediaKind, Movie, Series, WatchEvent, WatchHistory};
use media_prune_sources::{MediaRequest, PlayRecord, PlayTarget, RemoteEpisode, RemoteMovie, RemoteSeries};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeCounts {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

pub fn apply_movies(catalog: &mut Catalog, remote: Vec<RemoteMovie>, now: DateTime<Utc>) -> MergeCounts {
    let mut counts = MergeCounts::default();
    // the vectors are taken below, so allocation runs off the watermarks alone
    catalog.refresh_watermarks();
    let mut existing: HashMap<u64, Movie> = std::mem::take(&mut catalog.movies)
        .into_iter()
        .map(|m| (m.radarr_id, m))
        .collect();

    let mut movies = Vec::with_capacity(remote.len());
    for item in remote {
        let movie = match existing.remove(&item.radarr_id) {
            Some(mut movie) => {
                counts.updated += 1;
                movie.tmdb_id = item.tmdb_id;
                movie.title = item.title;
                movie.year = item.year;
                movie.quality = item.quality;
                movie.size_on_disk = item.size_on_disk;
                movie.added = item.added.unwrap_or(movie.added);
                movie.folder_path = item.path;
                movie.monitored = item.monitored;
                movie.poster_url = item.poster_url;
                movie
            }
            None => {
                counts.added += 1;
                Movie {
                    id: catalog.allocate_movie_id(),
                    radarr_id: item.radarr_id,
                    tmdb_id: item.tmdb_id,
                    title: item.title,
                    year: item.year,
                    quality: item.quality,
                    size_on_disk: item.size_on_disk,
                    added: item.added.unwrap_or(now),
                    requested_date: None,
                    requested_by: None,
                    last_watched: None,
                    watched_by: None,
                    watch_history: WatchHistory::new(),
                    folder_path: item.path,
                    monitored: item.monitored,
                    poster_url: item.poster_url,
                }
            }
        };
        movies.push(movie);
    }

    counts.removed = existing.len();
    for gone in existing.values() {
        debug!(title = %gone.title, radarr_id = gone.radarr_id, "Movie no longer in Radarr");
    }
    catalog.movies = movies;
    counts
}

pub fn apply_series(catalog: &mut Catalog, remote: Vec<RemoteSeries>, now: DateTime<Utc>) -> MergeCounts {
    let mut counts = MergeCounts::default();
    catalog.refresh_watermarks();
    let mut existing: HashMap<u64, Series> = std::mem::take(&mut catalog.series)
        .into_iter()
        .map(|s| (s.sonarr_id, s))
        .collect();
    let mut old_episodes: HashMap<(u64, u64), Episode> = std::mem::take(&mut catalog.episodes)
        .into_iter()
        .map(|e| ((e.series_id, e.sonarr_episode_id), e))
        .collect();

    let mut kept_series = Vec::with_capacity(remote.len());
    let mut episodes = Vec::new();
    for item in remote {
        let RemoteSeries {
            sonarr_id,
            tmdb_id,
            title,
            year,
            added,
            total_size,
            monitored,
            poster_url,
            episodes: remote_episodes,
        } = item;

        let series = match existing.remove(&sonarr_id) {
            Some(mut series) => {
                counts.updated += 1;
                series.tmdb_id = tmdb_id;
                series.title = title;
                series.year = year;
                series.added = added.unwrap_or(series.added);
                series.total_size = total_size;
                series.monitored = monitored;
                series.poster_url = poster_url;
                series
            }
            None => {
                counts.added += 1;
                Series {
                    id: catalog.allocate_series_id(),
                    sonarr_id,
                    tmdb_id,
                    title,
                    year,
                    added: added.unwrap_or(now),
                    requested_date: None,
                    requested_by: None,
                    total_size,
                    monitored,
                    poster_url,
                }
            }
        };

        for remote_episode in remote_episodes {
            let previous = old_episodes.remove(&(series.id, remote_episode.sonarr_episode_id));
            let id = match &previous {
                Some(episode) => episode.id,
                None => catalog.allocate_episode_id(),
            };
            episodes.push(build_episode(id, series.id, remote_episode, previous));
        }
        kept_series.push(series);
    }

    counts.removed = existing.len();
    for gone in existing.values() {
        debug!(title = %gone.title, sonarr_id = gone.sonarr_id, "Series no longer in Sonarr");
    }
    catalog.series = kept_series;
    catalog.episodes = episodes;
    counts
}

fn build_episode(id: u64, series_id: u64, remote: RemoteEpisode, previous: Option<Episode>) -> Episode {
    let (last_watched, watched_by, watch_history) = match previous {
        Some(episode) => (episode.last_watched, episode.watched_by, episode.watch_history),
        None => (None, None, WatchHistory::new()),
    };
    Episode {
        id,
        series_id,
        sonarr_episode_id: remote.sonarr_episode_id,
        episode_file_id: remote.episode_file_id,
        season_number: remote.season_number,
        episode_number: remote.episode_number,
        title: remote.title,
        quality: remote.quality,
        size_on_disk: remote.size_on_disk,
        air_date: remote.air_date,
        last_watched,
        watched_by,
        watch_history,
        file_path: remote.file_path,
    }
}

/// Merge plays into watch histories. Returns how many plays matched a catalog item.
///
/// Movies match on exact title, episodes on series title plus season and episode number.
pub fn apply_plays(catalog: &mut Catalog, plays: Vec<PlayRecord>) -> usize {
    let mut grouped: HashMap<PlayTarget, Vec<WatchEvent>> = HashMap::new();
    for play in plays {
        grouped
            .entry(play.target)
            .or_default()
            .push(WatchEvent::new(play.user, play.watched_at));
    }

    let series_ids: HashMap<String, u64> = catalog
        .series
        .iter()
        .rev()
        .map(|s| (s.title.clone(), s.id))
        .collect();

    let mut matched = 0;
    for (target, events) in grouped {
        let count = events.len();
        let applied = match &target {
            PlayTarget::Movie { title } => match catalog.movies.iter_mut().find(|m| &m.title == title) {
                Some(movie) => {
                    let merged = movie.watch_history.merge(events);
                    movie.set_watch_history(merged);
                    true
                }
                None => false,
            },
            PlayTarget::Episode {
                series_title,
                season,
                episode,
            } => {
                let series_id = series_ids.get(series_title);
                match catalog.episodes.iter_mut().find(|e| {
                    Some(&e.series_id) == series_id && e.season_number == *season && e.episode_number == *episode
                }) {
                    Some(found) => {
                        let merged = found.watch_history.merge(events);
                        found.set_watch_history(merged);
                        true
                    }
                    None => false,
                }
            }
        };

        if applied {
            matched += count;
        } else {
            debug!(?target, plays = count, "No catalog item for plays");
        }
    }
    matched
}

/// Record who requested what. Items that already carry request info are left alone.
pub fn apply_requests(catalog: &mut Catalog, requests: &[MediaRequest]) -> usize {
    let mut applied = 0;
    for request in requests {
        let Some(service_id) = request.service_id else {
            debug!(request_id = request.request_id, "Request has no service id");
            continue;
        };
        let slot = match request.kind {
            MediaKind::Movie => catalog
                .movies
                .iter_mut()
                .find(|m| m.radarr_id == service_id)
                .map(|m| (&mut m.requested_by, &mut m.requested_date)),
            MediaKind::Series => catalog
                .series
                .iter_mut()
                .find(|s| s.sonarr_id == service_id)
                .map(|s| (&mut s.requested_by, &mut s.requested_date)),
        };
        let Some((requested_by, requested_date)) = slot else {
            debug!(request_id = request.request_id, service_id, kind = %request.kind, "No catalog item for request");
            continue;
        };
        if requested_by.is_none() && request.requested_by.is_some() {
            *requested_by = request.requested_by.clone();
            *requested_date = request.created_at;
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn remote_movie(radarr_id: u64, title: &str) -> RemoteMovie {
        RemoteMovie {
            radarr_id,
            tmdb_id: Some(radarr_id * 10),
            title: title.to_string(),
            year: Some(1995),
            quality: "Bluray-1080p".to_string(),
            size_on_disk: 1_000,
            added: None,
            path: format!("/movies/{title}"),
            monitored: true,
            poster_url: None,
        }
    }

    fn remote_episode(sonarr_episode_id: u64, season: u32, number: u32) -> RemoteEpisode {
        RemoteEpisode {
            sonarr_episode_id,
            episode_file_id: sonarr_episode_id + 1000,
            season_number: season,
            episode_number: number,
            title: format!("Episode {number}"),
            air_date: None,
            size_on_disk: 100,
            file_path: String::new(),
            quality: "HDTV-720p".to_string(),
        }
    }

    fn remote_series(sonarr_id: u64, title: &str, episodes: Vec<RemoteEpisode>) -> RemoteSeries {
        RemoteSeries {
            sonarr_id,
            tmdb_id: None,
            title: title.to_string(),
            year: Some(2002),
            added: None,
            total_size: 5_000,
            monitored: true,
            poster_url: None,
            episodes,
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, day, 20, 0, 0).unwrap()
    }

    fn play(user: &str, watched_at: DateTime<Utc>, target: PlayTarget) -> PlayRecord {
        PlayRecord {
            user: user.to_string(),
            watched_at,
            target,
        }
    }

    #[test]
    fn test_apply_movies_upserts_and_prunes() {
        let now = Utc::now();
        let mut catalog = Catalog::new();
        apply_movies(&mut catalog, vec![remote_movie(1, "Heat"), remote_movie(2, "Ronin")], now);
        catalog.movies[0].requested_by = Some("alice".to_string());
        let heat_id = catalog.movies[0].id;

        let mut renamed = remote_movie(1, "Heat (1995)");
        renamed.size_on_disk = 2_000;
        let counts = apply_movies(&mut catalog, vec![renamed, remote_movie(3, "Collateral")], now);

        assert_eq!(counts, MergeCounts { added: 1, updated: 1, removed: 1 });
        assert_eq!(catalog.movies.len(), 2);
        let heat = &catalog.movies[0];
        assert_eq!(heat.id, heat_id);
        assert_eq!(heat.title, "Heat (1995)");
        assert_eq!(heat.size_on_disk, 2_000);
        assert_eq!(heat.requested_by.as_deref(), Some("alice"));
        assert_eq!(heat.added, now);
    }

    #[test]
    fn test_removed_movie_ids_are_not_reused() {
        let now = Utc::now();
        let mut catalog = Catalog::new();
        apply_movies(&mut catalog, vec![remote_movie(1, "Heat"), remote_movie(2, "Ronin")], now);
        apply_movies(&mut catalog, vec![remote_movie(1, "Heat")], now);
        apply_movies(&mut catalog, vec![remote_movie(1, "Heat"), remote_movie(3, "Collateral")], now);

        let collateral = catalog.movies.iter().find(|m| m.radarr_id == 3).unwrap();
        assert_eq!(collateral.id, 3);
    }

    #[test]
    fn test_apply_series_keeps_episode_watch_data() {
        let now = Utc::now();
        let mut catalog = Catalog::new();
        apply_series(
            &mut catalog,
            vec![remote_series(5, "The Wire", vec![remote_episode(100, 1, 1), remote_episode(101, 1, 2)])],
            now,
        );
        apply_plays(
            &mut catalog,
            vec![play(
                "alice",
                at(18),
                PlayTarget::Episode {
                    series_title: "The Wire".to_string(),
                    season: 1,
                    episode: 1,
                },
            )],
        );

        let counts = apply_series(
            &mut catalog,
            vec![remote_series(5, "The Wire", vec![remote_episode(100, 1, 1), remote_episode(102, 1, 3)])],
            now,
        );

        assert_eq!(counts, MergeCounts { added: 0, updated: 1, removed: 0 });
        assert_eq!(catalog.episodes.len(), 2);
        let first = catalog.episodes.iter().find(|e| e.sonarr_episode_id == 100).unwrap();
        assert_eq!(first.last_watched, Some(at(18)));
        assert_eq!(first.watched_by.as_deref(), Some("alice"));
        let third = catalog.episodes.iter().find(|e| e.sonarr_episode_id == 102).unwrap();
        assert_eq!(third.id, 3);
    }

    #[test]
    fn test_apply_series_prunes_with_episodes() {
        let now = Utc::now();
        let mut catalog = Catalog::new();
        apply_series(
            &mut catalog,
            vec![
                remote_series(5, "The Wire", vec![remote_episode(100, 1, 1)]),
                remote_series(6, "Lost", vec![remote_episode(200, 1, 1)]),
            ],
            now,
        );

        let counts = apply_series(&mut catalog, vec![remote_series(6, "Lost", vec![remote_episode(200, 1, 1)])], now);

        assert_eq!(counts.removed, 1);
        assert_eq!(catalog.series.len(), 1);
        assert_eq!(catalog.episodes.len(), 1);
        assert_eq!(catalog.episodes[0].sonarr_episode_id, 200);
    }

    #[test]
    fn test_apply_plays_merges_history() {
        let now = Utc::now();
        let mut catalog = Catalog::new();
        apply_movies(&mut catalog, vec![remote_movie(1, "Heat")], now);
        let heat = PlayTarget::Movie {
            title: "Heat".to_string(),
        };

        let matched = apply_plays(
            &mut catalog,
            vec![
                play("alice", at(10), heat.clone()),
                play("alice", at(10) + Duration::hours(1), heat.clone()),
                play("bob", at(12), heat.clone()),
                play(
                    "carol",
                    at(12),
                    PlayTarget::Movie {
                        title: "Unknown".to_string(),
                    },
                ),
            ],
        );
        assert_eq!(matched, 3);

        // a later sync only sees the newest play
        apply_plays(&mut catalog, vec![play("carol", at(15), heat)]);

        let movie = &catalog.movies[0];
        assert_eq!(movie.watch_history.len(), 3);
        assert_eq!(movie.watch_history.watch_count(), 3);
        assert_eq!(movie.last_watched, Some(at(15)));
        assert_eq!(movie.watched_by.as_deref(), Some("carol"));
    }

    #[test]
    fn test_apply_requests_only_fills_unset() {
        let now = Utc::now();
        let mut catalog = Catalog::new();
        apply_movies(&mut catalog, vec![remote_movie(1, "Heat"), remote_movie(2, "Ronin")], now);
        apply_series(&mut catalog, vec![remote_series(5, "The Wire", vec![])], now);
        catalog.movies[1].requested_by = Some("admin".to_string());

        let request = |id: u64, kind: MediaKind, service_id: Option<u64>, user: &str| MediaRequest {
            request_id: id,
            kind,
            service_id,
            tmdb_id: None,
            title: None,
            requested_by: Some(user.to_string()),
            created_at: Some(at(1)),
        };
        let applied = apply_requests(
            &mut catalog,
            &[
                request(1, MediaKind::Movie, Some(1), "alice"),
                request(2, MediaKind::Movie, Some(2), "bob"),
                request(3, MediaKind::Series, Some(5), "carol"),
                request(4, MediaKind::Series, None, "dave"),
                request(5, MediaKind::Movie, Some(1), "erin"),
            ],
        );

        assert_eq!(applied, 2);
        assert_eq!(catalog.movies[0].requested_by.as_deref(), Some("alice"));
        assert_eq!(catalog.movies[0].requested_date, Some(at(1)));
        assert_eq!(catalog.movies[1].requested_by.as_deref(), Some("admin"));
        assert_eq!(catalog.series[0].requested_by.as_deref(), Some("carol"));
    }
}
