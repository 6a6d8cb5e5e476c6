use super::progress::is_interactive;
use super::prompts::prompt_yes_no;
use super::{load_config, open_service};
use crate::output::{format_size, new_table, Output};
use crate::{MediaCommands, MediaTarget};
use chrono::{DateTime, Utc};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use media_prune_config::{Config, PathManager};
use media_prune_core::{FileStore, MediaRef, SuggestionService};
use media_prune_models::{Catalog, Episode, MediaKind, Movie, Series};
use media_prune_sources::factory::{overseerr_client, radarr_client, sonarr_client};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

#[derive(Serialize)]
struct Listing<'a> {
    movies: Vec<&'a Movie>,
    series: Vec<SeriesListing<'a>>,
}

#[derive(Serialize)]
struct SeriesListing<'a> {
    #[serde(flatten)]
    series: &'a Series,
    episodes: Vec<&'a Episode>,
}

pub async fn run_media(paths: &PathManager, cmd: MediaCommands, output: &Output) -> Result<()> {
    match cmd {
        MediaCommands::List {
            movies,
            series,
            episodes,
        } => {
            let catalog = open_service(paths)?.catalog()?;
            // no filter means everything
            let (movies, series) = if movies || series { (movies, series) } else { (true, true) };
            list(&catalog, movies, series, episodes, output);
            Ok(())
        }
        MediaCommands::Delete { target, id, yes } => {
            let config = load_config(paths)?;
            let mut service = open_service(paths)?;
            delete(&mut service, &config, target, id, yes, output).await
        }
    }
}

fn list(catalog: &Catalog, movies: bool, series: bool, episodes: bool, output: &Output) {
    let listing = Listing {
        movies: if movies { catalog.movies_by_added() } else { Vec::new() },
        series: if series {
            catalog
                .series_by_added()
                .into_iter()
                .map(|(series, episodes)| SeriesListing { series, episodes })
                .collect()
        } else {
            Vec::new()
        },
    };
    output.data("media", &listing);

    if listing.movies.is_empty() && listing.series.is_empty() {
        output.info("The catalog is empty. Run 'reclaim sync' first.");
        return;
    }

    if movies {
        output.section("Movies");
        let mut table = new_table(["ID", "Title", "Quality", "Size", "Added", "Last watched", "Requested by", "Monitored"]);
        for m in &listing.movies {
            table.add_row(vec![
                m.id.to_string(),
                with_year(&m.title, m.year),
                m.quality.clone(),
                format_size(m.size_on_disk),
                day(Some(m.added)),
                day(m.last_watched),
                m.requested_by.clone().unwrap_or_else(|| "-".to_string()),
                yes_no(m.monitored),
            ]);
        }
        output.table(&table);
        let total: u64 = listing.movies.iter().map(|m| m.size_on_disk).sum();
        output.info(format!("{} movies, {}", listing.movies.len(), format_size(total)));
    }

    if series {
        output.section("Series");
        let mut table = new_table(["ID", "Title", "Episodes", "Size", "Added", "Last watched", "Requested by", "Monitored"]);
        for entry in &listing.series {
            let s = entry.series;
            table.add_row(vec![
                s.id.to_string(),
                with_year(&s.title, s.year),
                entry.episodes.len().to_string(),
                format_size(s.total_size),
                day(Some(s.added)),
                day(latest_watch(&entry.episodes)),
                s.requested_by.clone().unwrap_or_else(|| "-".to_string()),
                yes_no(s.monitored),
            ]);
        }
        output.table(&table);
        let total: u64 = listing.series.iter().map(|e| e.series.total_size).sum();
        output.info(format!("{} series, {}", listing.series.len(), format_size(total)));
    }

    if series && episodes {
        for entry in listing.series.iter().filter(|e| !e.episodes.is_empty()) {
            output.section(&format!("{} episodes", entry.series.title));
            let mut table = new_table(["ID", "Episode", "Title", "Quality", "Size", "Last watched"]);
            for ep in &entry.episodes {
                table.add_row(vec![
                    ep.id.to_string(),
                    ep.label(),
                    ep.title.clone(),
                    ep.quality.clone(),
                    format_size(ep.size_on_disk),
                    day(ep.last_watched),
                ]);
            }
            output.table(&table);
        }
    }
}

async fn delete(
    service: &mut SuggestionService<FileStore>,
    config: &Config,
    target: MediaTarget,
    id: u64,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let catalog = service.catalog()?;

    let kind = match target {
        MediaTarget::Movie => MediaKind::Movie,
        MediaTarget::Series => MediaKind::Series,
        MediaTarget::Episode => return delete_episode(service, &catalog, config, id, yes, output).await,
    };
    let media = MediaRef {
        media_type: kind,
        media_id: id,
    };
    let (title, size) = match kind {
        MediaKind::Movie => catalog.movie(id).map(|m| (m.title.clone(), m.size_on_disk)),
        MediaKind::Series => catalog.series_by_id(id).map(|s| (s.title.clone(), s.total_size)),
    }
    .ok_or_else(|| eyre!("{} {} is not in the catalog; see 'reclaim media list'", kind, id))?;

    let question = format!(
        "Delete {} '{}' and its files ({})?",
        kind.to_string().to_lowercase(),
        title,
        format_size(size)
    );
    if !confirm_deletion(&question, yes, output)? {
        return Ok(());
    }

    delete_upstream(&catalog, config, media, output).await?;
    service.remove_media(media)?;

    output.data("deleted", &media);
    output.success(format!("Deleted {} ({} freed)", title, format_size(size)));
    Ok(())
}

async fn delete_episode(
    service: &mut SuggestionService<FileStore>,
    catalog: &Catalog,
    config: &Config,
    id: u64,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let episode = catalog
        .episode(id)
        .ok_or_else(|| eyre!("Episode {} is not in the catalog; see 'reclaim media list --episodes'", id))?;
    let series_title = catalog
        .series_by_id(episode.series_id)
        .map_or("unknown series", |s| s.title.as_str());
    let label = format!("{} {}", series_title, episode.label());

    let question = format!("Delete the file of {} ({})?", label, format_size(episode.size_on_disk));
    if !confirm_deletion(&question, yes, output)? {
        return Ok(());
    }

    let sonarr = sonarr_client(config)?;
    sonarr
        .delete_episode_file(episode.episode_file_id)
        .await
        .wrap_err("Sonarr refused the deletion")?;
    service.remove_episode(id)?;

    output.data(
        "deleted",
        &json!({ "episode_id": id, "series_id": episode.series_id, "episode": episode.label() }),
    );
    output.success(format!("Deleted {} ({} freed)", label, format_size(episode.size_on_disk)));
    Ok(())
}

/// Asks before anything is deleted upstream. Without a terminal `--yes` is required.
pub fn confirm_deletion(question: &str, yes: bool, output: &Output) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !is_interactive() {
        return Err(eyre!("Refusing to delete without confirmation; pass --yes"));
    }
    if prompt_yes_no(question, false)? {
        Ok(true)
    } else {
        output.info("Cancelled");
        Ok(false)
    }
}

/// Delete a movie or series with its files in Radarr or Sonarr, then drop
/// the Overseerr request so it can be requested again
pub async fn delete_upstream(catalog: &Catalog, config: &Config, media: MediaRef, output: &Output) -> Result<()> {
    let tmdb_id = match media.media_type {
        MediaKind::Movie => {
            let movie = catalog
                .movie(media.media_id)
                .ok_or_else(|| eyre!("Movie {} is no longer in the catalog; run 'reclaim sync'", media.media_id))?;
            let radarr = radarr_client(config)?;
            let tmdb_id = radarr
                .delete_movie(movie.radarr_id)
                .await
                .wrap_err("Radarr refused the deletion")?;
            tmdb_id.or(movie.tmdb_id)
        }
        MediaKind::Series => {
            let series = catalog
                .series_by_id(media.media_id)
                .ok_or_else(|| eyre!("Series {} is no longer in the catalog; run 'reclaim sync'", media.media_id))?;
            let sonarr = sonarr_client(config)?;
            sonarr
                .delete_series(series.sonarr_id)
                .await
                .wrap_err("Sonarr refused the deletion")?;
            series.tmdb_id
        }
    };

    let Some(tmdb_id) = tmdb_id else {
        return Ok(());
    };
    match overseerr_client(config) {
        Ok(Some(overseerr)) => match overseerr.delete_request_by_tmdb(tmdb_id, media.media_type).await {
            Ok(true) => info!(tmdb_id, "Removed Overseerr request"),
            Ok(false) => info!(tmdb_id, "No Overseerr request to remove"),
            Err(e) => {
                warn!(tmdb_id, error = %e, "Failed to remove Overseerr request");
                output.warn(format!("Could not remove the Overseerr request: {e}"));
            }
        },
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Overseerr client unavailable"),
    }
    Ok(())
}

fn latest_watch(episodes: &[&Episode]) -> Option<DateTime<Utc>> {
    episodes.iter().filter_map(|e| e.last_watched).max()
}

fn with_year(title: &str, year: Option<u32>) -> String {
    match year {
        Some(year) => format!("{title} ({year})"),
        None => title.to_string(),
    }
}

fn day(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(|| "never".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use media_prune_models::WatchHistory;

    fn episode(id: u64, last_watched: Option<DateTime<Utc>>) -> Episode {
        Episode {
            id,
            series_id: 1,
            sonarr_episode_id: id,
            episode_file_id: id * 10,
            season_number: 1,
            episode_number: id as u32,
            title: format!("Episode {id}"),
            quality: "HDTV-720p".to_string(),
            size_on_disk: 100,
            air_date: None,
            last_watched,
            watched_by: None,
            watch_history: WatchHistory::default(),
            file_path: String::new(),
        }
    }

    #[test]
    fn test_latest_watch_across_episodes() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let first = episode(1, Some(base));
        let second = episode(2, Some(base + Duration::days(3)));
        let unwatched = episode(3, None);

        assert_eq!(latest_watch(&[&first, &unwatched, &second]), Some(base + Duration::days(3)));
        assert_eq!(latest_watch(&[&unwatched]), None);
        assert_eq!(latest_watch(&[]), None);
    }

    #[test]
    fn test_listing_nests_episodes_under_series() {
        let series = Series {
            id: 4,
            sonarr_id: 40,
            tmdb_id: None,
            title: "Show".to_string(),
            year: Some(2020),
            added: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            requested_date: None,
            requested_by: None,
            total_size: 200,
            monitored: true,
            poster_url: None,
        };
        let first = episode(1, None);
        let listing = Listing {
            movies: Vec::new(),
            series: vec![SeriesListing {
                series: &series,
                episodes: vec![&first],
            }],
        };

        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["series"][0]["title"], "Show");
        assert_eq!(value["series"][0]["episodes"][0]["id"], 1);
        assert_eq!(value["movies"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn test_formatting_helpers() {
        assert_eq!(with_year("Heat", Some(1995)), "Heat (1995)");
        assert_eq!(with_year("Heat", None), "Heat");
        assert_eq!(day(None), "never");
        assert_eq!(day(Some(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap())), "2024-05-06");
    }
}
