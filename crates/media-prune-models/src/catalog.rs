use serde::{Deserialize, Serialize};

use crate::media::{Episode, Movie, Series};

/// Highest local ids ever handed out. Ids are never reused, so a dismissed
/// suggestion for a deleted item cannot attach to a newcomer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdWatermarks {
    pub movie: u64,
    pub series: u64,
    pub episode: u64,
}

/// Local snapshot of everything the media servers reported
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    pub movies: Vec<Movie>,
    pub series: Vec<Series>,
    pub episodes: Vec<Episode>,
    pub watermarks: IdWatermarks,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty() && self.series.is_empty()
    }

    pub fn movie(&self, id: u64) -> Option<&Movie> {
        self.movies.iter().find(|m| m.id == id)
    }

    pub fn series_by_id(&self, id: u64) -> Option<&Series> {
        self.series.iter().find(|s| s.id == id)
    }

    pub fn episodes_for(&self, series_id: u64) -> Vec<&Episode> {
        self.episodes.iter().filter(|e| e.series_id == series_id).collect()
    }

    /// Each series paired with its episodes, in catalog order
    pub fn series_with_episodes(&self) -> Vec<(&Series, Vec<&Episode>)> {
        self.series
            .iter()
            .map(|s| (s, self.episodes_for(s.id)))
            .collect()
    }

    pub fn remove_movie(&mut self, id: u64) -> Option<Movie> {
        let index = self.movies.iter().position(|m| m.id == id)?;
        Some(self.movies.remove(index))
    }

    pub fn episode(&self, id: u64) -> Option<&Episode> {
        self.episodes.iter().find(|e| e.id == id)
    }

    /// Movies, most recently added first
    pub fn movies_by_added(&self) -> Vec<&Movie> {
        let mut movies: Vec<&Movie> = self.movies.iter().collect();
        movies.sort_by(|a, b| b.added.cmp(&a.added).then_with(|| a.id.cmp(&b.id)));
        movies
    }

    /// Series, most recently added first, each with its episodes in season
    /// and episode order
    pub fn series_by_added(&self) -> Vec<(&Series, Vec<&Episode>)> {
        let mut series = self.series_with_episodes();
        series.sort_by(|(a, _), (b, _)| b.added.cmp(&a.added).then_with(|| a.id.cmp(&b.id)));
        for (_, episodes) in &mut series {
            episodes.sort_by_key(|e| (e.season_number, e.episode_number));
        }
        series
    }

    /// Remove one episode file. Its size no longer counts towards the series.
    pub fn remove_episode(&mut self, id: u64) -> Option<Episode> {
        let index = self.episodes.iter().position(|e| e.id == id)?;
        let episode = self.episodes.remove(index);
        if let Some(series) = self.series.iter_mut().find(|s| s.id == episode.series_id) {
            series.total_size = series.total_size.saturating_sub(episode.size_on_disk);
        }
        Some(episode)
    }

    /// Remove a series together with the episodes it owns
    pub fn remove_series(&mut self, id: u64) -> Option<Series> {
        let index = self.series.iter().position(|s| s.id == id)?;
        self.episodes.retain(|e| e.series_id != id);
        Some(self.series.remove(index))
    }

    /// Raise the watermarks to cover every id currently present
    pub fn refresh_watermarks(&mut self) {
        let movies = self.movies.iter().map(|m| m.id).max().unwrap_or(0);
        let series = self.series.iter().map(|s| s.id).max().unwrap_or(0);
        let episodes = self.episodes.iter().map(|e| e.id).max().unwrap_or(0);
        self.watermarks.movie = self.watermarks.movie.max(movies);
        self.watermarks.series = self.watermarks.series.max(series);
        self.watermarks.episode = self.watermarks.episode.max(episodes);
    }

    pub fn allocate_movie_id(&mut self) -> u64 {
        let highest = self.movies.iter().map(|m| m.id).max().unwrap_or(0);
        self.watermarks.movie = self.watermarks.movie.max(highest) + 1;
        self.watermarks.movie
    }

    pub fn allocate_series_id(&mut self) -> u64 {
        let highest = self.series.iter().map(|s| s.id).max().unwrap_or(0);
        self.watermarks.series = self.watermarks.series.max(highest) + 1;
        self.watermarks.series
    }

    pub fn allocate_episode_id(&mut self) -> u64 {
        let highest = self.episodes.iter().map(|e| e.id).max().unwrap_or(0);
        self.watermarks.episode = self.watermarks.episode.max(highest) + 1;
        self.watermarks.episode
    }
}
