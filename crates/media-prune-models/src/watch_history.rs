use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A single play of an item by one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchEvent {
    pub user: String,
    pub watched_at: DateTime<Utc>,
}

impl WatchEvent {
    pub fn new(user: impl Into<String>, watched_at: DateTime<Utc>) -> Self {
        Self {
            user: user.into(),
            watched_at,
        }
    }
}

/// Watch log of an item.
///
/// Holds at most one entry per user per calendar day (the latest play of that day),
/// ordered oldest first so the most recent play is always last.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WatchHistory(Vec<WatchEvent>);

impl WatchHistory {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a history from raw plays, collapsing same-user same-day plays.
    /// Plays without a user are dropped.
    pub fn from_events<I>(events: I) -> Self
    where
        I: IntoIterator<Item = WatchEvent>,
    {
        let mut latest_per_day: BTreeMap<(String, NaiveDate), DateTime<Utc>> = BTreeMap::new();
        for event in events {
            if event.user.trim().is_empty() {
                continue;
            }
            let key = (event.user, event.watched_at.date_naive());
            latest_per_day
                .entry(key)
                .and_modify(|existing| {
                    if event.watched_at > *existing {
                        *existing = event.watched_at;
                    }
                })
                .or_insert(event.watched_at);
        }

        let mut entries: Vec<WatchEvent> = latest_per_day
            .into_iter()
            .map(|((user, _), watched_at)| WatchEvent { user, watched_at })
            .collect();
        entries.sort_by(|a, b| a.watched_at.cmp(&b.watched_at).then_with(|| a.user.cmp(&b.user)));
        Self(entries)
    }

    /// Merge additional plays into this history, keeping the dedup invariant
    pub fn merge<I>(&self, events: I) -> Self
    where
        I: IntoIterator<Item = WatchEvent>,
    {
        Self::from_events(self.0.iter().cloned().chain(events))
    }

    pub fn events(&self) -> &[WatchEvent] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn latest(&self) -> Option<&WatchEvent> {
        self.0.last()
    }

    pub fn distinct_users(&self) -> HashSet<&str> {
        self.0
            .iter()
            .map(|e| e.user.as_str())
            .filter(|u| !u.is_empty())
            .collect()
    }

    /// Number of different users that watched the item
    pub fn watch_count(&self) -> usize {
        self.distinct_users().len()
    }
}
