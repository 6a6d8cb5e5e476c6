//! One suggestion pass over the catalog.
//!
//! The pass is pure: it takes the rules, a catalog snapshot and the keys of
//! dismissed suggestions, and returns fresh suggestions. Persisting them is the
//! caller's job (see [`crate::service::SuggestionService`]).

use chrono::{DateTime, Utc};
use media_prune_models::{Catalog, MediaKind, Movie, Series, Suggestion, SuggestionKey, SuggestionRule};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

use crate::evaluator::{evaluate_movie_at, evaluate_series_at};

/// Why a rule produced nothing during a pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    /// Stored condition JSON did not parse
    InvalidConditions(String),
    NoConditions,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidConditions(e) => write!(f, "invalid conditions: {e}"),
            SkipReason::NoConditions => f.write_str("no conditions"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRule {
    pub rule_id: u64,
    pub rule_name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct GenerationOutcome {
    /// New suggestions in emission order. Ids are left at 0 for the caller to assign.
    pub suggestions: Vec<Suggestion>,
    pub rules_evaluated: usize,
    pub skipped: Vec<SkippedRule>,
    /// Matches not emitted because the user dismissed them earlier
    pub suppressed: usize,
}

/// Evaluate every enabled rule, in order, against movies and then series.
/// `now` is both the comparison time for date conditions and the creation
/// timestamp of every emitted suggestion.
///
/// A rule whose conditions cannot be parsed (or that has none) is skipped and
/// reported in the outcome; it never stops the other rules.
pub fn generate(
    rules: &[SuggestionRule],
    catalog: &Catalog,
    dismissed: &HashSet<SuggestionKey>,
    now: DateTime<Utc>,
) -> GenerationOutcome {
    let mut outcome = GenerationOutcome::default();
    let series = catalog.series_with_episodes();

    for rule in rules.iter().filter(|r| r.enabled) {
        let conditions = match rule.parse_conditions() {
            Ok(conditions) => conditions,
            Err(e) => {
                warn!(rule = %rule.name, rule_id = rule.id, error = %e, "Skipping rule with invalid conditions");
                outcome.skipped.push(SkippedRule {
                    rule_id: rule.id,
                    rule_name: rule.name.clone(),
                    reason: SkipReason::InvalidConditions(e.to_string()),
                });
                continue;
            }
        };
        if conditions.is_empty() {
            debug!(rule = %rule.name, rule_id = rule.id, "Skipping rule without conditions");
            outcome.skipped.push(SkippedRule {
                rule_id: rule.id,
                rule_name: rule.name.clone(),
                reason: SkipReason::NoConditions,
            });
            continue;
        }

        outcome.rules_evaluated += 1;
        let before = outcome.suggestions.len();

        if rule.apply_to_movies {
            for movie in catalog.movies.iter().filter(|m| evaluate_movie_at(m, &conditions, now)) {
                outcome.push(movie_suggestion(movie, rule, now), dismissed);
            }
        }

        if rule.apply_to_series {
            for (show, episodes) in &series {
                if evaluate_series_at(show, episodes, &conditions, now) {
                    outcome.push(series_suggestion(show, rule, now), dismissed);
                }
            }
        }

        debug!(
            rule = %rule.name,
            matches = outcome.suggestions.len() - before,
            "Rule evaluated"
        );
    }

    outcome
}

impl GenerationOutcome {
    fn push(&mut self, suggestion: Suggestion, dismissed: &HashSet<SuggestionKey>) {
        if dismissed.contains(&suggestion.key()) {
            self.suppressed += 1;
        } else {
            self.suggestions.push(suggestion);
        }
    }
}

fn movie_suggestion(movie: &Movie, rule: &SuggestionRule, now: DateTime<Utc>) -> Suggestion {
    Suggestion {
        id: 0,
        media_type: MediaKind::Movie,
        media_id: movie.id,
        title: movie.title.clone(),
        year: movie.year,
        size: movie.size_on_disk,
        poster_url: movie.poster_url.clone(),
        rule_name: rule.name.clone(),
        reason: rule.description.clone(),
        dismissed: false,
        created_at: now,
    }
}

fn series_suggestion(series: &Series, rule: &SuggestionRule, now: DateTime<Utc>) -> Suggestion {
    Suggestion {
        id: 0,
        media_type: MediaKind::Series,
        media_id: series.id,
        title: series.title.clone(),
        year: series.year,
        size: series.total_size,
        poster_url: series.poster_url.clone(),
        rule_name: rule.name.clone(),
        reason: rule.description.clone(),
        dismissed: false,
        created_at: now,
    }
}

#[cfg(test)]
mod tests;
