use chrono::Utc;
use media_prune_models::{Catalog, Condition, Episode, MediaKind, Suggestion, SuggestionKey, SuggestionRule};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::error::SuggestionError;
use crate::generator::{generate, SkippedRule};
use crate::store::LibraryStore;

/// Summary of one generation pass
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub created: usize,
    pub suppressed: usize,
    pub dismissed_kept: usize,
    pub rules_evaluated: usize,
    pub skipped_rules: Vec<SkippedRule>,
    pub elapsed_ms: u64,
}

/// Points at the catalog item a suggestion was about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MediaRef {
    pub media_type: MediaKind,
    pub media_id: u64,
}

/// Fields a user supplies when creating or editing a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub apply_to_movies: bool,
    #[serde(default = "default_true")]
    pub apply_to_series: bool,
    pub conditions_json: String,
}

fn default_true() -> bool {
    true
}

impl RuleDraft {
    fn validate(&self) -> Result<Vec<Condition>, SuggestionError> {
        let parsed: Option<Vec<Condition>> =
            serde_json::from_str(&self.conditions_json).map_err(SuggestionError::InvalidConditions)?;
        Ok(parsed.unwrap_or_default())
    }
}

/// Owns the rule set and the suggestion set on top of a [`LibraryStore`].
///
/// Mutating methods take `&mut self`, so one service instance never runs two
/// generation passes at once.
pub struct SuggestionService<S: LibraryStore> {
    store: S,
}

impl<S: LibraryStore> SuggestionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn catalog(&self) -> Result<Catalog, SuggestionError> {
        Ok(self.store.load_catalog()?)
    }

    pub fn save_catalog(&mut self, catalog: &Catalog) -> Result<(), SuggestionError> {
        Ok(self.store.save_catalog(catalog)?)
    }

    /// Recompute suggestions from the current catalog and rules.
    ///
    /// Dismissed suggestions are kept and suppress re-emission of the same
    /// (media, rule) pair. Every other stored suggestion is replaced. Nothing is
    /// written if loading fails.
    #[instrument(skip(self))]
    pub fn generate_suggestions(&mut self) -> Result<GenerationReport, SuggestionError> {
        let start = Instant::now();
        let rules = self.store.load_rules()?;
        let catalog = self.store.load_catalog()?;
        let existing = self.store.load_suggestions()?;

        let mut next_id = existing.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let mut kept: Vec<Suggestion> = existing.into_iter().filter(|s| s.dismissed).collect();
        let dismissed: HashSet<SuggestionKey> = kept.iter().map(Suggestion::key).collect();
        let dismissed_kept = kept.len();

        let outcome = generate(&rules, &catalog, &dismissed, Utc::now());
        let created = outcome.suggestions.len();
        for mut suggestion in outcome.suggestions {
            suggestion.id = next_id;
            next_id += 1;
            kept.push(suggestion);
        }

        self.store.save_suggestions(&kept)?;

        let report = GenerationReport {
            created,
            suppressed: outcome.suppressed,
            dismissed_kept,
            rules_evaluated: outcome.rules_evaluated,
            skipped_rules: outcome.skipped,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            operation = "generate",
            created = report.created,
            suppressed = report.suppressed,
            skipped_rules = report.skipped_rules.len(),
            elapsed_ms = report.elapsed_ms,
            "Suggestion generation completed"
        );
        Ok(report)
    }

    /// Suggestions not yet dismissed, newest first
    pub fn active_suggestions(&self) -> Result<Vec<Suggestion>, SuggestionError> {
        let mut active: Vec<Suggestion> = self
            .store
            .load_suggestions()?
            .into_iter()
            .filter(|s| !s.dismissed)
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(active)
    }

    pub fn suggestion(&self, id: u64) -> Result<Suggestion, SuggestionError> {
        self.store
            .load_suggestions()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or(SuggestionError::SuggestionNotFound(id))
    }

    pub fn dismiss(&mut self, id: u64) -> Result<Suggestion, SuggestionError> {
        let suggestion = self.mark_dismissed(id)?;
        info!(suggestion_id = id, title = %suggestion.title, "Suggestion dismissed");
        Ok(suggestion)
    }

    /// Mark a suggestion as acted upon and return the item it points at.
    /// Deleting the item from the media servers is up to the caller.
    pub fn execute(&mut self, id: u64) -> Result<MediaRef, SuggestionError> {
        let suggestion = self.mark_dismissed(id)?;
        info!(
            suggestion_id = id,
            media_type = %suggestion.media_type,
            media_id = suggestion.media_id,
            "Suggestion executed"
        );
        Ok(MediaRef {
            media_type: suggestion.media_type,
            media_id: suggestion.media_id,
        })
    }

    fn mark_dismissed(&mut self, id: u64) -> Result<Suggestion, SuggestionError> {
        let mut suggestions = self.store.load_suggestions()?;
        let suggestion = suggestions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(SuggestionError::SuggestionNotFound(id))?;
        suggestion.dismissed = true;
        let updated = suggestion.clone();
        self.store.save_suggestions(&suggestions)?;
        Ok(updated)
    }

    pub fn rules(&self) -> Result<Vec<SuggestionRule>, SuggestionError> {
        Ok(self.store.load_rules()?)
    }

    pub fn rule(&self, id: u64) -> Result<SuggestionRule, SuggestionError> {
        self.store
            .load_rules()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(SuggestionError::RuleNotFound(id))
    }

    /// Add a user rule and regenerate suggestions
    pub fn create_rule(&mut self, draft: RuleDraft) -> Result<SuggestionRule, SuggestionError> {
        draft.validate()?;
        let mut rules = self.store.load_rules()?;
        let rule = SuggestionRule {
            id: rules.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            name: draft.name,
            description: draft.description,
            enabled: draft.enabled,
            apply_to_movies: draft.apply_to_movies,
            apply_to_series: draft.apply_to_series,
            conditions_json: draft.conditions_json,
            is_custom: true,
        };
        rules.push(rule.clone());
        self.store.save_rules(&rules)?;
        info!(rule_id = rule.id, rule = %rule.name, "Rule created");

        self.regenerate_after_rule_change();
        Ok(rule)
    }

    /// Replace a rule's editable fields. The built-in flag never changes.
    pub fn update_rule(&mut self, id: u64, draft: RuleDraft) -> Result<SuggestionRule, SuggestionError> {
        draft.validate()?;
        let updated = self.modify_rule(id, |rule| {
            rule.name = draft.name;
            rule.description = draft.description;
            rule.enabled = draft.enabled;
            rule.apply_to_movies = draft.apply_to_movies;
            rule.apply_to_series = draft.apply_to_series;
            rule.conditions_json = draft.conditions_json;
        })?;
        info!(rule_id = id, rule = %updated.name, "Rule updated");
        Ok(updated)
    }

    pub fn set_rule_enabled(&mut self, id: u64, enabled: bool) -> Result<SuggestionRule, SuggestionError> {
        let updated = self.modify_rule(id, |rule| rule.enabled = enabled)?;
        info!(rule_id = id, enabled, "Rule toggled");
        Ok(updated)
    }

    /// Delete a user rule. Built-in rules can only be disabled.
    pub fn delete_rule(&mut self, id: u64) -> Result<SuggestionRule, SuggestionError> {
        let mut rules = self.store.load_rules()?;
        let index = rules
            .iter()
            .position(|r| r.id == id)
            .ok_or(SuggestionError::RuleNotFound(id))?;
        if !rules[index].is_custom {
            return Err(SuggestionError::DefaultRuleProtected(id));
        }
        let removed = rules.remove(index);
        self.store.save_rules(&rules)?;
        info!(rule_id = id, rule = %removed.name, "Rule deleted");

        self.regenerate_after_rule_change();
        Ok(removed)
    }

    /// Drop an item from the local catalog (after it was deleted upstream) and
    /// regenerate. Returns whether the item was present.
    pub fn remove_media(&mut self, media: MediaRef) -> Result<bool, SuggestionError> {
        let mut catalog = self.store.load_catalog()?;
        let removed = match media.media_type {
            MediaKind::Movie => catalog.remove_movie(media.media_id).is_some(),
            MediaKind::Series => catalog.remove_series(media.media_id).is_some(),
        };
        if removed {
            self.store.save_catalog(&catalog)?;
            info!(media_type = %media.media_type, media_id = media.media_id, "Removed media from catalog");
            self.generate_suggestions()?;
        }
        Ok(removed)
    }

    /// Drop a single episode file from the catalog (after it was deleted in
    /// Sonarr) and regenerate
    pub fn remove_episode(&mut self, episode_id: u64) -> Result<Option<Episode>, SuggestionError> {
        let mut catalog = self.store.load_catalog()?;
        let Some(episode) = catalog.remove_episode(episode_id) else {
            return Ok(None);
        };
        self.store.save_catalog(&catalog)?;
        info!(
            episode_id,
            series_id = episode.series_id,
            episode = %episode.label(),
            "Removed episode from catalog"
        );
        self.generate_suggestions()?;
        Ok(Some(episode))
    }

    fn modify_rule<F>(&mut self, id: u64, apply: F) -> Result<SuggestionRule, SuggestionError>
    where
        F: FnOnce(&mut SuggestionRule),
    {
        let mut rules = self.store.load_rules()?;
        let rule = rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(SuggestionError::RuleNotFound(id))?;
        apply(rule);
        let updated = rule.clone();
        self.store.save_rules(&rules)?;

        self.regenerate_after_rule_change();
        Ok(updated)
    }

    // The rule change is already saved; a failed regeneration only leaves the
    // previous suggestion set in place.
    fn regenerate_after_rule_change(&mut self) {
        if let Err(e) = self.generate_suggestions() {
            warn!(error = %e, "Failed to regenerate suggestions after rule change");
        }
    }
}

#[cfg(test)]
mod tests;
