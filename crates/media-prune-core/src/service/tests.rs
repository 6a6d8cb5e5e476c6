use super::*;
use crate::error::StoreError;
use crate::store::{FileStore, MemoryStore};
use crate::testing::{episode, movie, series};
use media_prune_models::{default_rules, Catalog};
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;

const BIG_FILES: &str =
    r#"[{"field":"sizeOnDisk","operator":"bigger","value":"0","valueType":"customNumber","logicalOperator":null}]"#;

fn draft(name: &str, conditions_json: &str) -> RuleDraft {
    RuleDraft {
        name: name.to_string(),
        description: format!("{name} description"),
        enabled: true,
        apply_to_movies: true,
        apply_to_series: false,
        conditions_json: conditions_json.to_string(),
    }
}

fn library() -> Catalog {
    Catalog {
        movies: vec![movie(1, "Heat"), movie(2, "Ronin")],
        series: vec![series(1, "The Wire")],
        episodes: vec![episode(1, 1, 1, 1)],
        ..Catalog::default()
    }
}

/// Service over a library whose only enabled rule flags every movie
fn service_with_big_files_rule() -> SuggestionService<MemoryStore> {
    let store = MemoryStore::with_catalog(library());
    store.save_rules(&[]).unwrap();
    let mut service = SuggestionService::new(store);
    service.create_rule(draft("Big", BIG_FILES)).unwrap();
    service
}

/// Wraps a store and fails catalog reads on demand
struct FlakyStore {
    inner: MemoryStore,
    fail_catalog: AtomicBool,
}

impl LibraryStore for FlakyStore {
    fn load_catalog(&self) -> Result<Catalog, StoreError> {
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(StoreError::io(
                "catalog.bin",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            ));
        }
        self.inner.load_catalog()
    }
    fn save_catalog(&self, catalog: &Catalog) -> Result<(), StoreError> {
        self.inner.save_catalog(catalog)
    }
    fn load_rules(&self) -> Result<Vec<SuggestionRule>, StoreError> {
        self.inner.load_rules()
    }
    fn save_rules(&self, rules: &[SuggestionRule]) -> Result<(), StoreError> {
        self.inner.save_rules(rules)
    }
    fn load_suggestions(&self) -> Result<Vec<Suggestion>, StoreError> {
        self.inner.load_suggestions()
    }
    fn save_suggestions(&self, suggestions: &[Suggestion]) -> Result<(), StoreError> {
        self.inner.save_suggestions(suggestions)
    }
}

#[test]
fn test_create_rule_assigns_id_and_regenerates() {
    let service = service_with_big_files_rule();

    let rules = service.rules().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, 1);
    assert!(rules[0].is_custom);

    let active = service.active_suggestions().unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|s| s.media_type == MediaKind::Movie));
}

#[test]
fn test_create_rule_rejects_malformed_conditions() {
    let mut service = SuggestionService::new(MemoryStore::new());
    let err = service.create_rule(draft("Bad", "{nope")).unwrap_err();
    assert!(matches!(err, SuggestionError::InvalidConditions(_)));
    assert_eq!(service.rules().unwrap().len(), 4);
}

#[test]
fn test_generation_replaces_previous_active_set() {
    let mut service = service_with_big_files_rule();
    let first: Vec<u64> = service.active_suggestions().unwrap().iter().map(|s| s.id).collect();

    let report = service.generate_suggestions().unwrap();

    assert_eq!(report.created, 2);
    let second = service.active_suggestions().unwrap();
    assert_eq!(second.len(), 2);
    assert!(second.iter().all(|s| !first.contains(&s.id)));
}

#[test]
fn test_generation_is_idempotent() {
    let mut service = service_with_big_files_rule();
    let content = |service: &SuggestionService<MemoryStore>| {
        let mut rows: Vec<_> = service
            .active_suggestions()
            .unwrap()
            .into_iter()
            .map(|s| (s.media_type, s.media_id, s.rule_name, s.title, s.year, s.size, s.reason))
            .collect();
        rows.sort();
        rows
    };

    service.generate_suggestions().unwrap();
    let first = content(&service);
    service.generate_suggestions().unwrap();
    let second = content(&service);

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn test_dismissed_suggestion_is_not_re_emitted() {
    let mut service = service_with_big_files_rule();
    let target = service
        .active_suggestions()
        .unwrap()
        .into_iter()
        .find(|s| s.media_id == 1)
        .unwrap();

    let dismissed = service.dismiss(target.id).unwrap();
    assert!(dismissed.dismissed);

    let report = service.generate_suggestions().unwrap();
    assert_eq!(report.created, 1);
    assert_eq!(report.suppressed, 1);
    assert_eq!(report.dismissed_kept, 1);

    let active = service.active_suggestions().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].media_id, 2);

    // the dismissed row itself survives regeneration
    let stored = service.store().load_suggestions().unwrap();
    assert!(stored.iter().any(|s| s.id == target.id && s.dismissed));
}

#[test]
fn test_execute_returns_media_and_dismisses() {
    let mut service = service_with_big_files_rule();
    let target = service.active_suggestions().unwrap().remove(0);

    let media = service.execute(target.id).unwrap();

    assert_eq!(media.media_type, MediaKind::Movie);
    assert_eq!(media.media_id, target.media_id);
    assert!(service.suggestion(target.id).unwrap().dismissed);
}

#[test]
fn test_unknown_suggestion_id() {
    let mut service = service_with_big_files_rule();
    assert!(matches!(service.dismiss(999), Err(SuggestionError::SuggestionNotFound(999))));
    assert!(matches!(service.execute(999), Err(SuggestionError::SuggestionNotFound(999))));
}

#[test]
fn test_built_in_rules_cannot_be_deleted() {
    let mut service = SuggestionService::new(MemoryStore::new());

    let err = service.delete_rule(1).unwrap_err();
    assert!(matches!(err, SuggestionError::DefaultRuleProtected(1)));

    let disabled = service.set_rule_enabled(1, false).unwrap();
    assert!(!disabled.enabled);
    assert!(!service.rule(1).unwrap().enabled);
}

#[test]
fn test_delete_custom_rule_drops_its_suggestions() {
    let mut service = service_with_big_files_rule();
    assert_eq!(service.active_suggestions().unwrap().len(), 2);

    service.delete_rule(1).unwrap();

    assert!(service.rules().unwrap().is_empty());
    assert!(service.active_suggestions().unwrap().is_empty());
    assert!(matches!(service.delete_rule(1), Err(SuggestionError::RuleNotFound(1))));
}

#[test]
fn test_update_rule_keeps_custom_flag() {
    let mut service = SuggestionService::new(MemoryStore::new());
    let updated = service.update_rule(2, draft("Renamed", BIG_FILES)).unwrap();

    assert_eq!(updated.id, 2);
    assert_eq!(updated.name, "Renamed");
    assert!(!updated.is_custom);
    assert_eq!(service.rules().unwrap().len(), default_rules().len());
}

#[test]
fn test_remove_media_clears_its_suggestions() {
    let mut service = service_with_big_files_rule();

    let removed = service
        .remove_media(MediaRef {
            media_type: MediaKind::Movie,
            media_id: 1,
        })
        .unwrap();

    assert!(removed);
    assert!(service.catalog().unwrap().movie(1).is_none());
    let active = service.active_suggestions().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].media_id, 2);
}

#[test]
fn test_failed_generation_leaves_suggestions_untouched() {
    let inner = MemoryStore::with_catalog(library());
    inner.save_rules(&[]).unwrap();
    let mut service = SuggestionService::new(FlakyStore {
        inner,
        fail_catalog: AtomicBool::new(false),
    });
    service.create_rule(draft("Big", BIG_FILES)).unwrap();
    let before = service.store().load_suggestions().unwrap();
    assert_eq!(before.len(), 2);

    service.store().fail_catalog.store(true, Ordering::SeqCst);
    let err = service.generate_suggestions().unwrap_err();

    assert!(matches!(err, SuggestionError::Store(_)));
    assert_eq!(service.store().load_suggestions().unwrap(), before);
}

#[test]
fn test_file_store_round_trip_through_service() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path()).unwrap();
    store.save_catalog(&library()).unwrap();
    let mut service = SuggestionService::new(store);

    service.set_rule_enabled(4, true).unwrap();
    service.generate_suggestions().unwrap();

    let reopened = SuggestionService::new(FileStore::new(temp_dir.path()).unwrap());
    assert!(reopened.rule(4).unwrap().enabled);
    assert_eq!(
        reopened.active_suggestions().unwrap(),
        service.active_suggestions().unwrap()
    );
}

#[test]
fn test_unreadable_catalog_keeps_suggestions() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::new(temp_dir.path()).unwrap();
    store.save_catalog(&library()).unwrap();
    store.save_rules(&[]).unwrap();
    let mut service = SuggestionService::new(store);
    service.create_rule(draft("Big", BIG_FILES)).unwrap();
    let before = service.store().load_suggestions().unwrap();
    assert_eq!(before.len(), 2);

    std::fs::write(service.store().catalog_path(), b"garbage").unwrap();
    let err = service.generate_suggestions().unwrap_err();

    assert!(matches!(err, SuggestionError::Store(StoreError::Corrupt { .. })));
    assert_eq!(service.store().load_suggestions().unwrap(), before);
}

#[test]
fn test_remove_episode_updates_catalog() {
    let store = MemoryStore::with_catalog(library());
    let mut service = SuggestionService::new(store);

    let removed = service.remove_episode(1).unwrap().unwrap();

    assert_eq!(removed.series_id, 1);
    let catalog = service.catalog().unwrap();
    assert!(catalog.episode(1).is_none());
    assert_eq!(catalog.series_by_id(1).unwrap().total_size, 5_000_000 - 500_000);
    assert!(service.remove_episode(1).unwrap().is_none());
}
