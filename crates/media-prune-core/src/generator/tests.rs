use super::*;
use crate::testing::{episode, movie, series};
use chrono::Duration;
use media_prune_models::{default_rules, Condition, FieldName, Operator, ValueKind, WatchEvent, WatchHistory};

fn rule(id: u64, name: &str, conditions: &[Condition]) -> SuggestionRule {
    let mut rule = SuggestionRule {
        id,
        name: name.to_string(),
        description: format!("{name} description"),
        enabled: true,
        apply_to_movies: true,
        apply_to_series: true,
        conditions_json: "[]".to_string(),
        is_custom: true,
    };
    rule.set_conditions(conditions).unwrap();
    rule
}

fn size_over_zero() -> Condition {
    Condition::new(FieldName::SizeOnDisk, Operator::Bigger, "0", ValueKind::CustomNumber)
}

fn catalog_with(movies: Vec<Movie>) -> Catalog {
    Catalog {
        movies,
        ..Catalog::default()
    }
}

#[test]
fn test_matching_movie_yields_one_suggestion() {
    let mut m = movie(7, "Heat");
    m.size_on_disk = 500;
    m.poster_url = Some("http://posters/heat.jpg".to_string());
    let rules = vec![rule(1, "Big", &[size_over_zero()])];
    let now = Utc::now();

    let outcome = generate(&rules, &catalog_with(vec![m]), &HashSet::new(), now);

    assert_eq!(outcome.suggestions.len(), 1);
    let s = &outcome.suggestions[0];
    assert_eq!(s.media_type, MediaKind::Movie);
    assert_eq!(s.media_id, 7);
    assert_eq!(s.title, "Heat");
    assert_eq!(s.size, 500);
    assert_eq!(s.rule_name, "Big");
    assert_eq!(s.reason, "Big description");
    assert_eq!(s.poster_url.as_deref(), Some("http://posters/heat.jpg"));
    assert!(!s.dismissed);
    assert_eq!(s.created_at, now);
}

#[test]
fn test_disabled_rules_are_ignored() {
    let mut disabled = rule(1, "Big", &[size_over_zero()]);
    disabled.enabled = false;

    let outcome = generate(&[disabled], &catalog_with(vec![movie(1, "Heat")]), &HashSet::new(), Utc::now());

    assert!(outcome.suggestions.is_empty());
    assert_eq!(outcome.rules_evaluated, 0);
}

#[test]
fn test_invalid_conditions_skip_only_that_rule() {
    let mut broken = rule(1, "Broken", &[]);
    broken.conditions_json = "{not json".to_string();
    let rules = vec![broken, rule(2, "Big", &[size_over_zero()])];

    let outcome = generate(&rules, &catalog_with(vec![movie(1, "Heat")]), &HashSet::new(), Utc::now());

    assert_eq!(outcome.suggestions.len(), 1);
    assert_eq!(outcome.suggestions[0].rule_name, "Big");
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].rule_id, 1);
    assert!(matches!(outcome.skipped[0].reason, SkipReason::InvalidConditions(_)));
}

#[test]
fn test_rule_without_conditions_matches_nothing() {
    let mut null_conditions = rule(1, "Null", &[]);
    null_conditions.conditions_json = "null".to_string();
    let rules = vec![rule(2, "Empty", &[]), null_conditions];

    let outcome = generate(&rules, &catalog_with(vec![movie(1, "Heat")]), &HashSet::new(), Utc::now());

    assert!(outcome.suggestions.is_empty());
    assert_eq!(outcome.skipped.len(), 2);
    assert!(outcome.skipped.iter().all(|s| s.reason == SkipReason::NoConditions));
}

#[test]
fn test_emission_order_is_rule_then_movies_then_series() {
    let catalog = Catalog {
        movies: vec![movie(1, "A"), movie(2, "B")],
        series: vec![series(1, "S")],
        episodes: vec![episode(1, 1, 1, 1)],
        ..Catalog::default()
    };
    let monitored = Condition::new(FieldName::Monitored, Operator::Equals, "true", ValueKind::Boolean);
    let rules = vec![rule(1, "First", &[monitored.clone()]), rule(2, "Second", &[monitored])];

    let outcome = generate(&rules, &catalog, &HashSet::new(), Utc::now());

    let order: Vec<(String, MediaKind, u64)> = outcome
        .suggestions
        .iter()
        .map(|s| (s.rule_name.clone(), s.media_type, s.media_id))
        .collect();
    assert_eq!(
        order,
        vec![
            ("First".to_string(), MediaKind::Movie, 1),
            ("First".to_string(), MediaKind::Movie, 2),
            ("First".to_string(), MediaKind::Series, 1),
            ("Second".to_string(), MediaKind::Movie, 1),
            ("Second".to_string(), MediaKind::Movie, 2),
            ("Second".to_string(), MediaKind::Series, 1),
        ]
    );
}

#[test]
fn test_apply_flags_limit_media_types() {
    let catalog = Catalog {
        movies: vec![movie(1, "A")],
        series: vec![series(1, "S")],
        episodes: vec![],
        ..Catalog::default()
    };
    let monitored = Condition::new(FieldName::Monitored, Operator::Equals, "true", ValueKind::Boolean);
    let mut movies_only = rule(1, "Movies", &[monitored]);
    movies_only.apply_to_series = false;

    let outcome = generate(&[movies_only], &catalog, &HashSet::new(), Utc::now());

    assert_eq!(outcome.suggestions.len(), 1);
    assert_eq!(outcome.suggestions[0].media_type, MediaKind::Movie);
}

#[test]
fn test_series_suggestion_uses_total_size() {
    let mut show = series(4, "The Wire");
    show.total_size = 9_000;
    let catalog = Catalog {
        movies: vec![],
        series: vec![show],
        episodes: vec![],
        ..Catalog::default()
    };
    let big = Condition::new(FieldName::TotalSize, Operator::Bigger, "1000", ValueKind::CustomNumber);

    let outcome = generate(&[rule(1, "Big", &[big])], &catalog, &HashSet::new(), Utc::now());

    assert_eq!(outcome.suggestions.len(), 1);
    assert_eq!(outcome.suggestions[0].size, 9_000);
    assert_eq!(outcome.suggestions[0].media_type, MediaKind::Series);
}

#[test]
fn test_dismissed_keys_are_suppressed() {
    let rules = vec![rule(1, "Big", &[size_over_zero()])];
    let catalog = catalog_with(vec![movie(1, "A"), movie(2, "B")]);
    let dismissed: HashSet<SuggestionKey> = [SuggestionKey {
        media_type: MediaKind::Movie,
        media_id: 1,
        rule_name: "Big".to_string(),
    }]
    .into_iter()
    .collect();

    let outcome = generate(&rules, &catalog, &dismissed, Utc::now());

    assert_eq!(outcome.suggestions.len(), 1);
    assert_eq!(outcome.suggestions[0].media_id, 2);
    assert_eq!(outcome.suppressed, 1);
}

#[test]
fn test_default_rules_against_a_stale_library() {
    let now = Utc::now();
    let mut stale = movie(1, "Stale");
    stale.set_watch_history(WatchHistory::from_events(vec![WatchEvent::new(
        "alice",
        now - Duration::days(200),
    )]));
    let mut fresh = movie(2, "Fresh");
    fresh.set_watch_history(WatchHistory::from_events(vec![WatchEvent::new(
        "alice",
        now - Duration::days(10),
    )]));
    let mut ignored = movie(3, "Ignored");
    ignored.requested_date = Some(now - Duration::days(120));
    ignored.requested_by = Some("bob".to_string());
    let mut popular = movie(4, "Popular");
    popular.set_watch_history(WatchHistory::from_events(vec![
        WatchEvent::new("alice", now - Duration::days(3)),
        WatchEvent::new("bob", now - Duration::days(2)),
        WatchEvent::new("carol", now - Duration::days(1)),
    ]));

    let outcome = generate(
        &default_rules(),
        &catalog_with(vec![stale, fresh, ignored, popular]),
        &HashSet::new(),
        now,
    );

    let hits: Vec<(&str, u64)> = outcome
        .suggestions
        .iter()
        .map(|s| (s.rule_name.as_str(), s.media_id))
        .collect();
    assert_eq!(
        hits,
        vec![
            ("Not Watched (180 days)", 1),
            ("Fully Watched (2+ people)", 4),
            ("Ignored Request (90 days)", 3),
        ]
    );
}
