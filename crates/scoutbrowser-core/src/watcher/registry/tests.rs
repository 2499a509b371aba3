use super::*;
use crate::watcher::WatcherStatus;

fn hydrated_state(id: &str) -> WatcherState {
    WatcherState {
        config: WatcherConfig {
            id: id.to_string(),
            url: "https://example.com".to_string(),
            interval_seconds: 120,
            format: SnapshotFormat::Compact,
            filter: SnapshotFilter::Interactive,
            max_tokens: 2000,
            created_at: Utc::now(),
        },
        status: WatcherStatus::Active,
        baseline_snapshot: None,
        last_diff: None,
        last_checked_at: None,
        last_error: None,
    }
}

#[test]
fn deserialize_replaces_the_map_and_lifts_the_id_counter_past_persisted_ids() {
    let mut registry = WatcherRegistry::new(10);
    registry.deserialize(vec![hydrated_state("watcher-007"), hydrated_state("watcher-003")]);

    assert_eq!(registry.list().len(), 2);
    assert!(registry.get("watcher-007").is_some());

    let next = registry.resolve_id("");
    assert_eq!(next, "watcher-008");
}

#[test]
fn resolve_id_returns_trimmed_caller_id_when_non_empty() {
    let registry = WatcherRegistry::new(10);
    assert_eq!(registry.resolve_id("  my-watcher  ".trim()), "my-watcher");
}

#[test]
fn resolve_id_skips_ids_already_taken() {
    let mut registry = WatcherRegistry::new(10);
    registry.deserialize(vec![hydrated_state("watcher-001")]);
    let generated = registry.resolve_id("");
    assert_ne!(generated, "watcher-001");
}

#[test]
fn remove_on_unknown_id_is_a_no_op() {
    let mut registry = WatcherRegistry::new(10);
    registry.remove("does-not-exist");
    assert!(registry.list().is_empty());
}

#[test]
fn resolve_interval_defaults_non_finite_and_non_positive_to_300() {
    assert_eq!(resolve_interval(None).unwrap(), DEFAULT_INTERVAL_SECONDS);
    assert_eq!(resolve_interval(Some(f64::NAN)).unwrap(), DEFAULT_INTERVAL_SECONDS);
    assert_eq!(resolve_interval(Some(-5.0)).unwrap(), DEFAULT_INTERVAL_SECONDS);
    assert_eq!(resolve_interval(Some(0.0)).unwrap(), DEFAULT_INTERVAL_SECONDS);
}

#[test]
fn resolve_interval_rejects_sub_minute_and_non_integer_values() {
    assert!(resolve_interval(Some(59.0)).is_err());
    assert!(resolve_interval(Some(60.5)).is_err());
    assert!(resolve_interval(Some(60.0)).is_ok());
}

#[test]
fn parse_generated_id_accepts_only_the_watcher_prefix_form() {
    assert_eq!(parse_generated_id("watcher-012"), Some(12));
    assert_eq!(parse_generated_id("watcher-abc"), None);
    assert_eq!(parse_generated_id("other-012"), None);
}

#[test]
fn capacity_limit_is_enforced_before_any_baseline_attempt() {
    let mut registry = WatcherRegistry::new(1);
    registry.deserialize(vec![hydrated_state("watcher-001")]);
    assert_eq!(registry.watchers.len(), registry.capacity);
}
