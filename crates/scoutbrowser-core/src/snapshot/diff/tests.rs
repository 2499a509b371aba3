use chrono::Utc;

use super::*;
use crate::snapshot::SnapshotFormat;

fn node(r#ref: &str, backend_node_id: i32, role: &str, name: &str, value: Option<&str>, focused: bool, disabled: bool) -> ElementRef {
    ElementRef {
        r#ref: r#ref.to_string(),
        backend_node_id,
        role: role.to_string(),
        name: Some(name.to_string()),
        value: value.map(ToString::to_string),
        depth: 0,
        focused,
        disabled,
    }
}

fn snapshot(nodes: Vec<ElementRef>) -> Snapshot {
    Snapshot {
        tab_id: "tab-1".to_string(),
        url: "https://example.com".to_string(),
        title: "Example".to_string(),
        timestamp: Utc::now(),
        nodes,
        format: SnapshotFormat::Compact,
        token_count: 0,
        truncated: false,
    }
}

#[test]
fn identical_snapshots_produce_an_empty_diff() {
    let nodes = vec![node("e0", 1, "button", "Save", None, false, false), node("e1", 2, "textbox", "Email", Some(""), false, false)];
    let a = snapshot(nodes.clone());
    let b = snapshot(nodes);

    let diff = compute_diff(&a, &b);
    assert!(!diff.has_changes());
    assert!(diff.added.is_empty());
    assert!(diff.changed.is_empty());
    assert!(diff.removed.is_empty());
}

#[test]
fn added_and_removed_and_unchanged_counts_are_consistent() {
    let prev = snapshot(vec![
        node("e0", 1, "button", "Save", None, false, false),
        node("e1", 2, "link", "Docs", None, false, false),
    ]);
    let current = snapshot(vec![
        node("e0", 1, "button", "Save", None, false, false),
        node("e2", 3, "button", "New", None, false, false),
    ]);

    let diff = compute_diff(&prev, &current);
    assert_eq!(diff.added.len(), 1);
    assert_eq!(diff.added[0].name.as_deref(), Some("New"));
    assert_eq!(diff.removed.len(), 1);
    assert_eq!(diff.removed[0].name.as_deref(), Some("Docs"));
    assert!(diff.changed.is_empty());

    let unchanged = current.nodes.len() - diff.added.len();
    assert_eq!(diff.added.len() + unchanged, current.nodes.len());
    let unchanged_prev = prev.nodes.len() - diff.removed.len();
    assert_eq!(diff.removed.len() + unchanged_prev, prev.nodes.len());
}

#[test]
fn value_focus_and_disabled_changes_are_detected() {
    let prev = snapshot(vec![
        node("e0", 1, "textbox", "Email", Some(""), false, false),
        node("e1", 2, "button", "Submit", None, false, true),
    ]);
    let current = snapshot(vec![
        node("e0", 5, "textbox", "Email", Some("a@b.com"), true, false),
        node("e1", 6, "button", "Submit", None, false, false),
    ]);

    let diff = compute_diff(&prev, &current);
    assert_eq!(diff.changed.len(), 2);
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
}

#[test]
fn save_email_docs_new_scenario() {
    let prev = snapshot(vec![
        node("e0", 1, "button", "Save", None, false, false),
        node("e1", 2, "textbox", "Email", Some(""), false, false),
        node("e2", 3, "link", "Docs", None, false, false),
    ]);
    let current = snapshot(vec![
        node("e0", 1, "button", "Save", None, false, false),
        node("e1", 2, "textbox", "Email", Some("user@example.com"), true, false),
        node("e3", 4, "button", "New", None, false, false),
    ]);

    let diff = compute_diff(&prev, &current);
    assert_eq!(diff.added.len(), 1);
    assert_eq!(diff.added[0].name.as_deref(), Some("New"));
    assert_eq!(diff.changed.len(), 1);
    assert_eq!(diff.changed[0].name.as_deref(), Some("Email"));
    assert_eq!(diff.removed.len(), 1);
    assert_eq!(diff.removed[0].name.as_deref(), Some("Docs"));
    assert!(diff.has_changes());
}
