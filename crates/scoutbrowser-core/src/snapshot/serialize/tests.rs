use super::*;
use crate::snapshot::diff::SnapshotDiff;

fn node(r#ref: &str, role: &str, name: Option<&str>, focused: bool, disabled: bool) -> ElementRef {
    ElementRef {
        r#ref: r#ref.to_string(),
        backend_node_id: 1,
        role: role.to_string(),
        name: name.map(ToString::to_string),
        value: None,
        depth: 1,
        focused,
        disabled,
    }
}

#[test]
fn text_format_indents_by_depth_and_brackets_flags() {
    let nodes = vec![node("e0", "button", Some("Save"), true, false), node("e1", "textbox", Some("Email"), false, true)];
    let rendered = serialize_nodes(&nodes, SnapshotFormat::Text, false);
    assert_eq!(rendered, "  e0:button \"Save\" [focused]\n  e1:textbox \"Email\" [disabled]");
}

#[test]
fn compact_format_uses_star_and_dash_suffixes() {
    let nodes = vec![node("e0", "button", Some("Save"), true, false)];
    let rendered = serialize_nodes(&nodes, SnapshotFormat::Compact, false);
    assert_eq!(rendered, "e0:button \"Save\" *");
}

#[test]
fn json_format_round_trips_through_serde() {
    let nodes = vec![node("e0", "button", Some("Save"), false, false)];
    let rendered = serialize_nodes(&nodes, SnapshotFormat::Json, false);
    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed[0]["ref"], "e0");
    assert_eq!(parsed[0]["role"], "button");
}

#[test]
fn truncation_marker_appends_after_a_non_empty_body() {
    let nodes = vec![node("e0", "button", Some("Save"), false, false)];
    let rendered = serialize_nodes(&nodes, SnapshotFormat::Compact, true);
    assert_eq!(rendered, "e0:button \"Save\"\n[truncated]");
}

#[test]
fn truncation_marker_stands_alone_for_an_empty_body() {
    let rendered = serialize_nodes(&[], SnapshotFormat::Compact, true);
    assert_eq!(rendered, "[truncated]");
}

#[test]
fn diff_serializes_as_pretty_json() {
    let diff = SnapshotDiff { added: vec![node("e2", "button", Some("New"), false, false)], changed: vec![], removed: vec![] };
    let rendered = serialize_diff(&diff, SnapshotFormat::Json);
    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed["added"][0]["name"], "New");
    assert!(parsed["changed"].as_array().unwrap().is_empty());
}

#[test]
fn diff_serializes_as_sectioned_text_with_none_placeholders() {
    let diff = SnapshotDiff { added: vec![node("e2", "button", Some("New"), false, false)], changed: vec![], removed: vec![] };
    let rendered = serialize_diff(&diff, SnapshotFormat::Compact);
    assert_eq!(rendered, "added:\n+e2:button \"New\"\nchanged:\n(none)\nremoved:\n(none)");
}

#[test]
fn estimate_tokens_divides_by_format_specific_divisor_rounding_up() {
    assert_eq!(estimate_tokens("abc", SnapshotFormat::Json), 1);
    assert_eq!(estimate_tokens("abcd", SnapshotFormat::Json), 2);
    assert_eq!(estimate_tokens("abcd", SnapshotFormat::Text), 1);
    assert_eq!(estimate_tokens("abcde", SnapshotFormat::Text), 2);
}
