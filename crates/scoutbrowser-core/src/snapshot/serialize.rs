//! Snapshot and diff serialization into the three wire formats the
//! original spec names: `text`, `compact`, `json`.

use super::diff::SnapshotDiff;
use super::{ElementRef, SnapshotFormat};

const TRUNCATED_MARKER: &str = "[truncated]";

/// Estimate the token cost of `text` once serialized in `format`. A
/// heuristic, not a real tokenizer: UTF-8 byte length divided by 3 for
/// `json`, by 4 for `text`/`compact`, rounded up. Do not change the
/// divisors without updating the truncation tests that pin them.
#[must_use]
pub fn estimate_tokens(text: &str, format: SnapshotFormat) -> usize {
    let divisor = match format {
        SnapshotFormat::Json => 3,
        SnapshotFormat::Text | SnapshotFormat::Compact => 4,
    };
    text.len().div_ceil(divisor)
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\\\""))
}

/// Serialize a single node as it would appear in `text` format, without
/// indentation — used both by the real `text` renderer and by the token
/// estimator, which measures one node's contribution at a time.
#[must_use]
pub fn render_text_node(node: &ElementRef) -> String {
    let mut line = format!("{}:{}", node.r#ref, node.role);
    if let Some(name) = &node.name {
        if !name.is_empty() {
            line.push(' ');
            line.push_str(&quote(name));
        }
    }
    if let Some(value) = &node.value {
        if !value.is_empty() {
            line.push_str(&format!(" val={}", quote(value)));
        }
    }
    if node.focused {
        line.push_str(" [focused]");
    }
    if node.disabled {
        line.push_str(" [disabled]");
    }
    line
}

/// Serialize a single node as it would appear in `compact` format:
/// identical fields to `text`, but focused/disabled collapse to trailing
/// `*`/`-` markers instead of bracketed words.
#[must_use]
pub fn render_compact_node(node: &ElementRef) -> String {
    let mut line = format!("{}:{}", node.r#ref, node.role);
    if let Some(name) = &node.name {
        if !name.is_empty() {
            line.push(' ');
            line.push_str(&quote(name));
        }
    }
    if let Some(value) = &node.value {
        if !value.is_empty() {
            line.push_str(&format!(" val={}", quote(value)));
        }
    }
    if node.focused {
        line.push_str(" *");
    }
    if node.disabled {
        line.push_str(" -");
    }
    line
}

/// Render one node in the target format (used by the token-cap loop, which
/// measures nodes one at a time regardless of final assembly).
#[must_use]
pub fn render_node(node: &ElementRef, format: SnapshotFormat) -> String {
    match format {
        SnapshotFormat::Text => render_text_node(node),
        SnapshotFormat::Compact => render_compact_node(node),
        SnapshotFormat::Json => serde_json::to_string(node).unwrap_or_default(),
    }
}

/// Serialize the full node list in `format`, appending the truncation
/// marker if `truncated`.
#[must_use]
pub fn serialize_nodes(nodes: &[ElementRef], format: SnapshotFormat, truncated: bool) -> String {
    let body = match format {
        SnapshotFormat::Text => nodes
            .iter()
            .map(|n| format!("{}{}", "  ".repeat(n.depth as usize), render_text_node(n)))
            .collect::<Vec<_>>()
            .join("\n"),
        SnapshotFormat::Compact => nodes.iter().map(render_compact_node).collect::<Vec<_>>().join("\n"),
        SnapshotFormat::Json => serde_json::to_string_pretty(nodes).unwrap_or_default(),
    };

    if truncated {
        if body.is_empty() { TRUNCATED_MARKER.to_string() } else { format!("{body}\n{TRUNCATED_MARKER}") }
    } else {
        body
    }
}

/// Serialize a diff either as pretty JSON of the three lists, or as three
/// labeled, prefix-marked sections.
#[must_use]
pub fn serialize_diff(diff: &SnapshotDiff, format: SnapshotFormat) -> String {
    if format == SnapshotFormat::Json {
        return serde_json::to_string_pretty(&DiffJson { added: &diff.added, changed: &diff.changed, removed: &diff.removed })
            .unwrap_or_default();
    }

    let render = |nodes: &[ElementRef], prefix: char| -> String {
        if nodes.is_empty() {
            "(none)".to_string()
        } else {
            nodes.iter().map(|n| format!("{prefix}{}", render_node(n, format))).collect::<Vec<_>>().join("\n")
        }
    };

    format!(
        "added:\n{}\nchanged:\n{}\nremoved:\n{}",
        render(&diff.added, '+'),
        render(&diff.changed, '~'),
        render(&diff.removed, '-'),
    )
}

#[derive(serde::Serialize)]
struct DiffJson<'a> {
    added: &'a [ElementRef],
    changed: &'a [ElementRef],
    removed: &'a [ElementRef],
}

#[cfg(test)]
mod tests;
