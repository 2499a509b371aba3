//! Snapshot diffing.
//!
//! Nodes are keyed by `(role, name, backendNodeId)` — the original spec's
//! key — so a node is considered "the same element" across captures iff
//! all three match, and `changed` is computed purely from
//! `value`/`focused`/`disabled`.

use std::collections::HashMap;

use super::{ElementRef, Snapshot};

/// The result of comparing two snapshots of the same tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotDiff {
    /// Elements present in `current` but not `prev`.
    pub added: Vec<ElementRef>,
    /// Elements present in both, with `value`/`focused`/`disabled` changed.
    /// Entries carry the `current` snapshot's copy (fresh refs).
    pub changed: Vec<ElementRef>,
    /// Elements present in `prev` but not `current`. Entries carry the
    /// `prev` snapshot's copy (their refs are no longer valid).
    pub removed: Vec<ElementRef>,
}

impl SnapshotDiff {
    /// Whether any of the three categories is non-empty.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.changed.is_empty() || !self.removed.is_empty()
    }
}

type DiffKey = (String, String, i32);

fn key(node: &ElementRef) -> DiffKey {
    (node.role.clone(), node.name.clone().unwrap_or_default(), node.backend_node_id)
}

/// Compute the diff of `current` against `prev`.
#[must_use]
pub fn compute_diff(prev: &Snapshot, current: &Snapshot) -> SnapshotDiff {
    let prev_by_key: HashMap<DiffKey, &ElementRef> = prev.nodes.iter().map(|n| (key(n), n)).collect();
    let current_by_key: HashMap<DiffKey, &ElementRef> = current.nodes.iter().map(|n| (key(n), n)).collect();

    let mut diff = SnapshotDiff::default();

    for node in &current.nodes {
        match prev_by_key.get(&key(node)) {
            None => diff.added.push(node.clone()),
            Some(prev_node) => {
                if prev_node.value != node.value || prev_node.focused != node.focused || prev_node.disabled != node.disabled {
                    diff.changed.push(node.clone());
                }
            }
        }
    }

    for node in &prev.nodes {
        if !current_by_key.contains_key(&key(node)) {
            diff.removed.push(node.clone());
        }
    }

    diff
}

#[cfg(test)]
mod tests;
