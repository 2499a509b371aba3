//! Element ref registry.
//!
//! Maps short, stable per-process handles (`e0`, `e1`, …) to the CDP backend
//! node id they address. The issuing counter is global to the registry, not
//! per tab: it never resets, even when a tab is cleared, so a ref is never
//! reused within the process's lifetime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Metadata stored for one issued ref.
#[derive(Debug, Clone, PartialEq)]
pub struct RefInfo {
    /// The ref string (`"e<n>"`) this metadata belongs to.
    pub r#ref: String,
    /// Backend DOM node id the ref addresses.
    pub backend_node_id: i32,
    /// Accessibility role at the time the ref was issued.
    pub role: String,
    /// Accessible name at the time the ref was issued, if any.
    pub name: Option<String>,
    /// Depth from the accessibility tree root at issue time.
    pub depth: u32,
    /// Whether the node was focused at issue time.
    pub focused: bool,
    /// Whether the node was disabled at issue time.
    pub disabled: bool,
}

/// A minimal description of a node a caller wants refs assigned to.
///
/// Mirrors the fields [`RefInfo`] stores, minus the ref itself, which the
/// registry assigns.
#[derive(Debug, Clone)]
pub struct RefAssignment {
    /// Backend DOM node id.
    pub backend_node_id: i32,
    /// Accessibility role.
    pub role: String,
    /// Accessible name, if any.
    pub name: Option<String>,
    /// Depth from the accessibility tree root.
    pub depth: u32,
    /// Whether the node is focused.
    pub focused: bool,
    /// Whether the node is disabled.
    pub disabled: bool,
}

#[derive(Default)]
struct TabState {
    by_ref: HashMap<String, RefInfo>,
}

/// Per-tab mapping from issued refs to backend node ids.
///
/// The counter backing ref generation is global: `clear_tab` drops a tab's
/// entries but never rewinds it, so refs are globally monotonic and never
/// reused across tabs or across a tab's own clears.
pub struct ElementRefRegistry {
    next_id: AtomicU64,
    tabs: Mutex<HashMap<String, TabState>>,
}

impl Default for ElementRefRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementRefRegistry {
    /// Create an empty registry with its counter starting at zero (`e0` is
    /// the first ref ever issued).
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            tabs: Mutex::new(HashMap::new()),
        }
    }

    /// Issue refs for `nodes`, in input order, storing them under `tab_id`.
    /// Returns the assigned [`RefInfo`] values in the same order as `nodes`.
    pub fn assign_refs(&self, tab_id: &str, nodes: &[RefAssignment]) -> Vec<RefInfo> {
        let mut tabs = self.tabs.lock();
        let tab = tabs.entry(tab_id.to_string()).or_default();

        nodes
            .iter()
            .map(|node| {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let info = RefInfo {
                    r#ref: format!("e{id}"),
                    backend_node_id: node.backend_node_id,
                    role: node.role.clone(),
                    name: node.name.clone(),
                    depth: node.depth,
                    focused: node.focused,
                    disabled: node.disabled,
                };
                tab.by_ref.insert(info.r#ref.clone(), info.clone());
                info
            })
            .collect()
    }

    /// Look up the backend node id a ref addresses within `tab_id`.
    #[must_use]
    pub fn lookup_ref(&self, tab_id: &str, r#ref: &str) -> Option<i32> {
        self.lookup_ref_info(tab_id, r#ref).map(|info| info.backend_node_id)
    }

    /// Look up the full metadata stored for a ref within `tab_id`.
    #[must_use]
    pub fn lookup_ref_info(&self, tab_id: &str, r#ref: &str) -> Option<RefInfo> {
        self.tabs.lock().get(tab_id)?.by_ref.get(r#ref).cloned()
    }

    /// Drop all refs issued for `tab_id`. The global counter is untouched,
    /// so refs issued before the clear are never reissued to a new node.
    pub fn clear_tab(&self, tab_id: &str) {
        self.tabs.lock().remove(tab_id);
    }

    /// Test-only: reset the registry to a blank state, including the
    /// counter. Production code must never call this — refs issued before
    /// a reset would collide with refs issued after it.
    #[cfg(test)]
    pub fn reset_for_tests(&self) {
        self.next_id.store(0, Ordering::SeqCst);
        self.tabs.lock().clear();
    }
}

#[cfg(test)]
mod tests;
