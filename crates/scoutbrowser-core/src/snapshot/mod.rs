//! Snapshot engine: accessibility tree → filtered, ref-bearing, optionally
//! token-capped [`Snapshot`], plus diffing and serialization.

mod diff;
mod serialize;
mod tree;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use scoutbrowser_cdp::CdpClient;
use scoutbrowser_cdp::protocol::accessibility::GetFullAxTreeParams;
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub use diff::{SnapshotDiff, compute_diff};
pub use serialize::{estimate_tokens, serialize_diff, serialize_nodes};

use crate::error::CoreError;
use crate::refs::{ElementRefRegistry, RefAssignment};

/// Output serialization target for a snapshot or diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    /// One indented line per node.
    Text,
    /// One unindented line per node, with `*`/`-` focus/disabled markers.
    Compact,
    /// Pretty-printed JSON array of nodes.
    Json,
}

/// Which nodes survive filtering, beyond the always-applied baseline drop
/// (ignored nodes, structural roles, empty static text).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFilter {
    /// Only roles a user could interact with.
    Interactive,
    /// Only form-control-oriented roles.
    Forms,
    /// Everything that survives the baseline drop.
    None,
}

const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "textbox", "searchbox", "spinbutton", "checkbox", "radio", "combobox", "listbox", "option",
    "menuitem", "menuitemcheckbox", "menuitemradio", "tab", "slider", "switch",
];

const FORMS_ROLES: &[&str] =
    &["textbox", "searchbox", "spinbutton", "checkbox", "radio", "combobox", "listbox", "option", "button", "switch"];

const STRUCTURAL_ROLES: &[&str] = &["none", "generic", "InlineTextBox"];

/// A backend-node-addressed, ref-bearing accessibility element as it
/// appears in a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRef {
    /// The short stable handle (`"e0"`, `"e1"`, …) issued by the registry.
    pub r#ref: String,
    /// Backend DOM node id this ref addresses.
    pub backend_node_id: i32,
    /// Accessibility role.
    pub role: String,
    /// Accessible name, if any.
    pub name: Option<String>,
    /// Accessible value (form controls), if any.
    pub value: Option<String>,
    /// BFS depth from the accessibility tree root.
    pub depth: u32,
    /// Whether the element currently has focus.
    pub focused: bool,
    /// Whether the element is disabled.
    pub disabled: bool,
}

/// An immutable, point-in-time accessibility snapshot of one tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The tab this snapshot was captured from.
    pub tab_id: String,
    /// The tab's URL at capture time.
    pub url: String,
    /// The tab's title at capture time.
    pub title: String,
    /// Capture timestamp.
    pub timestamp: DateTime<Utc>,
    /// The surviving, ref-bearing nodes.
    pub nodes: Vec<ElementRef>,
    /// The format this snapshot was serialized in.
    pub format: SnapshotFormat,
    /// Estimated token cost of the serialized form.
    pub token_count: usize,
    /// Whether the node list was cut short by a token budget.
    pub truncated: bool,
}

/// Parameters controlling one [`SnapshotEngine::take_snapshot`] call.
pub struct SnapshotOptions {
    /// Output format (also drives the token estimator's divisor).
    pub format: SnapshotFormat,
    /// Which nodes survive filtering.
    pub filter: SnapshotFilter,
    /// Token budget; `0` (or unset) means unlimited.
    pub max_tokens: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self { format: SnapshotFormat::Compact, filter: SnapshotFilter::Interactive, max_tokens: 0 }
    }
}

/// Holds the element ref registry and the most recent snapshot per tab.
pub struct SnapshotEngine {
    registry: Arc<ElementRefRegistry>,
    last_snapshot: Mutex<HashMap<String, Snapshot>>,
}

impl Default for SnapshotEngine {
    fn default() -> Self {
        Self::new(Arc::new(ElementRefRegistry::new()))
    }
}

impl SnapshotEngine {
    /// Build an engine over a shared registry (shared so the Supervisor and
    /// Watcher subsystem address the same ref space).
    #[must_use]
    pub fn new(registry: Arc<ElementRefRegistry>) -> Self {
        Self { registry, last_snapshot: Mutex::new(HashMap::new()) }
    }

    /// The most recently captured snapshot for a tab, if any. Always
    /// reflects the latest successful `take_snapshot` call, including ones
    /// made purely to compute a diff.
    #[must_use]
    pub fn last_snapshot(&self, tab_id: &str) -> Option<Snapshot> {
        self.last_snapshot.lock().get(tab_id).cloned()
    }

    /// Capture a fresh snapshot of `tab_id` through `client`, filter it,
    /// assign refs, and token-cap it. Always overwrites the engine's
    /// last-snapshot cache for this tab, even when the caller only wanted
    /// a diff.
    #[instrument(level = "debug", skip(self, client, url, title))]
    pub async fn take_snapshot(
        &self,
        client: &CdpClient,
        tab_id: &str,
        url: String,
        title: String,
        session_id: Option<&str>,
        options: &SnapshotOptions,
    ) -> Result<Snapshot, CoreError> {
        let raw: scoutbrowser_cdp::protocol::accessibility::GetFullAxTreeResult = client
            .send("Accessibility.getFullAXTree", Some(GetFullAxTreeParams::default()), session_id)
            .await?;

        let parsed = tree::parse_ax_tree(raw.nodes);
        let filtered: Vec<_> = parsed.into_iter().filter(|n| survives_baseline(n)).filter(|n| survives_filter(n, options.filter)).collect();

        let assignments: Vec<RefAssignment> = filtered
            .iter()
            .map(|n| RefAssignment {
                backend_node_id: n.backend_node_id.unwrap_or_default(),
                role: n.role.clone(),
                name: n.name.clone(),
                depth: n.depth,
                focused: n.focused,
                disabled: n.disabled,
            })
            .collect();
        let issued = self.registry.assign_refs(tab_id, &assignments);

        let all_nodes: Vec<ElementRef> = issued
            .into_iter()
            .zip(filtered.iter())
            .map(|(info, raw_node)| ElementRef {
                r#ref: info.r#ref,
                backend_node_id: info.backend_node_id,
                role: info.role,
                name: info.name,
                value: raw_node.value.clone(),
                depth: info.depth,
                focused: info.focused,
                disabled: info.disabled,
            })
            .collect();

        let (nodes, truncated, token_count) = cap_to_token_budget(all_nodes, options.max_tokens, options.format);

        let snapshot = Snapshot {
            tab_id: tab_id.to_string(),
            url,
            title,
            timestamp: Utc::now(),
            nodes,
            format: options.format,
            token_count,
            truncated,
        };

        self.last_snapshot.lock().insert(tab_id.to_string(), snapshot.clone());
        Ok(snapshot)
    }

    /// Compute the diff of a freshly captured snapshot of `tab_id` against
    /// `baseline`. Capturing still updates the engine's last-snapshot
    /// cache for the tab (see [`Self::take_snapshot`]).
    pub async fn check_for_changes(
        &self,
        client: &CdpClient,
        tab_id: &str,
        url: String,
        title: String,
        session_id: Option<&str>,
        options: &SnapshotOptions,
        baseline: &Snapshot,
    ) -> Result<SnapshotDiff, CoreError> {
        let current = self.take_snapshot(client, tab_id, url, title, session_id, options).await?;
        Ok(diff::compute_diff(baseline, &current))
    }
}

fn survives_baseline(node: &tree::AxNode) -> bool {
    if node.ignored {
        return false;
    }
    if STRUCTURAL_ROLES.contains(&node.role.as_str()) {
        return false;
    }
    if node.role == "StaticText" && node.name.as_deref().unwrap_or("").is_empty() && node.value.as_deref().unwrap_or("").is_empty() {
        return false;
    }
    true
}

fn survives_filter(node: &tree::AxNode, filter: SnapshotFilter) -> bool {
    match filter {
        SnapshotFilter::Interactive => INTERACTIVE_ROLES.contains(&node.role.as_str()),
        SnapshotFilter::Forms => FORMS_ROLES.contains(&node.role.as_str()),
        SnapshotFilter::None => true,
    }
}

fn cap_to_token_budget(nodes: Vec<ElementRef>, max_tokens: usize, format: SnapshotFormat) -> (Vec<ElementRef>, bool, usize) {
    if max_tokens == 0 {
        let rendered = serialize_nodes(&nodes, format, false);
        let tokens = estimate_tokens(&rendered, format);
        return (nodes, false, tokens);
    }

    let mut accepted = Vec::new();
    let mut running = 0usize;
    let mut truncated = false;

    for node in nodes {
        let node_tokens = estimate_tokens(&serialize::render_node(&node, format), format);
        if running + node_tokens > max_tokens {
            truncated = true;
            break;
        }
        running += node_tokens;
        accepted.push(node);
    }

    if truncated {
        let marker_tokens = estimate_tokens("[truncated]", format);
        running += marker_tokens;
    }

    (accepted, truncated, running)
}
