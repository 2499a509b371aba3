//! Raw CDP accessibility tree → internal, depth-annotated node list.
//!
//! Parsing follows the flat `nodeId`/`parentId`/`childIds` shape
//! `Accessibility.getFullAXTree` returns, adapted from the nested,
//! implicit-depth tree the secondary reference CLI's snapshot module
//! builds (`Nunley-Media-Group-chrome-cli/src/snapshot.rs`) to this
//! crate's flat `Vec<AxNode>` with an explicit BFS-computed `depth`.

use std::collections::{HashMap, HashSet, VecDeque};

use scoutbrowser_cdp::protocol::accessibility::AxNode as RawAxNode;

/// One node of the accessibility tree, after CDP's raw `AxValue` wrappers
/// have been unwrapped into plain strings/booleans and depth has been
/// computed from the detected root(s).
#[derive(Debug, Clone)]
pub struct AxNode {
    /// CDP accessibility node id (distinct from the backend DOM node id).
    pub node_id: String,
    /// Stable backend DOM node id; `None` for nodes CDP didn't resolve one
    /// for (rare, but the wire type allows it).
    pub backend_node_id: Option<i32>,
    /// Accessibility role.
    pub role: String,
    /// Accessible name, if any.
    pub name: Option<String>,
    /// Accessible value (form controls), if any.
    pub value: Option<String>,
    /// Accessible description, if any.
    pub description: Option<String>,
    /// Whether the node currently has focus.
    pub focused: bool,
    /// Whether the node is disabled.
    pub disabled: bool,
    /// Whether CDP marked this node ignored for accessibility purposes.
    pub ignored: bool,
    /// BFS depth from the detected root(s).
    pub depth: u32,
    /// Child node ids, as reported by CDP.
    pub child_ids: Vec<String>,
}

/// Parse the raw `Accessibility.getFullAXTree` node list into internal
/// nodes with BFS depth computed from the detected root set.
#[must_use]
pub fn parse_ax_tree(raw_nodes: Vec<RawAxNode>) -> Vec<AxNode> {
    // Capture wire order before the nodes are consumed into the map: `HashMap`
    // key iteration is randomized, and that order drives root selection,
    // the disconnected-fragment append below, and downstream token-cap
    // truncation, so it must match the order CDP returned the nodes in.
    let order: Vec<String> = raw_nodes.iter().map(|raw| raw.node_id.clone()).collect();

    let mut nodes: HashMap<String, AxNode> = raw_nodes
        .into_iter()
        .map(|raw| {
            let node = AxNode {
                node_id: raw.node_id.clone(),
                backend_node_id: raw.backend_dom_node_id,
                role: value_as_string(raw.role.as_ref()).unwrap_or_default(),
                name: value_as_string(raw.name.as_ref()),
                value: value_as_string(raw.value.as_ref()),
                description: value_as_string(raw.description.as_ref()),
                focused: bool_property(&raw.properties, "focused"),
                disabled: bool_property(&raw.properties, "disabled"),
                ignored: raw.ignored,
                depth: 0,
                child_ids: raw.child_ids.unwrap_or_default(),
            };
            (raw.node_id, node)
        })
        .collect();

    let referenced: HashSet<String> = nodes.values().flat_map(|n| n.child_ids.iter().cloned()).collect();

    let mut roots: Vec<String> = order.iter().filter(|id| !referenced.contains(*id)).cloned().collect();
    if roots.is_empty() {
        if let Some(first) = order.first() {
            roots.push(first.clone());
        }
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, u32)> = VecDeque::new();
    for root in &roots {
        if visited.insert(root.clone()) {
            queue.push_back((root.clone(), 0));
        }
    }

    let mut bfs_order: Vec<String> = Vec::new();
    while let Some((id, depth)) = queue.pop_front() {
        if let Some(node) = nodes.get_mut(&id) {
            node.depth = depth;
        }
        bfs_order.push(id.clone());
        if let Some(node) = nodes.get(&id) {
            for child_id in node.child_ids.clone() {
                if visited.insert(child_id.clone()) {
                    queue.push_back((child_id, depth + 1));
                }
            }
        }
    }

    // Any node unreachable from a detected root (disconnected fragment)
    // still appears in the snapshot, at depth 0, in its original order.
    for id in &order {
        if !visited.contains(id) {
            bfs_order.push(id.clone());
        }
    }

    bfs_order.into_iter().filter_map(|id| nodes.remove(&id)).collect()
}

fn value_as_string(value: Option<&scoutbrowser_cdp::protocol::accessibility::AxValue>) -> Option<String> {
    let value = value?;
    match value.value.as_ref()? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn bool_property(properties: &Option<Vec<scoutbrowser_cdp::protocol::accessibility::AxProperty>>, name: &str) -> bool {
    let Some(properties) = properties else { return false };
    properties
        .iter()
        .find(|p| p.name == name)
        .and_then(|p| p.value.value.as_ref())
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}
