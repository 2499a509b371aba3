//! Accessibility domain types.
//!
//! The Accessibility domain exposes information about the accessibility tree.
//! This crate's teacher drives element discovery through JS-evaluated DOM
//! queries rather than the native accessibility tree, so this module has no
//! direct teacher precedent — it is authored from the CDP protocol
//! definition, shaped the way this crate's other protocol submodules are
//! (`rename_all = "camelCase"`, `skip_serializing_if` on optional params).

use serde::{Deserialize, Serialize};

use crate::protocol::dom::BackendNodeId;

/// Unique accessibility node identifier.
pub type AxNodeId = String;

/// Parameters for `Accessibility.getFullAXTree`.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetFullAxTreeParams {
    /// The maximum depth at which descendants of the root node should be
    /// retrieved. If omitted, the full tree is returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<i32>,
    /// The frame for whose document the AX tree should be retrieved. If
    /// omitted, the root frame is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
}

/// Result of `Accessibility.getFullAXTree`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFullAxTreeResult {
    /// The nodes of the full accessibility tree, flattened with parent/child
    /// references by id.
    pub nodes: Vec<AxNode>,
}

/// A value carried by an accessibility property or the node's name/value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxValue {
    /// The type of this value.
    #[serde(rename = "type")]
    pub value_type: String,
    /// The computed value of this property.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// A single accessibility property (e.g. `focused`, `disabled`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxProperty {
    /// The name of this property.
    pub name: String,
    /// The value of this property.
    pub value: AxValue,
}

/// A node in the accessibility tree, as returned raw by CDP.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxNode {
    /// Unique identifier for this node.
    pub node_id: AxNodeId,
    /// Whether this node is ignored for accessibility purposes.
    pub ignored: bool,
    /// This node's role.
    #[serde(default)]
    pub role: Option<AxValue>,
    /// This node's accessible name.
    #[serde(default)]
    pub name: Option<AxValue>,
    /// This node's accessible value (form controls).
    #[serde(default)]
    pub value: Option<AxValue>,
    /// This node's description.
    #[serde(default)]
    pub description: Option<AxValue>,
    /// Additional properties (focused, disabled, etc.), each a name/value pair.
    #[serde(default)]
    pub properties: Option<Vec<AxProperty>>,
    /// Ids of this node's child nodes, if any.
    #[serde(default)]
    pub child_ids: Option<Vec<AxNodeId>>,
    /// The backend DOM node id associated with this AX node.
    #[serde(default)]
    pub backend_dom_node_id: Option<BackendNodeId>,
    /// The id of the parent node, if the browser supplied it.
    #[serde(default)]
    pub parent_id: Option<AxNodeId>,
}

#[cfg(test)]
mod tests;
