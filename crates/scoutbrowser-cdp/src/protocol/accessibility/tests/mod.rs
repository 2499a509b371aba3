use super::*;

#[test]
fn deserializes_a_minimal_node() {
    let json = serde_json::json!({
        "nodeId": "1",
        "ignored": false,
        "role": {"type": "role", "value": "button"},
        "name": {"type": "computedString", "value": "Save"},
        "childIds": [],
        "backendDOMNodeId": 42
    });
    let node: AxNode = serde_json::from_value(json).unwrap();
    assert_eq!(node.node_id, "1");
    assert!(!node.ignored);
    assert_eq!(node.role.unwrap().value.unwrap(), "button");
    assert_eq!(node.backend_dom_node_id, Some(42));
}

#[test]
fn deserializes_full_tree_result() {
    let json = serde_json::json!({
        "nodes": [
            {"nodeId": "1", "ignored": true, "childIds": ["2"]},
            {"nodeId": "2", "ignored": false, "role": {"type": "role", "value": "link"}}
        ]
    });
    let result: GetFullAxTreeResult = serde_json::from_value(json).unwrap();
    assert_eq!(result.nodes.len(), 2);
    assert_eq!(result.nodes[0].child_ids.as_ref().unwrap(), &["2".to_string()]);
}

#[test]
fn get_full_ax_tree_params_omits_none_fields() {
    let params = GetFullAxTreeParams::default();
    let json = serde_json::to_value(&params).unwrap();
    assert_eq!(json, serde_json::json!({}));
}
