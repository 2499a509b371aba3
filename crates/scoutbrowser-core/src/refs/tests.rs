use serial_test::serial;

use super::*;

fn node(backend_node_id: i32, role: &str) -> RefAssignment {
    RefAssignment {
        backend_node_id,
        role: role.to_string(),
        name: None,
        depth: 0,
        focused: false,
        disabled: false,
    }
}

#[test]
#[serial]
fn refs_are_distinct_and_strictly_increasing() {
    let registry = ElementRefRegistry::new();
    registry.reset_for_tests();

    let first = registry.assign_refs("tab-1", &[node(1, "button"), node(2, "link")]);
    let second = registry.assign_refs("tab-1", &[node(3, "textbox")]);

    assert_eq!(first[0].r#ref, "e0");
    assert_eq!(first[1].r#ref, "e1");
    assert_eq!(second[0].r#ref, "e2");
}

#[test]
#[serial]
fn clear_tab_drops_mapping_but_not_counter() {
    let registry = ElementRefRegistry::new();
    registry.reset_for_tests();

    let assigned = registry.assign_refs("tab-1", &[node(1, "button")]);
    assert!(registry.lookup_ref("tab-1", &assigned[0].r#ref).is_some());

    registry.clear_tab("tab-1");
    assert!(registry.lookup_ref("tab-1", &assigned[0].r#ref).is_none());

    let next = registry.assign_refs("tab-1", &[node(2, "link")]);
    assert_eq!(next[0].r#ref, "e1", "counter must not reset on clear_tab");
}

#[test]
#[serial]
fn lookup_is_scoped_per_tab() {
    let registry = ElementRefRegistry::new();
    registry.reset_for_tests();

    let assigned = registry.assign_refs("tab-1", &[node(1, "button")]);
    assert!(registry.lookup_ref("tab-2", &assigned[0].r#ref).is_none());
    assert!(registry.lookup_ref("tab-1", &assigned[0].r#ref).is_some());
}

#[test]
#[serial]
fn lookup_ref_info_returns_full_metadata() {
    let registry = ElementRefRegistry::new();
    registry.reset_for_tests();

    let mut n = node(42, "checkbox");
    n.name = Some("Accept terms".to_string());
    n.focused = true;
    let assigned = registry.assign_refs("tab-1", std::slice::from_ref(&n));

    let info = registry.lookup_ref_info("tab-1", &assigned[0].r#ref).unwrap();
    assert_eq!(info.backend_node_id, 42);
    assert_eq!(info.role, "checkbox");
    assert_eq!(info.name.as_deref(), Some("Accept terms"));
    assert!(info.focused);
    assert!(!info.disabled);
}

#[test]
#[serial]
fn refs_never_reused_across_many_clears() {
    let registry = ElementRefRegistry::new();
    registry.reset_for_tests();

    let mut seen = std::collections::HashSet::new();
    for _ in 0..5 {
        let assigned = registry.assign_refs("tab-1", &[node(1, "button"), node(2, "link")]);
        for info in assigned {
            assert!(seen.insert(info.r#ref), "ref reused across clears");
        }
        registry.clear_tab("tab-1");
    }
}
