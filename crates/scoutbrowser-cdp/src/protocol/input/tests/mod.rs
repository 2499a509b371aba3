use super::*;

#[test]
fn mouse_event_serializes_camel_case() {
    let params = DispatchMouseEventParams {
        event_type: MouseEventType::MousePressed,
        x: 10.0,
        y: 20.0,
        modifiers: None,
        button: Some(MouseButton::Left),
        click_count: Some(1),
    };
    let json = serde_json::to_value(&params).unwrap();
    assert_eq!(json["type"], "mousePressed");
    assert_eq!(json["button"], "left");
    assert_eq!(json.get("modifiers"), None);
}

#[test]
fn key_event_omits_unset_fields() {
    let params = DispatchKeyEventParams {
        event_type: Some(KeyEventType::Char),
        text: Some("a".into()),
        ..Default::default()
    };
    let json = serde_json::to_value(&params).unwrap();
    assert_eq!(json["type"], "char");
    assert_eq!(json["text"], "a");
    assert!(json.get("key").is_none());
}
