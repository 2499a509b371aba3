use super::*;

#[test]
fn deserializes_message_added_event() {
    let json = serde_json::json!({
        "message": {
            "source": "console-api",
            "level": "log",
            "text": "hello",
            "url": "https://example.com",
            "line": 3,
            "column": 1
        }
    });
    let event: MessageAddedEvent = serde_json::from_value(json).unwrap();
    assert_eq!(event.message.text, "hello");
    assert_eq!(event.message.level, "log");
}
