use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::*;

struct RecordingSink {
    conversation: Option<ConversationSummary>,
    appended: Mutex<Vec<(ConversationId, String)>>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn most_recent_conversation(&self) -> Option<ConversationSummary> {
        self.conversation.clone()
    }

    async fn append_system_message(&self, conversation: &ConversationId, text: &str) {
        self.appended.lock().unwrap().push((conversation.clone(), text.to_string()));
    }
}

fn diff(added: &[&str], changed: &[&str], removed: &[&str]) -> WatcherDiff {
    WatcherDiff {
        added: added.iter().map(ToString::to_string).collect(),
        changed: changed.iter().map(ToString::to_string).collect(),
        removed: removed.iter().map(ToString::to_string).collect(),
        has_changes: !added.is_empty() || !changed.is_empty() || !removed.is_empty(),
        timestamp: Utc::now(),
    }
}

#[test]
fn message_includes_header_fields_and_nonempty_sections_only() {
    let d = diff(&["e4:button \"New\""], &[], &["e3:link \"Docs\""]);
    let message = format_notification_message("watcher-001", "https://example.com", &d);
    assert!(message.contains("watcher-001"));
    assert!(message.contains("https://example.com"));
    assert!(message.contains("Added: e4:button \"New\""));
    assert!(message.contains("Removed: e3:link \"Docs\""));
    assert!(!message.contains("Changed: "));
}

#[test]
fn message_body_truncates_past_500_chars_with_marker() {
    let long_label = "e0:button \"".to_string() + &"x".repeat(600) + "\"";
    let d = diff(&[long_label.as_str()], &[], &[]);
    let message = format_notification_message("watcher-001", "https://example.com", &d);
    assert!(message.ends_with("[...truncated]"));
}

#[tokio::test]
async fn notification_is_dropped_when_no_conversation_exists() {
    let sink = RecordingSink { conversation: None, appended: Mutex::new(Vec::new()) };
    let d = diff(&["e4:button \"New\""], &[], &[]);
    send_watcher_notification(&sink, "watcher-001", "https://example.com", &d).await.unwrap();
    assert!(sink.appended.lock().unwrap().is_empty());
}

#[tokio::test]
async fn notification_appends_to_the_most_recent_conversation() {
    let sink = RecordingSink {
        conversation: Some(ConversationSummary { id: "conv-1".to_string() }),
        appended: Mutex::new(Vec::new()),
    };
    let d = diff(&["e4:button \"New\""], &[], &[]);
    send_watcher_notification(&sink, "watcher-001", "https://example.com", &d).await.unwrap();

    let appended = sink.appended.lock().unwrap();
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0].0, "conv-1");
}
