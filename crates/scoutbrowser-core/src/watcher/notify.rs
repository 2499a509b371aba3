//! Formats a watcher diff into a human-readable message and hands it to
//! the conversation-store notification sink (an external collaborator).

use async_trait::async_trait;
use tracing::warn;

use super::WatcherDiff;

const MAX_MESSAGE_LEN: usize = 500;
const TRUNCATION_MARKER: &str = "\n[...truncated]";

/// Opaque id for a conversation in the external conversation store.
pub type ConversationId = String;

/// The minimal fields this crate needs from a conversation listing.
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    /// The conversation's id.
    pub id: ConversationId,
}

/// The conversation-store notification sink. Production wiring lives
/// outside this core (per the original spec's Out-of-scope list); this
/// trait is only the boundary.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// The most recently updated conversation, if any exist.
    async fn most_recent_conversation(&self) -> Option<ConversationSummary>;
    /// Append a system-role message to a conversation.
    async fn append_system_message(&self, conversation: &ConversationId, text: &str);
}

/// Format a watcher diff into the notification body: watcher id,
/// ISO-8601 timestamp, URL, element counts, and non-empty
/// `Added:`/`Changed:`/`Removed:` section lines, truncated to 500 chars
/// with a trailing marker if longer.
#[must_use]
pub fn format_notification_message(watcher_id: &str, url: &str, diff: &WatcherDiff) -> String {
    let mut sections = Vec::new();
    if !diff.added.is_empty() {
        sections.push(format!("Added: {}", diff.added.join(", ")));
    }
    if !diff.changed.is_empty() {
        sections.push(format!("Changed: {}", diff.changed.join(", ")));
    }
    if !diff.removed.is_empty() {
        sections.push(format!("Removed: {}", diff.removed.join(", ")));
    }
    let body = sections.join("\n");

    let header = format!(
        "Watcher {watcher_id} detected changes at {url}\nTime: {}\nAdded: {} Changed: {} Removed: {}",
        diff.timestamp.to_rfc3339(),
        diff.added.len(),
        diff.changed.len(),
        diff.removed.len(),
    );

    let truncated_body = if body.len() > MAX_MESSAGE_LEN {
        let cut = body.char_indices().map(|(i, _)| i).take_while(|&i| i <= MAX_MESSAGE_LEN).last().unwrap_or(0);
        format!("{}{}", &body[..cut], TRUNCATION_MARKER)
    } else {
        body
    };

    format!("{header}\n\n{truncated_body}")
}

/// Deliver a watcher change notification: look up the most recently
/// updated conversation and append a system message to it. Logs a warning
/// and drops the notification if no conversation exists. Never surfaces
/// an error to its caller beyond a best-effort `Result` the caller may
/// ignore.
pub async fn send_watcher_notification(
    sink: &dyn NotificationSink,
    watcher_id: &str,
    url: &str,
    diff: &WatcherDiff,
) -> Result<(), String> {
    let Some(conversation) = sink.most_recent_conversation().await else {
        warn!(watcher_id, "no conversation available to notify; dropping watcher notification");
        return Ok(());
    };

    let message = format_notification_message(watcher_id, url, diff);
    sink.append_system_message(&conversation.id, &message).await;
    Ok(())
}

#[cfg(test)]
mod tests;
