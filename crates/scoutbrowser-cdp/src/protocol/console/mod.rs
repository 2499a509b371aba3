//! Console domain types.
//!
//! The deprecated Console domain exposes the single `messageAdded` event the
//! debug event buffer records; console message capture in modern Chromium
//! is otherwise driven through `Runtime.consoleAPICalled`, but this core
//! follows the original spec's §6 consumed-event list exactly.

use serde::{Deserialize, Serialize};

/// Parameters for `Console.enable` (no fields).
#[derive(Debug, Clone, Serialize, Default)]
pub struct EnableParams {}

/// A console message as carried by `Console.messageAdded`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleMessage {
    /// Message source.
    pub source: String,
    /// Message severity.
    pub level: String,
    /// Message text.
    pub text: String,
    /// URL of the message origin.
    #[serde(default)]
    pub url: Option<String>,
    /// Line number in the resource that generated this message.
    #[serde(default)]
    pub line: Option<i32>,
    /// Column number in the resource that generated this message.
    #[serde(default)]
    pub column: Option<i32>,
}

/// Event: `Console.messageAdded`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageAddedEvent {
    /// The console message that was added.
    pub message: ConsoleMessage,
}

#[cfg(test)]
mod tests;
