//! CDP client error types.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by the CDP transport, connection lifecycle, endpoint
/// discovery, and browser process launch.
#[derive(Debug, Error)]
pub enum CdpError {
    /// The WebSocket connection could not be established.
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    /// The WebSocket connection was lost (closed or errored mid-flight).
    #[error("WebSocket connection lost")]
    ConnectionLost,

    /// A message could not be handed to the transport task.
    #[error("failed to send CDP message: {0}")]
    SendFailed(String),

    /// The browser returned a JSON-RPC error for a command.
    #[error("CDP protocol error {code}: {message}")]
    Protocol {
        /// CDP error code.
        code: i64,
        /// CDP error message.
        message: String,
    },

    /// No response arrived before the command deadline.
    #[error("response timeout after {0:?}")]
    Timeout(Duration),

    /// A response arrived carrying an id that did not match the awaited one.
    #[error("invalid message ID: expected {expected}, got {got}")]
    InvalidMessageId {
        /// Id the caller was waiting on.
        expected: u64,
        /// Id actually observed.
        got: u64,
    },

    /// The configured or discovered WebSocket URL was not a valid URL.
    #[error("invalid WebSocket URL: {0}")]
    InvalidUrl(String),

    /// A command referenced a CDP session id unknown to the client.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The Chromium child process could not be spawned.
    #[error("failed to spawn browser process: {0}")]
    SpawnFailed(String),

    /// The browser's stderr stream closed before a debugger URL appeared.
    #[error("failed to get debugging URL from browser")]
    NoDebuggingUrl,

    /// No Chromium binary could be located.
    #[error(
        "Chromium not found. Set CHROMIUM_PATH environment variable or ensure Chromium is installed."
    )]
    ChromiumNotFound,

    /// The browser did not become reachable within the launch window.
    #[error("browser launch timeout after {0:?}")]
    LaunchTimeout(Duration),

    /// The endpoint URL passed to discovery was malformed or used an
    /// unsupported scheme.
    #[error("invalid endpoint URL: {0}")]
    InvalidEndpointUrl(String),

    /// The discovery HTTP request itself failed (not a timeout or connect
    /// failure, which have their own variants).
    #[error("HTTP request failed: {0}")]
    HttpRequestFailed(String),

    /// The discovery HTTP request exceeded its timeout.
    #[error("connection timed out after {0:?}")]
    ConnectionTimeout(Duration),

    /// Discovery reached the endpoint but could not extract a usable
    /// `webSocketDebuggerUrl`.
    #[error("failed to discover CDP endpoint at {url}: {reason}")]
    EndpointDiscoveryFailed {
        /// The endpoint URL that was queried.
        url: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// The reconnect protocol exhausted all attempts; the client is now
    /// permanently disconnected.
    #[error("disconnect and reconnect attempts were exhausted after {attempts} attempts: {last_error}")]
    ReconnectExhausted {
        /// Number of reconnect attempts made.
        attempts: u32,
        /// The error from the final attempt.
        last_error: String,
    },

    /// The client is permanently disconnected and will not accept further
    /// commands.
    #[error("client is permanently disconnected")]
    Disconnected,

    /// A value failed to serialize or deserialize.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => Self::ConnectionLost,
            other => Self::ConnectionFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests;
