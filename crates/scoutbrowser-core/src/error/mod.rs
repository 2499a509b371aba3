//! Crate-level structured error type.

use thiserror::Error;

use scoutbrowser_cdp::CdpError;

/// Errors produced by the browser automation core.
///
/// Each variant carries a stable machine-readable `code()` and a
/// `retryable()` classification derived purely from the variant — neither
/// is ever stored as a separate field, so the two stay in lockstep with the
/// error that produced them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A CDP wire/connection failure propagated from `scoutbrowser-cdp`.
    #[error("CDP error: {0}")]
    Cdp(#[from] CdpError),

    /// An operation requiring a running browser was attempted while the
    /// supervisor reports no browser is up.
    #[error("browser is not running")]
    BrowserNotRunning,

    /// The browser process could not be launched, stopped, or otherwise
    /// managed.
    #[error("browser error: {0}")]
    BrowserError(String),

    /// A lookup by element ref found no matching entry in the registry.
    #[error("element ref not found: {0}")]
    ElementNotFound(String),

    /// No Chromium/Chrome binary could be resolved.
    #[error("chrome binary not found")]
    ChromeNotFound,

    /// A watcher operation failed (unknown id, invalid interval, page
    /// resolution failure, persistence failure).
    #[error("watcher error: {0}")]
    WatcherError(String),

    /// A new watcher was rejected because the registry is at capacity.
    #[error("watcher limit exceeded")]
    WatcherLimitExceeded,
}

impl CoreError {
    /// Stable machine-readable error code, matching the constants external
    /// callers key their handling off of.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cdp(_) => "CDP_ERROR",
            Self::BrowserNotRunning => "BROWSER_NOT_RUNNING",
            Self::BrowserError(_) => "BROWSER_ERROR",
            Self::ElementNotFound(_) => "ELEMENT_NOT_FOUND",
            Self::ChromeNotFound => "CHROME_NOT_FOUND",
            Self::WatcherError(_) => "WATCHER_ERROR",
            Self::WatcherLimitExceeded => "WATCHER_LIMIT_EXCEEDED",
        }
    }

    /// Whether a caller may reasonably retry the operation that produced
    /// this error without changing its inputs.
    #[must_use]
    pub fn retryable(&self) -> bool {
        match self {
            Self::Cdp(CdpError::Timeout(_) | CdpError::ConnectionTimeout(_) | CdpError::ConnectionLost) => true,
            Self::Cdp(_)
            | Self::BrowserNotRunning
            | Self::BrowserError(_)
            | Self::ElementNotFound(_)
            | Self::ChromeNotFound
            | Self::WatcherError(_)
            | Self::WatcherLimitExceeded => false,
        }
    }
}

/// Error code surfaced when the supervisor fails to stop a running daemon
/// process after escalating through its kill sequence.
pub const BROWSER_DAEMON_STOP_FAILED: &str = "BROWSER_DAEMON_STOP_FAILED";

/// Error code surfaced when a headed launch attempt fails.
pub const BROWSER_LAUNCH_HEADED_FAILED: &str = "BROWSER_LAUNCH_HEADED_FAILED";

/// Error code surfaced when a screenshot capture fails.
pub const SCREENSHOT_FAILED: &str = "SCREENSHOT_FAILED";

#[cfg(test)]
mod tests;
