//! Rolling in-memory capture of console, exception, and network events from
//! a single CDP session. Each category is a fixed-capacity FIFO buffer; the
//! buffer clears itself on `Page.frameNavigated`.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use scoutbrowser_cdp::CdpClient;
use scoutbrowser_cdp::protocol::{console, network, page, runtime};
use serde::Serialize;

/// Per-category buffer capacity. Oldest entry is evicted once a category
/// reaches this size.
const BUFFER_CAPACITY: usize = 100;

/// A captured console message.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleEntry {
    /// Message source (e.g. `"console-api"`, `"network"`).
    pub source: String,
    /// Message severity (e.g. `"log"`, `"warning"`, `"error"`).
    pub level: String,
    /// Message text.
    pub text: String,
    /// URL of the message origin, if any.
    pub url: Option<String>,
}

/// A captured unhandled exception.
#[derive(Debug, Clone, Serialize)]
pub struct ExceptionEntry {
    /// Exception message text.
    pub text: String,
    /// Exception timestamp, as reported by the browser.
    pub timestamp: f64,
    /// URL of the script that threw, if known.
    pub url: Option<String>,
    /// Line number within that script, if known.
    pub line_number: i64,
}

/// A captured network event: either a response or a load failure.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkEntry {
    /// CDP request identifier.
    pub request_id: String,
    /// Request URL. Absent for `loadingFailed` events, which carry no URL.
    pub url: Option<String>,
    /// HTTP status code, present only for completed responses.
    pub status: Option<i64>,
    /// Error text, present only for failed loads.
    pub error_text: Option<String>,
}

struct Buffers {
    console: VecDeque<ConsoleEntry>,
    exceptions: VecDeque<ExceptionEntry>,
    network: VecDeque<NetworkEntry>,
}

impl Buffers {
    fn new() -> Self {
        Self { console: VecDeque::new(), exceptions: VecDeque::new(), network: VecDeque::new() }
    }

    fn clear(&mut self) {
        self.console.clear();
        self.exceptions.clear();
        self.network.clear();
    }
}

fn push_capped<T>(buffer: &mut VecDeque<T>, entry: T) {
    if buffer.len() >= BUFFER_CAPACITY {
        buffer.pop_front();
    }
    buffer.push_back(entry);
}

/// Subscribes to console, exception, and network events on a session and
/// holds the last [`BUFFER_CAPACITY`] of each. Dropping the buffer without
/// calling [`DebugEventBuffer::unsubscribe`] leaves its handlers registered
/// on the client for its lifetime.
pub struct DebugEventBuffer {
    buffers: Arc<Mutex<Buffers>>,
    subscriptions: Vec<scoutbrowser_cdp::EventSubscription>,
}

impl DebugEventBuffer {
    /// Enable the `Console`, `Runtime`, `Network`, and `Page` domains on
    /// `session_id` and start recording their events.
    pub async fn attach(client: &CdpClient, session_id: &str) -> Result<Self, scoutbrowser_cdp::CdpError> {
        let _: serde_json::Value =
            client.send("Console.enable", Some(console::EnableParams {}), Some(session_id)).await?;
        let _: serde_json::Value =
            client.send("Runtime.enable", Some(runtime::EnableParams {}), Some(session_id)).await?;
        let _: serde_json::Value =
            client.send("Network.enable", Some(network::EnableParams::default()), Some(session_id)).await?;
        let _: serde_json::Value = client.send("Page.enable", Some(page::EnableParams {}), Some(session_id)).await?;

        let buffers = Arc::new(Mutex::new(Buffers::new()));
        let mut subscriptions = Vec::with_capacity(5);

        let console_buffers = buffers.clone();
        subscriptions.push(client.on("Console.messageAdded", move |event| {
            let Some(params) = event.params.clone() else { return };
            let Ok(event) = serde_json::from_value::<console::MessageAddedEvent>(params) else { return };
            push_capped(
                &mut console_buffers.lock().console,
                ConsoleEntry {
                    source: event.message.source,
                    level: event.message.level,
                    text: event.message.text,
                    url: event.message.url,
                },
            );
        }));

        let exception_buffers = buffers.clone();
        subscriptions.push(client.on("Runtime.exceptionThrown", move |event| {
            let Some(params) = event.params.clone() else { return };
            let Ok(event) = serde_json::from_value::<runtime::ExceptionThrownEvent>(params) else { return };
            let details = event.exception_details;
            push_capped(
                &mut exception_buffers.lock().exceptions,
                ExceptionEntry {
                    text: details.text,
                    timestamp: event.timestamp,
                    url: details.url,
                    line_number: details.line_number,
                },
            );
        }));

        let response_buffers = buffers.clone();
        subscriptions.push(client.on("Network.responseReceived", move |event| {
            let Some(params) = event.params.clone() else { return };
            let Ok(event) = serde_json::from_value::<network::ResponseReceivedEvent>(params) else { return };
            push_capped(
                &mut response_buffers.lock().network,
                NetworkEntry {
                    request_id: event.request_id,
                    url: Some(event.response.url),
                    status: Some(event.response.status),
                    error_text: None,
                },
            );
        }));

        let failure_buffers = buffers.clone();
        subscriptions.push(client.on("Network.loadingFailed", move |event| {
            let Some(params) = event.params.clone() else { return };
            let Ok(event) = serde_json::from_value::<network::LoadingFailedEvent>(params) else { return };
            push_capped(
                &mut failure_buffers.lock().network,
                NetworkEntry {
                    request_id: event.request_id,
                    url: None,
                    status: None,
                    error_text: Some(event.error_text),
                },
            );
        }));

        let nav_buffers = buffers.clone();
        subscriptions.push(client.on("Page.frameNavigated", move |_event| {
            nav_buffers.lock().clear();
        }));

        Ok(Self { buffers, subscriptions })
    }

    /// The console messages currently held, oldest first.
    #[must_use]
    pub fn console_messages(&self) -> Vec<ConsoleEntry> {
        self.buffers.lock().console.iter().cloned().collect()
    }

    /// The unhandled exceptions currently held, oldest first.
    #[must_use]
    pub fn exceptions(&self) -> Vec<ExceptionEntry> {
        self.buffers.lock().exceptions.iter().cloned().collect()
    }

    /// The network events currently held, oldest first.
    #[must_use]
    pub fn network_events(&self) -> Vec<NetworkEntry> {
        self.buffers.lock().network.iter().cloned().collect()
    }

    /// Remove every handler this buffer registered. Idempotent; safe to call
    /// more than once or to skip (subscriptions also unsubscribe on drop of
    /// the underlying client, but not on drop of `self`).
    pub fn unsubscribe(&self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests;
