//! CDP WebSocket connection management.
//!
//! [`CdpClient`] is a single-connection request/response + event multiplexer
//! backed by one background task. The task owns the socket and the pending
//! command map; the handle only ever talks to it over channels, so nothing
//! here re-enters dispatch while holding a lock.

pub mod discovery;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{Mutex as AsyncMutex, mpsc, oneshot};
use tokio::time::Instant;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};
use tracing::{debug, info, instrument, trace, warn};

pub use discovery::{BrowserVersion, CdpConnectionOptions, discover_websocket_url};

use crate::error::CdpError;
use crate::transport::{CdpEvent, CdpMessage, CdpRequest};

/// Default timeout for CDP commands.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Capacity of the actor's inbound command channel.
const COMMAND_CHANNEL_SIZE: usize = 256;

/// Fixed reconnect delays, tried in order. Three attempts, not exponential.
const RECONNECT_DELAYS: [Duration; 3] = [
    Duration::from_millis(250),
    Duration::from_millis(500),
    Duration::from_millis(750),
];

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type EventHandler = Arc<dyn Fn(&CdpEvent) + Send + Sync>;

/// A registered [`CdpClient::on`] subscription. Call [`Self::unsubscribe`]
/// to remove the handler; repeated calls are a no-op.
pub struct EventSubscription {
    command_tx: mpsc::Sender<ActorCommand>,
    method: String,
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl EventSubscription {
    /// Remove this subscription's handler. Idempotent.
    pub fn unsubscribe(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.command_tx.try_send(ActorCommand::Unsubscribe {
            method: self.method.clone(),
            id: self.id,
        });
    }
}

enum ActorCommand {
    Send {
        request: CdpRequest,
        respond_to: oneshot::Sender<Result<Value, CdpError>>,
        deadline: Instant,
    },
    Subscribe {
        method: String,
        id: u64,
        handler: EventHandler,
    },
    Unsubscribe {
        method: String,
        id: u64,
    },
    Disconnect,
}

struct PendingCommand {
    method: String,
    respond_to: oneshot::Sender<Result<Value, CdpError>>,
    deadline: Instant,
}

/// A CDP connection to a browser.
///
/// Cloning shares the same underlying actor task and socket.
#[derive(Clone)]
pub struct CdpClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    command_tx: mpsc::Sender<ActorCommand>,
    next_id: Arc<AtomicU64>,
    next_sub_id: AtomicU64,
    connected: Arc<AtomicBool>,
    session_hint: Arc<StdMutex<Option<String>>>,
    default_timeout: Duration,
    /// Serializes concurrent `disconnect()` callers.
    disconnect_lock: AsyncMutex<()>,
}

impl std::fmt::Debug for CdpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpClient")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl CdpClient {
    /// Connect to a CDP endpoint, discovering the WebSocket URL first if a
    /// plain HTTP endpoint was given.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery or the WebSocket handshake fails.
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        Self::connect_with_options(endpoint, &CdpConnectionOptions::default()).await
    }

    /// Connect with explicit [`CdpConnectionOptions`] (timeout, headers used
    /// only during HTTP discovery).
    ///
    /// # Errors
    ///
    /// Returns an error if discovery or the WebSocket handshake fails.
    #[instrument(level = "info", skip(options), fields(endpoint = %endpoint))]
    pub async fn connect_with_options(
        endpoint: &str,
        options: &CdpConnectionOptions,
    ) -> Result<Self, CdpError> {
        let ws_url = discover_websocket_url(endpoint, options).await?;
        info!(ws_url = %ws_url, "Connecting to CDP WebSocket endpoint");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&ws_url).await?;
        let (write, read) = ws_stream.split();

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let connected = Arc::new(AtomicBool::new(true));
        let session_hint = Arc::new(StdMutex::new(None));

        let actor = ClientActor {
            ws_url,
            write,
            read,
            command_rx,
            pending: HashMap::new(),
            subscribers: HashMap::new(),
            enabled_domains: Vec::new(),
            next_request_id: Arc::new(AtomicU64::new(1)),
            session_hint: session_hint.clone(),
            connected: connected.clone(),
            permanently_disconnected: false,
            reconnect_failure: None,
        };
        let next_id = actor.next_request_id.clone();
        tokio::spawn(actor.run());

        info!("CDP connection ready");
        Ok(Self {
            inner: Arc::new(ClientInner {
                command_tx,
                next_id,
                next_sub_id: AtomicU64::new(1),
                connected,
                session_hint,
                default_timeout: options.timeout.unwrap_or(DEFAULT_TIMEOUT),
                disconnect_lock: AsyncMutex::new(()),
            }),
        })
    }

    /// Whether the underlying socket is currently open (not mid-reconnect,
    /// not permanently disconnected).
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Relaxed)
    }

    /// The session id most recently reported by a `Target.attachToTarget`
    /// response, if any. Informational only; callers must pass session ids
    /// explicitly to [`Self::send`].
    #[must_use]
    pub fn current_session_hint(&self) -> Option<String> {
        self.inner.session_hint.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Disconnect permanently: closes the socket, rejects every outstanding
    /// command, and stops further reconnect attempts. Idempotent.
    pub async fn disconnect(&self) {
        let _guard = self.inner.disconnect_lock.lock().await;
        let _ = self.inner.command_tx.send(ActorCommand::Disconnect).await;
    }

    /// Send a CDP command using this client's default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be delivered, times out, or
    /// the browser reports a protocol error.
    pub async fn send<P, R>(
        &self,
        method: &str,
        params: Option<P>,
        session_id: Option<&str>,
    ) -> Result<R, CdpError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.send_with_timeout(method, params, session_id, self.inner.default_timeout)
            .await
    }

    /// Send a CDP command with an explicit timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be delivered, times out, or
    /// the browser reports a protocol error.
    #[instrument(level = "debug", skip(self, params), fields(method = %method, session_id = ?session_id))]
    pub async fn send_with_timeout<P, R>(
        &self,
        method: &str,
        params: Option<P>,
        session_id: Option<&str>,
        timeout_duration: Duration,
    ) -> Result<R, CdpError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let params_value = params.map(|p| serde_json::to_value(p)).transpose()?;

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: params_value,
            session_id: session_id.map(ToString::to_string),
        };

        let (respond_to, response_rx) = oneshot::channel();
        let deadline = Instant::now() + timeout_duration;

        self.inner
            .command_tx
            .send(ActorCommand::Send { request, respond_to, deadline })
            .await
            .map_err(|_| CdpError::Disconnected)?;

        let result = match tokio::time::timeout(timeout_duration, response_rx).await {
            Ok(Ok(result)) => result?,
            Ok(Err(_)) => return Err(CdpError::ConnectionLost),
            Err(_) => return Err(CdpError::Timeout(timeout_duration)),
        };

        serde_json::from_value(result).map_err(CdpError::from)
    }

    /// Subscribe to a CDP event by method name (e.g. `"Page.frameNavigated"`).
    /// Also delivers the synthetic lifecycle events `"reconnecting"`,
    /// `"reconnected"`, and `"disconnected"`.
    ///
    /// Returns a guard; call [`EventSubscription::unsubscribe`] to remove
    /// exactly this handler. Handler panics are not caught.
    pub fn on<F>(&self, method: &str, handler: F) -> EventSubscription
    where
        F: Fn(&CdpEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_sub_id.fetch_add(1, Ordering::Relaxed);
        let _ = self.inner.command_tx.try_send(ActorCommand::Subscribe {
            method: method.to_string(),
            id,
            handler: Arc::new(handler),
        });
        EventSubscription {
            command_tx: self.inner.command_tx.clone(),
            method: method.to_string(),
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

struct ClientActor {
    ws_url: String,
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
    command_rx: mpsc::Receiver<ActorCommand>,
    pending: HashMap<u64, PendingCommand>,
    subscribers: HashMap<String, Vec<(u64, EventHandler)>>,
    /// Methods ending in `.enable` (and their params), in the order they
    /// first succeeded, replayed after a reconnect.
    enabled_domains: Vec<(String, Option<Value>)>,
    next_request_id: Arc<AtomicU64>,
    session_hint: Arc<StdMutex<Option<String>>>,
    connected: Arc<AtomicBool>,
    permanently_disconnected: bool,
    /// Set once the reconnect protocol exhausts its attempts; every
    /// subsequent send fails fast with this recorded error.
    reconnect_failure: Option<(u32, String)>,
}

impl ClientActor {
    /// Runs until the process exits. Once permanently disconnected, the
    /// socket branch and timeout sweep are parked so the loop only serves
    /// fast-failing `Send` commands and subscription bookkeeping.
    async fn run(mut self) {
        debug!("CDP actor task started");
        loop {
            let sleep_until = if self.permanently_disconnected { None } else { self.earliest_deadline() };

            tokio::select! {
                biased;

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => break,
                    }
                }

                msg = self.read.next(), if !self.permanently_disconnected => {
                    match msg {
                        Some(Ok(Message::Text(text))) => self.handle_message(&text),
                        Some(Ok(Message::Close(frame))) => {
                            info!(?frame, "WebSocket closed by remote");
                            self.handle_disconnect().await;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket error");
                            self.handle_disconnect().await;
                        }
                        None => {
                            info!("WebSocket stream ended");
                            self.handle_disconnect().await;
                        }
                    }
                }

                () = sleep_or_forever(sleep_until) => {
                    self.sweep_timeouts();
                }
            }
        }
        debug!("CDP actor task ended");
    }

    async fn handle_command(&mut self, cmd: ActorCommand) {
        match cmd {
            ActorCommand::Send { request, respond_to, deadline } => {
                self.handle_send(request, respond_to, deadline).await;
            }
            ActorCommand::Subscribe { method, id, handler } => {
                self.subscribers.entry(method).or_default().push((id, handler));
            }
            ActorCommand::Unsubscribe { method, id } => {
                if let Some(handlers) = self.subscribers.get_mut(&method) {
                    handlers.retain(|(hid, _)| *hid != id);
                }
            }
            ActorCommand::Disconnect => {
                if self.permanently_disconnected {
                    return;
                }
                self.permanently_disconnected = true;
                self.connected.store(false, Ordering::Relaxed);
                self.reject_all_pending(|| CdpError::Disconnected);
                let _ = self.write.send(Message::Close(None)).await;
            }
        }
    }

    async fn handle_send(
        &mut self,
        request: CdpRequest,
        respond_to: oneshot::Sender<Result<Value, CdpError>>,
        deadline: Instant,
    ) {
        if self.permanently_disconnected {
            let err = match &self.reconnect_failure {
                Some((attempts, last_error)) => {
                    CdpError::ReconnectExhausted { attempts: *attempts, last_error: last_error.clone() }
                }
                None => CdpError::Disconnected,
            };
            let _ = respond_to.send(Err(err));
            return;
        }

        let is_enable = request.method.ends_with(".enable");
        let json = match serde_json::to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                let _ = respond_to.send(Err(CdpError::Json(e)));
                return;
            }
        };

        trace!(id = request.id, method = %request.method, "Sending CDP request");
        if let Err(e) = self.write.send(Message::Text(json.into())).await {
            let _ = respond_to.send(Err(CdpError::SendFailed(e.to_string())));
            return;
        }

        if is_enable {
            self.remember_enabled_domain(request.method.clone(), request.params.clone());
        }

        self.pending.insert(
            request.id,
            PendingCommand { method: request.method, respond_to, deadline },
        );
    }

    fn remember_enabled_domain(&mut self, method: String, params: Option<Value>) {
        if let Some(entry) = self.enabled_domains.iter_mut().find(|(m, _)| *m == method) {
            entry.1 = params;
        } else {
            self.enabled_domains.push((method, params));
        }
    }

    fn handle_message(&mut self, text: &str) {
        trace!(len = text.len(), "Received CDP message");
        let message: CdpMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "Failed to parse CDP message");
                return;
            }
        };

        match message {
            CdpMessage::Response(response) => {
                let Some(pending) = self.pending.remove(&response.id) else {
                    warn!(id = response.id, "Received response for unknown request ID");
                    return;
                };

                if pending.method == "Target.attachToTarget" {
                    if let Some(result) = &response.result {
                        if let Some(session_id) = result.get("sessionId").and_then(Value::as_str) {
                            *self.session_hint.lock().unwrap_or_else(|e| e.into_inner()) =
                                Some(session_id.to_string());
                        }
                    }
                }

                if let Some(error) = response.error {
                    let _ = pending.respond_to.send(Err(CdpError::Protocol {
                        code: error.code,
                        message: error.message,
                    }));
                } else {
                    let _ = pending.respond_to.send(Ok(response.result.unwrap_or(Value::Null)));
                }
            }
            CdpMessage::Event(event) => self.dispatch_event(&event),
        }
    }

    /// Copy-before-iterate: a handler may subscribe or unsubscribe without
    /// affecting the set of handlers invoked for this dispatch round.
    fn dispatch_event(&self, event: &CdpEvent) {
        let Some(handlers) = self.subscribers.get(&event.method) else {
            return;
        };
        let handlers: Vec<EventHandler> = handlers.iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler(event);
        }
    }

    fn emit_synthetic(&self, method: &str, params: Value) {
        let event = CdpEvent { method: method.to_string(), params: Some(params), session_id: None };
        self.dispatch_event(&event);
    }

    fn earliest_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    fn sweep_timeouts(&mut self) {
        let now = Instant::now();
        let expired: Vec<u64> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(id, _)| *id)
            .collect();
        for id in expired {
            if let Some(pending) = self.pending.remove(&id) {
                let _ = pending.respond_to.send(Err(CdpError::Timeout(Duration::ZERO)));
            }
        }
    }

    /// Rejects every outstanding command with a freshly constructed error.
    fn reject_all_pending(&mut self, make_error: impl Fn() -> CdpError) {
        for (_, pending) in self.pending.drain() {
            let _ = pending.respond_to.send(Err(make_error()));
        }
    }

    /// The reconnect protocol: reject outstanding commands, retry the dial
    /// with fixed delays, and replay enabled domains on success.
    async fn handle_disconnect(&mut self) {
        if self.permanently_disconnected {
            return;
        }
        self.connected.store(false, Ordering::Relaxed);
        self.reject_all_pending(|| CdpError::ConnectionLost);

        let mut last_error = String::new();
        for (index, delay) in RECONNECT_DELAYS.iter().enumerate() {
            let attempt = u32::try_from(index + 1).unwrap_or(u32::MAX);
            self.emit_synthetic(
                "reconnecting",
                serde_json::json!({
                    "attempt": attempt,
                    "maxAttempts": RECONNECT_DELAYS.len(),
                    "delayMs": delay.as_millis(),
                }),
            );
            tokio::time::sleep(*delay).await;

            match tokio_tungstenite::connect_async(&self.ws_url).await {
                Ok((stream, _)) => {
                    let (write, read) = stream.split();
                    self.write = write;
                    self.read = read;
                    self.connected.store(true, Ordering::Relaxed);
                    info!(attempt, "Reconnected to CDP endpoint");
                    self.emit_synthetic("reconnected", serde_json::json!({ "attempt": attempt }));
                    self.replay_enabled_domains().await;
                    return;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Reconnect attempt failed");
                    last_error = e.to_string();
                }
            }
        }

        let attempts = u32::try_from(RECONNECT_DELAYS.len()).unwrap_or(u32::MAX);
        self.reconnect_failure = Some((attempts, last_error.clone()));
        self.permanently_disconnected = true;
        self.emit_synthetic(
            "disconnected",
            serde_json::json!({ "attempts": attempts, "lastError": last_error }),
        );
    }

    /// Replays the enabled-domains set in insertion order. Each replay goes
    /// through the normal write path and awaits its own response directly
    /// (the actor is not yet back in its main select loop).
    async fn replay_enabled_domains(&mut self) {
        let domains = self.enabled_domains.clone();
        for (method, params) in domains {
            let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
            let request = CdpRequest { id, method: method.clone(), params, session_id: None };
            let json = match serde_json::to_string(&request) {
                Ok(j) => j,
                Err(e) => {
                    warn!(error = %e, method = %method, "Failed to serialize domain replay");
                    continue;
                }
            };
            if let Err(e) = self.write.send(Message::Text(json.into())).await {
                warn!(error = %e, method = %method, "Failed to replay enabled domain");
                continue;
            }
            // Wait for the matching response so failures surface before the
            // actor resumes normal dispatch; non-matching frames received in
            // the meantime are handled normally (responses dispatched,
            // events forwarded) but not returned to any waiter.
            loop {
                match self.read.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let parsed: Result<CdpMessage, _> = serde_json::from_str(&text);
                        match parsed {
                            Ok(CdpMessage::Response(resp)) if resp.id == id => {
                                if let Some(error) = resp.error {
                                    warn!(method = %method, code = error.code, message = %error.message, "Enabled-domain replay failed");
                                }
                                break;
                            }
                            Ok(msg) => self.handle_parsed_message(msg),
                            Err(e) => warn!(error = %e, "Failed to parse message during domain replay"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        warn!(method = %method, "Connection closed during domain replay");
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error during domain replay");
                        return;
                    }
                }
            }
        }
    }

    fn handle_parsed_message(&mut self, message: CdpMessage) {
        match message {
            CdpMessage::Response(response) => {
                if let Some(pending) = self.pending.remove(&response.id) {
                    if let Some(error) = response.error {
                        let _ = pending
                            .respond_to
                            .send(Err(CdpError::Protocol { code: error.code, message: error.message }));
                    } else {
                        let _ = pending.respond_to.send(Ok(response.result.unwrap_or(Value::Null)));
                    }
                }
            }
            CdpMessage::Event(event) => self.dispatch_event(&event),
        }
    }

}

async fn sleep_or_forever(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests;
