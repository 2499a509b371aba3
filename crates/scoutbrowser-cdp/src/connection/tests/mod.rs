//! Mock-server tests for [`CdpClient`].
//!
//! Each test spins up a bare `tokio_tungstenite` server with the behavior it
//! needs (echo, silent, drop-after-n) and drives a real `CdpClient` against
//! it over localhost.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use super::*;

fn ws_url(addr: SocketAddr) -> String {
    format!("ws://{addr}")
}

/// Echoes `{"id": N, "result": {}}` for every command it receives.
async fn start_echo_server() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                let (mut sink, mut source) = ws.split();
                while let Some(Ok(Message::Text(text))) = source.next().await {
                    let cmd: Value = serde_json::from_str(&text).unwrap();
                    let response = json!({"id": cmd["id"], "result": {}});
                    sink.send(Message::Text(response.to_string().into())).await.unwrap();
                }
            });
        }
    });
    (addr, handle)
}

/// Accepts commands but never answers them.
async fn start_silent_server() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                let (_sink, mut source) = ws.split();
                while source.next().await.is_some() {}
            });
        }
    });
    (addr, handle)
}

/// Echoes `{"echo_id": id}` results so callers can confirm correlation.
async fn start_echo_id_server() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                let (mut sink, mut source) = ws.split();
                while let Some(Ok(Message::Text(text))) = source.next().await {
                    let cmd: Value = serde_json::from_str(&text).unwrap();
                    let response = json!({"id": cmd["id"], "result": {"echoId": cmd["id"]}});
                    sink.send(Message::Text(response.to_string().into())).await.unwrap();
                }
            });
        }
    });
    (addr, handle)
}

/// Records every received command, then (for the first `drop_after`
/// connections) closes the socket after answering `close_after` commands.
/// Later connections are served by [`start_echo_server`]-style responses
/// forever, so a reconnect attempt after the drop can succeed.
async fn start_flaky_recording_server(
    close_after: usize,
    drop_connections: usize,
) -> (SocketAddr, mpsc::UnboundedReceiver<Value>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connection_count = Arc::new(AtomicUsize::new(0));
    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            let connection_count = connection_count.clone();
            let this_connection = connection_count.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                let (mut sink, mut source) = ws.split();
                let mut served = 0;
                while let Some(Ok(Message::Text(text))) = source.next().await {
                    let cmd: Value = serde_json::from_str(&text).unwrap();
                    let _ = tx.send(cmd.clone());
                    let response = json!({"id": cmd["id"], "result": {}});
                    sink.send(Message::Text(response.to_string().into())).await.unwrap();
                    served += 1;
                    if this_connection < drop_connections && served >= close_after {
                        let _ = sink.send(Message::Close(None)).await;
                        return;
                    }
                }
            });
        }
    });
    (addr, rx, handle)
}

/// Closes the initial connection right after the handshake (triggering the
/// client's reconnect loop), fails the next two dial attempts by dropping
/// the raw TCP stream before the WebSocket handshake, then serves the
/// fourth (and every later) connection normally.
async fn start_reconnect_sequence_server() -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connection_count = Arc::new(AtomicUsize::new(0));
    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let index = connection_count.fetch_add(1, Ordering::SeqCst);
            if index == 1 || index == 2 {
                drop(stream);
                continue;
            }
            tokio::spawn(async move {
                let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                if index == 0 {
                    let _ = ws.send(Message::Close(None)).await;
                    return;
                }
                let (mut sink, mut source) = ws.split();
                while let Some(Ok(Message::Text(text))) = source.next().await {
                    let cmd: Value = serde_json::from_str(&text).unwrap();
                    let response = json!({"id": cmd["id"], "result": {}});
                    sink.send(Message::Text(response.to_string().into())).await.unwrap();
                }
            });
        }
    });
    (addr, handle)
}

/// Echoes commands and lets the test push arbitrary event frames on demand.
async fn start_event_push_server() -> (SocketAddr, mpsc::Sender<Value>, JoinHandle<()>) {
    let (event_tx, mut event_rx) = mpsc::channel::<Value>(32);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let (mut sink, mut source) = ws.split();
            loop {
                tokio::select! {
                    msg = source.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let cmd: Value = serde_json::from_str(&text).unwrap();
                                let response = json!({"id": cmd["id"], "result": {}});
                                sink.send(Message::Text(response.to_string().into())).await.unwrap();
                            }
                            None | Some(Err(_)) => break,
                            _ => {}
                        }
                    }
                    event = event_rx.recv() => {
                        match event {
                            Some(event) => {
                                sink.send(Message::Text(event.to_string().into())).await.unwrap();
                            }
                            None => break,
                        }
                    }
                }
            }
        }
    });
    (addr, event_tx, handle)
}

#[tokio::test]
async fn connect_reports_connected() {
    let (addr, _server) = start_echo_server().await;
    let client = CdpClient::connect(&ws_url(addr)).await.unwrap();
    assert!(client.is_connected());
}

#[tokio::test]
async fn send_receives_response() {
    let (addr, _server) = start_echo_server().await;
    let client = CdpClient::connect(&ws_url(addr)).await.unwrap();

    let result: Value = client
        .send("Page.navigate", Some(json!({"url": "https://example.com"})), None)
        .await
        .unwrap();
    assert!(result.is_object());
}

#[tokio::test]
async fn concurrent_commands_correlate_out_of_order() {
    let (addr, _server) = start_echo_id_server().await;
    let client = CdpClient::connect(&ws_url(addr)).await.unwrap();

    let futures: Vec<_> = (0..10)
        .map(|i| {
            let client = client.clone();
            async move {
                let method = format!("Test.method{i}");
                client.send::<(), Value>(&method, None, None).await.unwrap()
            }
        })
        .collect();

    let results = futures_util::future::join_all(futures).await;
    let ids: std::collections::HashSet<u64> =
        results.iter().map(|r| r["echoId"].as_u64().unwrap()).collect();
    assert_eq!(ids.len(), 10, "each concurrent command should resolve to its own response");
}

#[tokio::test]
async fn command_times_out_when_server_never_responds() {
    let (addr, _server) = start_silent_server().await;
    let client = CdpClient::connect(&ws_url(addr)).await.unwrap();

    let result = client
        .send_with_timeout::<(), Value>("Runtime.evaluate", None, None, Duration::from_millis(30))
        .await;

    assert!(matches!(result, Err(CdpError::Timeout(_))));
}

#[tokio::test]
async fn event_subscription_delivers_matching_events() {
    let (addr, event_tx, _server) = start_event_push_server().await;
    let client = CdpClient::connect(&ws_url(addr)).await.unwrap();

    let received = Arc::new(std::sync::Mutex::new(Vec::new()));
    let received_clone = received.clone();
    let _sub = client.on("Page.frameNavigated", move |event| {
        received_clone.lock().unwrap().push(event.params.clone());
    });

    event_tx
        .send(json!({"method": "Page.frameNavigated", "params": {"frame": {"id": "f1"}}}))
        .await
        .unwrap();
    // An event under a different method name must not reach this handler.
    event_tx.send(json!({"method": "Page.loadEventFired", "params": {}})).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].as_ref().unwrap()["frame"]["id"], "f1");
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let (addr, event_tx, _server) = start_event_push_server().await;
    let client = CdpClient::connect(&ws_url(addr)).await.unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    let sub = client.on("Console.messageAdded", move |_event| {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });

    event_tx.send(json!({"method": "Console.messageAdded", "params": {}})).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    sub.unsubscribe();
    // Idempotent: a second call must not panic or double-send the command.
    sub.unsubscribe();

    event_tx.send(json!({"method": "Console.messageAdded", "params": {}})).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1, "handler must not fire after unsubscribe");
}

#[tokio::test]
async fn disconnect_rejects_subsequent_commands() {
    let (addr, _server) = start_echo_server().await;
    let client = CdpClient::connect(&ws_url(addr)).await.unwrap();

    client.disconnect().await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let result = client.send::<(), Value>("Page.navigate", None, None).await;
    assert!(matches!(result, Err(CdpError::Disconnected)));
}

#[tokio::test]
async fn reconnect_replays_enabled_domains() {
    let (addr, mut recorded, _server) = start_flaky_recording_server(1, 1).await;
    let client = CdpClient::connect(&ws_url(addr)).await.unwrap();

    let reconnecting_attempts = Arc::new(std::sync::Mutex::new(Vec::new()));
    let attempts_clone = reconnecting_attempts.clone();
    let _sub = client.on("reconnecting", move |event| {
        let attempt = event.params.as_ref().and_then(|p| p["attempt"].as_u64());
        attempts_clone.lock().unwrap().push(attempt);
    });

    let reconnected = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let reconnected_clone = reconnected.clone();
    let _sub2 = client.on("reconnected", move |_event| {
        reconnected_clone.store(true, Ordering::SeqCst);
    });

    // Enable a domain; this is the one command the server answers before
    // closing the first connection.
    let _: Value = client.send("Page.enable", Some(json!({})), None).await.unwrap();

    // The connection drops right after, and the listener is still alive for
    // the retry, so reconnection succeeds on the first attempt.
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(reconnected.load(Ordering::SeqCst), "client should reconnect after the server closes");
    assert!(client.is_connected());

    // The replayed `Page.enable` should be the next command the server sees
    // after the one the client sent before the drop.
    let first = recorded.recv().await.unwrap();
    assert_eq!(first["method"], "Page.enable");
    let replayed = recorded.recv().await.unwrap();
    assert_eq!(replayed["method"], "Page.enable");
}

#[tokio::test]
async fn reconnect_exhaustion_surfaces_on_subsequent_sends() {
    // Accept exactly one connection, then let the listener drop — the port
    // closes with it, so every later reconnect attempt fails to dial.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accept_once = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        drop(ws);
    });

    let client = CdpClient::connect(&ws_url(addr)).await.unwrap();
    accept_once.await.unwrap();

    // Wait past all three fixed reconnect delays (250 + 500 + 750ms).
    tokio::time::sleep(Duration::from_millis(2200)).await;

    assert!(!client.is_connected());
    let result = client.send::<(), Value>("Page.navigate", None, None).await;
    assert!(
        matches!(result, Err(CdpError::ReconnectExhausted { attempts: 3, .. })),
        "expected ReconnectExhausted after 3 failed attempts, got {result:?}"
    );
}

#[tokio::test]
async fn reconnecting_is_emitted_for_every_attempt_including_the_successful_one() {
    // The original spec's §8 scenario 2 example shows only reconnecting{1,2}
    // before reconnected{3}, but §4.A step 2 states "each attempt emits a
    // reconnecting event" — the two are inconsistent. This pins the literal
    // per-attempt rule: every attempt, success or failure, emits reconnecting.
    let (addr, _server) = start_reconnect_sequence_server().await;
    let client = CdpClient::connect(&ws_url(addr)).await.unwrap();

    let reconnecting_attempts = Arc::new(std::sync::Mutex::new(Vec::new()));
    let attempts_clone = reconnecting_attempts.clone();
    let _sub = client.on("reconnecting", move |event| {
        let attempt = event.params.as_ref().and_then(|p| p["attempt"].as_u64());
        attempts_clone.lock().unwrap().push(attempt);
    });

    let reconnected_attempt = Arc::new(std::sync::Mutex::new(None));
    let reconnected_clone = reconnected_attempt.clone();
    let _sub2 = client.on("reconnected", move |event| {
        *reconnected_clone.lock().unwrap() = event.params.as_ref().and_then(|p| p["attempt"].as_u64());
    });

    // The server closes the initial connection right after handshake,
    // which starts the reconnect loop. Wait past the 250ms + 500ms + 750ms
    // fixed delays before the third dial.
    tokio::time::sleep(Duration::from_millis(1900)).await;

    assert!(client.is_connected());
    assert_eq!(*reconnecting_attempts.lock().unwrap(), vec![Some(1), Some(2), Some(3)]);
    assert_eq!(*reconnected_attempt.lock().unwrap(), Some(3));
}
