use super::*;

#[test]
fn push_capped_evicts_the_oldest_entry_once_full() {
    let mut buffer = VecDeque::new();
    for i in 0..BUFFER_CAPACITY {
        push_capped(&mut buffer, i);
    }
    assert_eq!(buffer.len(), BUFFER_CAPACITY);
    assert_eq!(*buffer.front().unwrap(), 0);

    push_capped(&mut buffer, BUFFER_CAPACITY);
    assert_eq!(buffer.len(), BUFFER_CAPACITY);
    assert_eq!(*buffer.front().unwrap(), 1, "oldest entry must be evicted once at capacity");
    assert_eq!(*buffer.back().unwrap(), BUFFER_CAPACITY);
}

#[test]
fn clear_empties_all_three_categories() {
    let mut buffers = Buffers::new();
    buffers.console.push_back(ConsoleEntry { source: "s".into(), level: "log".into(), text: "t".into(), url: None });
    buffers.exceptions.push_back(ExceptionEntry { text: "e".into(), timestamp: 0.0, url: None, line_number: 0 });
    buffers.network.push_back(NetworkEntry { request_id: "r".into(), url: None, status: None, error_text: None });

    buffers.clear();

    assert!(buffers.console.is_empty());
    assert!(buffers.exceptions.is_empty());
    assert!(buffers.network.is_empty());
}

#[test]
fn console_message_added_event_parses_into_a_console_entry() {
    let payload = serde_json::json!({
        "message": {"source": "console-api", "level": "warning", "text": "hi", "url": "https://example.com"}
    });
    let event: console::MessageAddedEvent = serde_json::from_value(payload).unwrap();
    assert_eq!(event.message.level, "warning");
    assert_eq!(event.message.text, "hi");
}

#[test]
fn response_received_event_carries_status_and_url() {
    let payload = serde_json::json!({
        "requestId": "req-1",
        "timestamp": 1.0,
        "type": "Document",
        "response": {"url": "https://example.com", "status": 200, "statusText": "OK", "mimeType": "text/html"},
        "frameId": "f1"
    });
    let event: network::ResponseReceivedEvent = serde_json::from_value(payload).unwrap();
    assert_eq!(event.response.status, 200);
    assert_eq!(event.response.url, "https://example.com");
}

#[test]
fn loading_failed_event_carries_error_text_and_no_url() {
    let payload = serde_json::json!({
        "requestId": "req-1",
        "timestamp": 1.0,
        "type": "Document",
        "errorText": "net::ERR_FAILED",
        "canceled": false
    });
    let event: network::LoadingFailedEvent = serde_json::from_value(payload).unwrap();
    assert_eq!(event.error_text, "net::ERR_FAILED");
}

/// End-to-end tests that drive a real Chromium child process. Run with
/// `cargo test --features integration`.
#[cfg(feature = "integration")]
mod integration {
    use scoutbrowser_cdp::protocol::page::NavigateParams;
    use scoutbrowser_cdp::protocol::target_domain::{AttachToTargetParams, CreateTargetParams};

    use super::*;
    use crate::config::Config;
    use crate::supervisor::BrowserSupervisor;

    #[tokio::test]
    async fn captures_console_messages_and_clears_on_navigation() {
        let supervisor = BrowserSupervisor::new(Config::from_env(), 9334, true);
        let client = supervisor.ensure_browser().await.unwrap();

        let created: scoutbrowser_cdp::protocol::target_domain::CreateTargetResult = client
            .send(
                "Target.createTarget",
                Some(CreateTargetParams {
                    url: "about:blank".to_string(),
                    width: None,
                    height: None,
                    browser_context_id: None,
                    background: None,
                    new_window: None,
                }),
                None,
            )
            .await
            .unwrap();
        let attached: scoutbrowser_cdp::protocol::target_domain::AttachToTargetResult = client
            .send(
                "Target.attachToTarget",
                Some(AttachToTargetParams { target_id: created.target_id, flatten: Some(true) }),
                None,
            )
            .await
            .unwrap();
        let session_id = attached.session_id;

        let debug = DebugEventBuffer::attach(&client, &session_id).await.unwrap();

        client
            .send::<_, serde_json::Value>(
                "Page.navigate",
                Some(NavigateParams {
                    url: "data:text/html,<script>console.log('hello from the page')</script>".to_string(),
                    referrer: None,
                    transition_type: None,
                    frame_id: None,
                }),
                Some(&session_id),
            )
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert!(debug.console_messages().iter().any(|entry| entry.text.contains("hello from the page")));

        client
            .send::<_, serde_json::Value>(
                "Page.navigate",
                Some(NavigateParams { url: "about:blank".to_string(), referrer: None, transition_type: None, frame_id: None }),
                Some(&session_id),
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert!(debug.console_messages().is_empty(), "frameNavigated must clear the console buffer");

        debug.unsubscribe();
        supervisor.stop_gracefully().await.unwrap();
    }
}
