use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::*;

fn test_supervisor() -> BrowserSupervisor {
    BrowserSupervisor::new(Config::from_env(), 0, true)
}

#[tokio::test]
async fn status_reports_not_running_before_any_launch() {
    let supervisor = test_supervisor();
    let status = supervisor.get_status().await;
    assert!(!status.running);
    assert!(status.chrome.is_none());
    assert!(status.tabs.is_empty());
}

#[tokio::test]
async fn update_tab_state_prefers_existing_preferred_tab() {
    let supervisor = test_supervisor();
    supervisor
        .update_tab_state(vec!["tab-a".into(), "tab-b".into()], Some("tab-b"))
        .await;
    assert_eq!(supervisor.active_tab_id().await.as_deref(), Some("tab-b"));
}

#[tokio::test]
async fn update_tab_state_falls_back_to_first_tab_when_preferred_is_gone() {
    let supervisor = test_supervisor();
    supervisor
        .update_tab_state(vec!["tab-a".into(), "tab-b".into()], Some("tab-missing"))
        .await;
    assert_eq!(supervisor.active_tab_id().await.as_deref(), Some("tab-a"));
}

#[tokio::test]
async fn start_invokes_watcher_resume_hook_and_always_succeeds() {
    let supervisor = test_supervisor();
    let hook = Arc::new(NoopWatcherHook {
        resume_calls: std::sync::atomic::AtomicU32::new(0),
        stop_calls: std::sync::atomic::AtomicU32::new(0),
    });
    supervisor.set_watcher_hook(hook.clone()).await;

    supervisor.start().await;
    assert_eq!(hook.resume_calls.load(Ordering::SeqCst), 1);
    assert_eq!(hook.stop_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stop_invokes_watcher_stop_all_hook_even_with_no_browser_running() {
    let supervisor = test_supervisor();
    let hook = Arc::new(NoopWatcherHook {
        resume_calls: std::sync::atomic::AtomicU32::new(0),
        stop_calls: std::sync::atomic::AtomicU32::new(0),
    });
    supervisor.set_watcher_hook(hook.clone()).await;

    supervisor.stop_gracefully().await.unwrap();
    assert_eq!(hook.stop_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn base64_decode_roundtrips_standard_padding() {
    // "hi there" base64-encoded with standard padding.
    let encoded = "aGkgdGhlcmU=";
    let decoded = base64_decode(encoded).unwrap();
    assert_eq!(decoded, b"hi there");
}

#[test]
fn base64_decode_rejects_invalid_bytes() {
    assert!(base64_decode("not valid base64!!").is_err());
}
