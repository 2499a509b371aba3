use super::*;

#[test]
fn codes_match_expected_constants() {
    assert_eq!(CoreError::BrowserNotRunning.code(), "BROWSER_NOT_RUNNING");
    assert_eq!(CoreError::BrowserError("x".into()).code(), "BROWSER_ERROR");
    assert_eq!(CoreError::ElementNotFound("ref-1".into()).code(), "ELEMENT_NOT_FOUND");
    assert_eq!(CoreError::ChromeNotFound.code(), "CHROME_NOT_FOUND");
    assert_eq!(CoreError::WatcherError("x".into()).code(), "WATCHER_ERROR");
    assert_eq!(CoreError::WatcherLimitExceeded.code(), "WATCHER_LIMIT_EXCEEDED");
    assert_eq!(CoreError::Cdp(CdpError::Disconnected).code(), "CDP_ERROR");
}

#[test]
fn retryability_is_a_pure_function_of_variant() {
    assert!(!CoreError::BrowserNotRunning.retryable());
    assert!(!CoreError::ChromeNotFound.retryable());
    assert!(!CoreError::WatcherLimitExceeded.retryable());
    assert!(CoreError::Cdp(CdpError::Timeout(std::time::Duration::from_secs(1))).retryable());
    assert!(!CoreError::Cdp(CdpError::Disconnected).retryable());
}

#[test]
fn cdp_error_converts_via_from() {
    let err: CoreError = CdpError::ConnectionLost.into();
    assert!(matches!(err, CoreError::Cdp(CdpError::ConnectionLost)));
    assert!(err.retryable());
}
