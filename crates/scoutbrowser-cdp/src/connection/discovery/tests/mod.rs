use super::*;

#[tokio::test]
async fn websocket_url_passthrough() {
    let options = CdpConnectionOptions::default();
    let result =
        discover_websocket_url("ws://localhost:9222/devtools/browser/abc123", &options).await;

    assert_eq!(
        result.unwrap(),
        "ws://localhost:9222/devtools/browser/abc123"
    );
}

#[tokio::test]
async fn invalid_scheme_is_rejected() {
    let options = CdpConnectionOptions::default();
    let result = discover_websocket_url("ftp://localhost:9222", &options).await;

    assert!(matches!(
        result.unwrap_err(),
        CdpError::InvalidEndpointUrl(_)
    ));
}

#[tokio::test]
async fn malformed_url_is_rejected() {
    let options = CdpConnectionOptions::default();
    let result = discover_websocket_url("not a url", &options).await;

    assert!(matches!(
        result.unwrap_err(),
        CdpError::InvalidEndpointUrl(_)
    ));
}

#[test]
fn connection_options_builder() {
    let options = CdpConnectionOptions::new()
        .timeout(Duration::from_secs(10))
        .header("Authorization", "Bearer token")
        .header("X-Custom", "value");

    assert_eq!(options.timeout, Some(Duration::from_secs(10)));
    assert_eq!(
        options.headers.get("Authorization"),
        Some(&"Bearer token".to_string())
    );
    assert_eq!(options.headers.get("X-Custom"), Some(&"value".to_string()));
}
