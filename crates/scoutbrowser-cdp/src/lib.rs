//! # Scoutbrowser CDP - Chrome DevTools Protocol Client
//!
//! Low-level Chrome DevTools Protocol (CDP) implementation over WebSocket,
//! providing the foundational transport layer for browser automation.
//!
//! This crate handles:
//! - WebSocket connection management to Chrome/Chromium browsers
//! - CDP message serialization and deserialization
//! - Command/response handling with async/await
//! - Event subscription with cancelable handlers
//! - Automatic reconnection with enabled-domain replay
//!
//! ## Features
//!
//! - **Async WebSocket**: Non-blocking WebSocket communication with Chromium
//! - **Type-safe Protocol**: Strongly-typed CDP domains (Page, Runtime, Network, etc.)
//! - **Event Subscription**: Register handlers that unsubscribe via a returned guard
//! - **Reconnection**: Fixed-delay retry with automatic domain re-enablement
//! - **Error Handling**: Comprehensive error types for CDP and transport errors
//!
//! ## Quick Start
//!
//! ```no_run
//! use scoutbrowser_cdp::{CdpClient, protocol::target_domain::GetTargetsParams};
//!
//! # async fn example() -> Result<(), scoutbrowser_cdp::CdpError> {
//! // Connect to a running Chrome instance
//! let client = CdpClient::connect("ws://localhost:9222/devtools/browser/...").await?;
//!
//! // Send a CDP command
//! let result: scoutbrowser_cdp::protocol::target_domain::GetTargetsResult = client
//!     .send("Target.getTargets", Some(GetTargetsParams::default()), None)
//!     .await?;
//!
//! for target in result.target_infos {
//!     println!("Target: {} - {}", target.target_type, target.url);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Discovering Chrome's WebSocket URL
//!
//! Chrome exposes a JSON API for discovering the WebSocket URL:
//!
//! ```no_run
//! use scoutbrowser_cdp::{discover_websocket_url, CdpConnectionOptions};
//!
//! # async fn example() -> Result<(), scoutbrowser_cdp::CdpError> {
//! let options = CdpConnectionOptions::default();
//! let ws_url = discover_websocket_url("http://localhost:9222", &options).await?;
//! println!("WebSocket URL: {}", ws_url);
//! # Ok(())
//! # }
//! ```
//!
//! ## Sending Commands
//!
//! Commands are sent with optional session IDs for page-specific operations:
//!
//! ```no_run
//! use scoutbrowser_cdp::CdpClient;
//! use scoutbrowser_cdp::protocol::page::NavigateParams;
//!
//! # async fn example(client: &CdpClient, session_id: &str) -> Result<(), scoutbrowser_cdp::CdpError> {
//! // Browser-level command (no session)
//! let version: scoutbrowser_cdp::BrowserVersion = client.send(
//!     "Browser.getVersion",
//!     None::<()>,
//!     None,
//! ).await?;
//!
//! // Page-level command (with session)
//! let result: scoutbrowser_cdp::protocol::page::NavigateResult = client.send(
//!     "Page.navigate",
//!     Some(NavigateParams {
//!         url: "https://example.com".to_string(),
//!         referrer: None,
//!         transition_type: None,
//!         frame_id: None,
//!     }),
//!     Some(session_id),
//! ).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Subscribing to Events
//!
//! `on` registers a handler for a method name and returns an unsubscribe guard:
//!
//! ```no_run
//! use scoutbrowser_cdp::CdpClient;
//!
//! # async fn example(client: &CdpClient) -> Result<(), scoutbrowser_cdp::CdpError> {
//! let _subscription = client.on("Page.frameNavigated", |event| {
//!     println!("navigated: {:?}", event.params);
//! });
//! # Ok(())
//! # }
//! ```
//!
//! ## Connection Options
//!
//! ```no_run
//! use scoutbrowser_cdp::{CdpClient, CdpConnectionOptions};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), scoutbrowser_cdp::CdpError> {
//! let options = CdpConnectionOptions::new().timeout(Duration::from_secs(30));
//!
//! let client = CdpClient::connect_with_options(
//!     "ws://localhost:9222/devtools/browser/...",
//!     &options,
//! ).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Protocol Domains
//!
//! The [`protocol`] module contains typed definitions for CDP domains:
//!
//! - `target_domain` - Target management (pages, workers)
//! - `page` - Page navigation and lifecycle
//! - `runtime` - JavaScript execution
//! - `network` - Cookie access and response tracking
//! - `dom` - DOM inspection and manipulation
//! - `accessibility` - Accessibility tree retrieval
//! - `input` - Input device simulation
//! - `console` - Legacy console message capture
//!
//! ## Error Handling
//!
//! The [`CdpError`] type covers all possible errors:
//!
//! ```no_run
//! use scoutbrowser_cdp::{CdpClient, CdpError};
//!
//! # async fn example() -> Result<(), CdpError> {
//! let result = CdpClient::connect("ws://invalid:9999/...").await;
//!
//! match result {
//!     Ok(_client) => println!("Connected!"),
//!     Err(CdpError::ConnectionFailed(e)) => println!("Connection error: {}", e),
//!     Err(CdpError::Protocol { code, message }) => {
//!         println!("CDP error {}: {}", code, message);
//!     }
//!     Err(e) => println!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`connection`] - The reconnecting CDP actor and WebSocket discovery
//! - [`transport`] - Wire message types and serialization
//! - [`protocol`] - CDP domain type definitions
//! - [`error`] - Error types

pub mod connection;
pub mod error;
pub mod protocol;
pub mod transport;

pub use connection::{
    BrowserVersion, CdpClient, CdpConnectionOptions, EventSubscription, discover_websocket_url,
};
pub use error::CdpError;
pub use transport::{CdpEvent, CdpMessage, CdpRequest, CdpResponse};
