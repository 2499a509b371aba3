//! # Scoutbrowser Core - Browser Automation Core
//!
//! CDP-driven browser automation built on [`scoutbrowser_cdp`]: a process
//! supervisor that owns a single Chromium child, an accessibility-tree
//! snapshot engine, and a cron-driven watcher subsystem that polls pages for
//! changes and notifies an external conversation store.
//!
//! This crate handles:
//! - Launching, health-checking, and gracefully tearing down a Chromium
//!   process (headless or headed)
//! - Capturing and diffing accessibility-tree snapshots, with stable
//!   per-tab element refs
//! - Registering, persisting, and scheduling watchers that re-check a page
//!   on an interval and report changes
//! - Rolling console/exception/network event capture for a session
//!
//! ## Module Organization
//!
//! - [`config`] - Environment-driven configuration and path resolution
//! - [`error`] - The crate-level [`error::CoreError`] type
//! - [`refs`] - Stable element-ref assignment across snapshots
//! - [`snapshot`] - Accessibility-tree capture, diffing, and serialization
//! - [`supervisor`] - Chromium process lifecycle management
//! - [`watcher`] - Watcher state machine, registry, cron wiring, and
//!   notification delivery
//! - [`debug_events`] - Rolling console/exception/network capture

pub mod config;
pub mod debug_events;
pub mod error;
pub mod refs;
pub mod snapshot;
pub mod supervisor;
pub mod watcher;

pub use config::Config;
pub use error::CoreError;
