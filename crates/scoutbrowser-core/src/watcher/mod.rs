//! A single monitored URL: baseline capture, change detection, persistence.
//!
//! Page-target resolution, baseline/diff semantics, and serialization
//! follow the original spec §4.E directly — no teacher precedent exists
//! for a cron-driven watcher in this pack.

mod cron;
mod notify;
mod registry;

use chrono::{DateTime, Utc};
use scoutbrowser_cdp::CdpClient;
use scoutbrowser_cdp::protocol::page::{EnableParams, NavigateParams};
use scoutbrowser_cdp::protocol::target_domain::{AttachToTargetParams, CreateTargetParams, GetTargetsParams};
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub use cron::{CronError, CronJob, CronScheduler, WatcherCronManager};
pub use notify::{ConversationId, ConversationSummary, NotificationSink, format_notification_message, send_watcher_notification};
pub use registry::WatcherRegistry;

use crate::error::CoreError;
use crate::snapshot::{Snapshot, SnapshotEngine, SnapshotFilter, SnapshotFormat, SnapshotOptions, compute_diff};
use crate::supervisor::BrowserSupervisor;

/// Default interval (seconds) applied when a caller's requested interval is
/// non-finite or `<= 0`.
pub const DEFAULT_INTERVAL_SECONDS: u64 = 300;
/// Minimum interval (seconds) a registered watcher must have.
pub const MIN_INTERVAL_SECONDS: u64 = 60;
/// Default token budget applied when a caller omits `max_tokens`.
pub const DEFAULT_MAX_TOKENS: usize = 2000;

/// Immutable configuration for one watcher, fixed at registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatcherConfig {
    /// The watcher's id (`watcher-<NNN>` unless caller-supplied).
    pub id: String,
    /// The URL this watcher monitors.
    pub url: String,
    /// Re-check interval, in whole seconds, always `>= 60`.
    pub interval_seconds: u64,
    /// Serialization format applied to captures.
    pub format: SnapshotFormat,
    /// Node filter applied to captures.
    pub filter: SnapshotFilter,
    /// Token budget applied to captures.
    pub max_tokens: usize,
    /// When this watcher was registered.
    pub created_at: DateTime<Utc>,
}

/// A watcher's current lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatcherStatus {
    /// Checked on its cron schedule.
    Active,
    /// Not checked; cron executions are refused.
    Paused,
    /// The most recent baseline/check attempt failed.
    Error,
}

/// The diff produced by [`Watcher::check_for_changes`], with nodes reduced
/// to compact `"<ref>:<role>"` labels (optionally quoted-name-suffixed) —
/// the form the watcher subsystem persists and notifies with.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WatcherDiff {
    /// Labels for elements newly present.
    pub added: Vec<String>,
    /// Labels for elements whose value/focus/disabled state changed.
    pub changed: Vec<String>,
    /// Labels for elements no longer present.
    pub removed: Vec<String>,
    /// Whether any of the three lists is non-empty.
    pub has_changes: bool,
    /// When this diff was computed.
    pub timestamp: DateTime<Utc>,
}

fn label(node: &crate::snapshot::ElementRef) -> String {
    match &node.name {
        Some(name) if !name.is_empty() => format!("{}:{} \"{}\"", node.r#ref, node.role, name),
        _ => format!("{}:{}", node.r#ref, node.role),
    }
}

/// Durable state for one watcher: its config plus everything persistence
/// needs to restore it without a live browser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatcherState {
    /// The watcher's immutable configuration.
    pub config: WatcherConfig,
    /// Current lifecycle status.
    pub status: WatcherStatus,
    /// The baseline snapshot, serialized. `None` iff `take_baseline` has
    /// never succeeded. Carries the full structured [`Snapshot`] (not just
    /// its rendered text) so diffing survives a process restart.
    pub baseline_snapshot: Option<Snapshot>,
    /// The most recently computed diff, if any.
    pub last_diff: Option<WatcherDiff>,
    /// When the watcher was last checked or baselined.
    pub last_checked_at: Option<DateTime<Utc>>,
    /// The most recent error message, if the watcher is in `error` status.
    pub last_error: Option<String>,
}

/// A single monitored URL.
pub struct Watcher {
    state: WatcherState,
}

impl Watcher {
    /// Construct a new, un-baselined watcher in `active` status.
    #[must_use]
    pub fn new(config: WatcherConfig) -> Self {
        Self {
            state: WatcherState {
                config,
                status: WatcherStatus::Active,
                baseline_snapshot: None,
                last_diff: None,
                last_checked_at: None,
                last_error: None,
            },
        }
    }

    /// Rehydrate a watcher from previously persisted state.
    #[must_use]
    pub fn from_state(state: WatcherState) -> Self {
        Self { state }
    }

    /// This watcher's id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.state.config.id
    }

    /// This watcher's immutable config.
    #[must_use]
    pub fn config(&self) -> &WatcherConfig {
        &self.state.config
    }

    /// This watcher's current status.
    #[must_use]
    pub fn status(&self) -> WatcherStatus {
        self.state.status
    }

    /// The full persisted state, as of the most recent mutation.
    #[must_use]
    pub fn state(&self) -> &WatcherState {
        &self.state
    }

    /// Round-trip this watcher's state to an owned value.
    #[must_use]
    pub fn serialize(&self) -> WatcherState {
        self.state.clone()
    }

    /// Rehydrate in place is not supported; use [`Self::from_state`] to
    /// construct a fresh `Watcher` from a persisted state instead.
    #[must_use]
    pub fn deserialize(state: WatcherState) -> Self {
        Self::from_state(state)
    }

    /// Pause this watcher: subsequent `check_for_changes` calls are
    /// refused until [`Self::resume`].
    pub fn pause(&mut self) {
        self.state.status = WatcherStatus::Paused;
    }

    /// Resume this watcher. Clears `error` status if it was set.
    pub fn resume(&mut self) {
        self.state.status = WatcherStatus::Active;
        self.state.last_error = None;
    }

    /// Capture the initial baseline snapshot this watcher will diff future
    /// captures against. Refuses if paused.
    #[instrument(level = "debug", skip(self, supervisor, engine), fields(watcher_id = %self.id()))]
    pub async fn take_baseline(&mut self, supervisor: &BrowserSupervisor, engine: &SnapshotEngine) -> Result<(), CoreError> {
        if self.state.status == WatcherStatus::Paused {
            return Err(CoreError::WatcherError(format!("watcher {} is paused", self.id())));
        }

        match self.capture(supervisor, engine).await {
            Ok(snapshot) => {
                self.state.baseline_snapshot = Some(snapshot);
                self.state.last_checked_at = Some(Utc::now());
                self.state.last_error = None;
                Ok(())
            }
            Err(err) => {
                self.state.status = WatcherStatus::Error;
                self.state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Capture a fresh snapshot and diff it against the stored baseline.
    /// Refuses if paused or if no baseline exists yet.
    #[instrument(level = "debug", skip(self, supervisor, engine), fields(watcher_id = %self.id()))]
    pub async fn check_for_changes(
        &mut self,
        supervisor: &BrowserSupervisor,
        engine: &SnapshotEngine,
    ) -> Result<WatcherDiff, CoreError> {
        if self.state.status == WatcherStatus::Paused {
            return Err(CoreError::WatcherError(format!("watcher {} is paused", self.id())));
        }
        let Some(baseline) = self.state.baseline_snapshot.clone() else {
            return Err(CoreError::WatcherError(format!("watcher {} has no baseline", self.id())));
        };

        match self.capture(supervisor, engine).await {
            Ok(current) => {
                let diff = compute_diff(&baseline, &current);
                let watcher_diff = WatcherDiff {
                    has_changes: diff.has_changes(),
                    added: diff.added.iter().map(label).collect(),
                    changed: diff.changed.iter().map(label).collect(),
                    removed: diff.removed.iter().map(label).collect(),
                    timestamp: Utc::now(),
                };
                self.state.last_diff = Some(watcher_diff.clone());
                self.state.last_checked_at = Some(Utc::now());
                self.state.last_error = None;
                Ok(watcher_diff)
            }
            Err(err) => {
                self.state.status = WatcherStatus::Error;
                self.state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn capture(&self, supervisor: &BrowserSupervisor, engine: &SnapshotEngine) -> Result<Snapshot, CoreError> {
        let client = supervisor.ensure_browser().await?;
        let (tab_id, session_id) = resolve_page_target(&client, supervisor, &self.state.config.url).await?;

        let options = SnapshotOptions {
            format: self.state.config.format,
            filter: self.state.config.filter,
            max_tokens: self.state.config.max_tokens,
        };
        engine
            .take_snapshot(&client, &tab_id, self.state.config.url.clone(), String::new(), Some(&session_id), &options)
            .await
    }
}

/// Resolve a page target to monitor: the supervisor's current tab if it
/// still exists and is a `page` target; otherwise the first `page` target;
/// otherwise a freshly created `about:blank` target. Attaches and navigates
/// to `url`, returning the target id and the attached session id.
async fn resolve_page_target(client: &CdpClient, supervisor: &BrowserSupervisor, url: &str) -> Result<(String, String), CoreError> {
    let targets: scoutbrowser_cdp::protocol::target_domain::GetTargetsResult =
        client.send("Target.getTargets", Some(GetTargetsParams::default()), None).await?;

    let preferred = supervisor.active_tab_id().await;
    let page_targets: Vec<_> = targets.target_infos.iter().filter(|t| t.target_type == "page").collect();

    let target_id = preferred
        .as_deref()
        .and_then(|id| page_targets.iter().find(|t| t.target_id == id))
        .or_else(|| page_targets.first())
        .map(|t| t.target_id.clone());

    let target_id = match target_id {
        Some(id) => id,
        None => {
            let created: scoutbrowser_cdp::protocol::target_domain::CreateTargetResult = client
                .send(
                    "Target.createTarget",
                    Some(CreateTargetParams { url: "about:blank".to_string(), width: None, height: None, browser_context_id: None, background: None, new_window: None }),
                    None,
                )
                .await?;
            created.target_id
        }
    };

    let attached: scoutbrowser_cdp::protocol::target_domain::AttachToTargetResult = client
        .send("Target.attachToTarget", Some(AttachToTargetParams { target_id: target_id.clone(), flatten: Some(true) }), None)
        .await?;
    let session_id = attached.session_id;

    client.send::<_, serde_json::Value>("Page.enable", Some(EnableParams::default()), Some(&session_id)).await?;
    client
        .send::<_, serde_json::Value>(
            "Page.navigate",
            Some(NavigateParams { url: url.to_string(), referrer: None, transition_type: None, frame_id: None }),
            Some(&session_id),
        )
        .await?;

    Ok((target_id, session_id))
}
