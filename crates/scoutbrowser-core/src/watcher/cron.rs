//! Binds watchers to an external cron scheduler, persists registry state,
//! and routes diffs to the notification sink.
//!
//! The cron scheduler and conversation-store notification sink are
//! external collaborators, out of scope per the original spec §1; this
//! module defines only the trait boundary they must satisfy.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use super::notify::{NotificationSink, send_watcher_notification};
use super::registry::WatcherRegistry;
use super::{Watcher, WatcherConfig, WatcherState};
use crate::error::CoreError;
use crate::snapshot::SnapshotEngine;
use crate::supervisor::BrowserSupervisor;

/// An error from a [`CronScheduler`] operation.
#[derive(Debug, Error)]
#[error("cron scheduler error: {0}")]
pub struct CronError(pub String);

/// A cron job submission: id, 5-field schedule, and an opaque payload the
/// scheduler forwards back unchanged when it fires.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CronJob {
    /// Job id (`"watcher-cron-" + watcherId`).
    pub id: String,
    /// 5-field cron expression, as produced by [`interval_to_cron`].
    pub schedule: String,
    /// The action name the scheduler's execution payload carries.
    pub action: &'static str,
    /// The watcher id this job checks, embedded in the payload.
    pub watcher_id: String,
}

/// The external cron scheduler collaborator. Production wiring lives
/// outside this core; tests use an in-memory fake.
pub trait CronScheduler: Send + Sync {
    /// Submit a job. Replacing an existing id's schedule is the
    /// scheduler's responsibility, not this trait's.
    fn submit(&self, job: CronJob) -> Result<(), CronError>;
    /// Remove a job by id. Removing an unknown id is not an error.
    fn remove(&self, job_id: &str) -> Result<(), CronError>;
}

fn cron_job_id(watcher_id: &str) -> String {
    format!("watcher-cron-{watcher_id}")
}

fn watcher_id_from_job_id(job_id: &str) -> Option<&str> {
    job_id.strip_prefix("watcher-cron-")
}

/// Convert a watcher's interval into a 5-field cron expression.
///
/// Non-hour-aligned multi-hour intervals are rounded down to whole
/// minutes capped at `*/59` — a lossy approximation, by design, preserved
/// from the original spec rather than "fixed."
#[must_use]
pub fn interval_to_cron(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 60.0 {
        return "* * * * *".to_string();
    }
    let minutes = seconds / 60.0;
    if (minutes - 1.0).abs() < f64::EPSILON {
        return "* * * * *".to_string();
    }
    if minutes < 60.0 {
        let m = minutes.round() as u64;
        return format!("*/{m} * * * *");
    }
    let hours = minutes / 60.0;
    if (hours.fract()).abs() < f64::EPSILON {
        let h = hours.round() as u64;
        return if h == 1 { "0 * * * *".to_string() } else { format!("0 */{h} * * *") };
    }
    let m = (minutes.round() as u64).min(59);
    format!("*/{m} * * * *")
}

/// Wraps the [`WatcherRegistry`] and an external [`CronScheduler`],
/// persisting registry state and routing change diffs to a
/// [`NotificationSink`].
pub struct WatcherCronManager {
    registry: RwLock<WatcherRegistry>,
    scheduler: Arc<dyn CronScheduler>,
    notification_sink: Option<Arc<dyn NotificationSink>>,
    persistence_path: PathBuf,
    supervisor: Arc<BrowserSupervisor>,
    snapshot_engine: Arc<SnapshotEngine>,
}

impl WatcherCronManager {
    /// Construct a manager over a fresh, empty registry.
    #[must_use]
    pub fn new(
        capacity: usize,
        scheduler: Arc<dyn CronScheduler>,
        notification_sink: Option<Arc<dyn NotificationSink>>,
        persistence_path: PathBuf,
        supervisor: Arc<BrowserSupervisor>,
        snapshot_engine: Arc<SnapshotEngine>,
    ) -> Self {
        Self {
            registry: RwLock::new(WatcherRegistry::new(capacity)),
            scheduler,
            notification_sink,
            persistence_path,
            supervisor,
            snapshot_engine,
        }
    }

    /// Register a new watcher, submit its cron job, and persist. Rolls
    /// back the registry entry if the scheduler rejects the job.
    #[instrument(level = "info", skip(self, config), fields(url = %config_url(&config)))]
    pub async fn create_watcher(&self, config: PartialWatcherConfig) -> Result<WatcherConfig, CoreError> {
        let watcher_id = {
            let mut registry = self.registry.write().await;
            registry.register(config, &self.supervisor, &self.snapshot_engine).await?
        };

        let job = CronJob {
            id: cron_job_id(&watcher_id.id),
            schedule: interval_to_cron(watcher_id.interval_seconds as f64),
            action: "watcher-check",
            watcher_id: watcher_id.id.clone(),
        };

        if let Err(err) = self.scheduler.submit(job) {
            warn!(error = %err, watcher_id = %watcher_id.id, "cron submission failed, rolling back watcher registration");
            self.registry.write().await.remove(&watcher_id.id);
            return Err(CoreError::WatcherError(format!("cron submission failed: {err}")));
        }

        self.save_watchers().await;
        Ok(watcher_id)
    }

    /// Remove a watcher and its cron job, best-effort.
    pub async fn remove_watcher(&self, id: &str) {
        self.registry.write().await.remove(id);
        if let Err(err) = self.scheduler.remove(&cron_job_id(id)) {
            warn!(error = %err, watcher_id = %id, "cron job removal failed");
        }
        self.save_watchers().await;
    }

    /// Handle a cron firing for `job_id`: run the check, deliver a
    /// notification if the diff has changes. Never propagates an error —
    /// the scheduler must never be disrupted by a watcher failure.
    #[instrument(level = "debug", skip(self))]
    pub async fn handle_cron_execution(&self, job_id: &str) {
        let Some(watcher_id) = watcher_id_from_job_id(job_id) else {
            warn!(job_id, "cron job id did not match the watcher-cron- prefix");
            return;
        };

        let mut registry = self.registry.write().await;
        let Some(watcher) = registry.get_mut(watcher_id) else {
            warn!(watcher_id, "cron fired for an unknown watcher");
            return;
        };

        let diff = match watcher.check_for_changes(&self.supervisor, &self.snapshot_engine).await {
            Ok(diff) => diff,
            Err(err) => {
                warn!(error = %err, watcher_id, "watcher check failed");
                return;
            }
        };
        let url = watcher.config().url.clone();
        drop(registry);

        self.save_watchers().await;

        if !diff.has_changes {
            return;
        }
        let Some(sink) = &self.notification_sink else { return };
        if let Err(err) = send_watcher_notification(sink.as_ref(), watcher_id, &url, &diff).await {
            warn!(error = %err, watcher_id, "notification delivery failed");
        }
    }

    /// On startup: read the persistence file, hydrate the registry, and
    /// submit a fresh cron job per watcher. Missing file is a no-op;
    /// corrupt content warns and starts empty.
    #[instrument(level = "info", skip(self))]
    pub async fn resume_watchers(&self) -> Result<(), CoreError> {
        let states = match tokio::fs::read_to_string(&self.persistence_path).await {
            Ok(contents) => match serde_json::from_str::<Vec<WatcherState>>(&contents) {
                Ok(states) => states,
                Err(err) => {
                    warn!(error = %err, path = %self.persistence_path.display(), "corrupt watchers.json, starting empty");
                    return Ok(());
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                warn!(error = %err, path = %self.persistence_path.display(), "failed to read watchers.json, starting empty");
                return Ok(());
            }
        };

        let mut registry = self.registry.write().await;
        registry.deserialize(states);
        let ids: Vec<String> = registry.list().iter().map(|w| w.id().to_string()).collect();
        drop(registry);

        for watcher_id in ids {
            let registry = self.registry.read().await;
            let Some(watcher) = registry.get(&watcher_id) else { continue };
            let interval = watcher.config().interval_seconds as f64;
            drop(registry);

            let job = CronJob {
                id: cron_job_id(&watcher_id),
                schedule: interval_to_cron(interval),
                action: "watcher-check",
                watcher_id: watcher_id.clone(),
            };
            if let Err(err) = self.scheduler.submit(job) {
                warn!(error = %err, watcher_id, "failed to resubmit cron job on resume");
            }
        }
        info!("watcher resume complete");
        Ok(())
    }

    /// Best-effort removal of every watcher's cron job.
    pub async fn stop_all_cron_jobs(&self) {
        let registry = self.registry.read().await;
        for watcher in registry.list() {
            if let Err(err) = self.scheduler.remove(&cron_job_id(watcher.id())) {
                warn!(error = %err, watcher_id = %watcher.id(), "failed to remove cron job during shutdown");
            }
        }
    }

    /// Serialize the registry to pretty JSON and atomically write it to
    /// the persistence path (tmp-file then rename). I/O errors are
    /// logged and swallowed — persistence must never crash the watcher
    /// system.
    pub async fn save_watchers(&self) {
        let states: Vec<WatcherState> = self.registry.read().await.list().iter().map(|w| w.serialize()).collect();
        if let Err(err) = write_watchers_atomically(&self.persistence_path, &states).await {
            warn!(error = %err, path = %self.persistence_path.display(), "failed to persist watchers.json");
        }
    }
}

async fn write_watchers_atomically(path: &Path, states: &[WatcherState]) -> Result<(), std::io::Error> {
    let json = serde_json::to_string_pretty(states).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

fn config_url(config: &PartialWatcherConfig) -> &str {
    &config.url
}

/// Caller-supplied fields for [`WatcherCronManager::create_watcher`];
/// mirrors [`super::registry::WatcherRegistration`].
pub type PartialWatcherConfig = super::registry::WatcherRegistration;
