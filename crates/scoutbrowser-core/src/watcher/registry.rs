//! In-memory set of [`Watcher`]s with unique ids and a capacity limit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use super::{DEFAULT_INTERVAL_SECONDS, DEFAULT_MAX_TOKENS, MIN_INTERVAL_SECONDS, Watcher, WatcherConfig, WatcherState};
use crate::error::CoreError;
use crate::snapshot::{SnapshotEngine, SnapshotFilter, SnapshotFormat};
use crate::supervisor::BrowserSupervisor;

/// Caller-supplied fields for registering a new watcher. Anything left
/// `None` is defaulted by [`WatcherRegistry::register`].
#[derive(Debug, Clone, Default)]
pub struct WatcherRegistration {
    /// Caller-chosen id; empty/whitespace-only means "generate one".
    pub id: String,
    /// The URL to monitor.
    pub url: String,
    /// Re-check interval in seconds; non-finite or `<= 0` defaults to
    /// [`DEFAULT_INTERVAL_SECONDS`]; otherwise must be an integer `>= 60`.
    pub interval_seconds: Option<f64>,
    /// Serialization format; defaults to [`SnapshotFormat::Compact`].
    pub format: Option<SnapshotFormat>,
    /// Node filter; defaults to [`SnapshotFilter::Interactive`].
    pub filter: Option<SnapshotFilter>,
    /// Token budget; defaults to [`DEFAULT_MAX_TOKENS`].
    pub max_tokens: Option<usize>,
}

/// In-memory map from watcher id to [`Watcher`], with a capacity limit and
/// a monotonic id counter for generated ids.
pub struct WatcherRegistry {
    capacity: usize,
    watchers: HashMap<String, Watcher>,
    next_id: AtomicU64,
}

impl WatcherRegistry {
    /// Construct an empty registry with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity, watchers: HashMap::new(), next_id: AtomicU64::new(1) }
    }

    /// Register a new watcher: resolve its id, validate its interval, take
    /// its baseline, and store it. The watcher is **not** added if the
    /// baseline capture fails.
    pub async fn register(
        &mut self,
        request: WatcherRegistration,
        supervisor: &BrowserSupervisor,
        engine: &SnapshotEngine,
    ) -> Result<WatcherConfig, CoreError> {
        if self.watchers.len() >= self.capacity {
            return Err(CoreError::WatcherLimitExceeded);
        }

        let id = self.resolve_id(request.id.trim());
        if self.watchers.contains_key(&id) {
            return Err(CoreError::WatcherError(format!("watcher id already exists: {id}")));
        }

        let interval_seconds = resolve_interval(request.interval_seconds)?;

        let config = WatcherConfig {
            id: id.clone(),
            url: request.url,
            interval_seconds,
            format: request.format.unwrap_or(SnapshotFormat::Compact),
            filter: request.filter.unwrap_or(SnapshotFilter::Interactive),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            created_at: Utc::now(),
        };

        let mut watcher = Watcher::new(config.clone());
        watcher.take_baseline(supervisor, engine).await?;

        self.watchers.insert(id, watcher);
        Ok(config)
    }

    /// Look up a watcher by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Watcher> {
        self.watchers.get(id)
    }

    /// Look up a watcher by id, mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Watcher> {
        self.watchers.get_mut(id)
    }

    /// All registered watchers, in arbitrary order.
    #[must_use]
    pub fn list(&self) -> Vec<&Watcher> {
        self.watchers.values().collect()
    }

    /// Remove a watcher by id. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &str) {
        self.watchers.remove(id);
    }

    /// Replace the entire map with hydrated watchers built from persisted
    /// states, lifting the id counter above any persisted `watcher-<N>` id.
    pub fn deserialize(&mut self, states: Vec<WatcherState>) {
        self.watchers.clear();
        for state in states {
            if let Some(n) = parse_generated_id(&state.config.id) {
                self.next_id.fetch_max(n + 1, Ordering::SeqCst);
            }
            let id = state.config.id.clone();
            self.watchers.insert(id, Watcher::from_state(state));
        }
    }

    fn resolve_id(&self, trimmed: &str) -> String {
        if trimmed.is_empty() {
            loop {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst);
                let candidate = format!("watcher-{n:03}");
                if !self.watchers.contains_key(&candidate) {
                    return candidate;
                }
            }
        } else {
            trimmed.to_string()
        }
    }
}

fn parse_generated_id(id: &str) -> Option<u64> {
    id.strip_prefix("watcher-")?.parse().ok()
}

fn resolve_interval(requested: Option<f64>) -> Result<u64, CoreError> {
    match requested {
        None => Ok(DEFAULT_INTERVAL_SECONDS),
        Some(seconds) if !seconds.is_finite() || seconds <= 0.0 => Ok(DEFAULT_INTERVAL_SECONDS),
        Some(seconds) => {
            if seconds.fract() != 0.0 || seconds < MIN_INTERVAL_SECONDS as f64 {
                return Err(CoreError::WatcherError(format!(
                    "interval_seconds must be an integer >= {MIN_INTERVAL_SECONDS}, got {seconds}"
                )));
            }
            Ok(seconds as u64)
        }
    }
}

#[cfg(test)]
mod tests;
