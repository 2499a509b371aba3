//! Browser process supervisor.
//!
//! Owns the Chromium child process and the single live [`CdpClient`]
//! connected to it. Launch is lazy and coalesced: concurrent
//! [`BrowserSupervisor::ensure_browser`] callers serialize on an internal
//! `tokio::sync::Mutex` so at most one child process and one CDP client
//! exist at a time, following the same single-in-flight-launch idiom the
//! teacher uses for its own lazy-launch path.

mod launcher;
mod process;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use scoutbrowser_cdp::CdpClient;
use tokio::process::Child;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::{BROWSER_DAEMON_STOP_FAILED, BROWSER_LAUNCH_HEADED_FAILED, CoreError, SCREENSHOT_FAILED};

pub use launcher::build_chromium_args;
pub use process::StopSignal;

const DEFAULT_SIGKILL_GRACE: Duration = Duration::from_secs(5);

/// Hook the Watcher Cron Manager registers with the supervisor so the two
/// components, which depend on each other cyclically, can be wired after
/// both are constructed rather than through a constructor argument.
#[async_trait]
pub trait WatcherLifecycleHook: Send + Sync {
    /// Resume any persisted watcher cron jobs. Called from
    /// [`BrowserSupervisor::start`]; failures are logged, not propagated.
    async fn resume(&self) -> Result<(), CoreError>;

    /// Tear down all watcher cron jobs. Called from
    /// [`BrowserSupervisor::stop`]; failures are logged, not propagated.
    async fn stop_all_cron_jobs(&self) -> Result<(), CoreError>;
}

/// Synthesized view of the supervisor's current state.
#[derive(Debug, Clone)]
pub struct SupervisorStatus {
    /// Whether a Chromium process is currently running and connected.
    pub running: bool,
    /// Chrome process details, present iff `running`.
    pub chrome: Option<ChromeStatus>,
    /// Known tab ids for the active browser.
    pub tabs: Vec<String>,
    /// The tab currently treated as "active" for watcher page resolution.
    pub active_tab_id: Option<String>,
    /// Whether the browser was launched headless.
    pub headless: bool,
    /// The profile directory in use.
    pub profile_path: PathBuf,
    /// Resident memory of the Chromium process, if it could be read.
    pub memory_usage_mb: Option<f64>,
}

/// Chrome process details reported as part of [`SupervisorStatus`].
#[derive(Debug, Clone)]
pub struct ChromeStatus {
    /// OS process id.
    pub pid: u32,
    /// Debugger port Chromium was launched with.
    pub port: u16,
    /// The discovered `webSocketDebuggerUrl`.
    pub web_socket_debugger_url: String,
    /// When the process was launched.
    pub started_at: SystemTime,
}

struct Inner {
    client: Option<Arc<CdpClient>>,
    child: Option<Child>,
    chrome_status: Option<ChromeStatus>,
    tabs: Vec<String>,
    active_tab_id: Option<String>,
    headless: bool,
}

impl Inner {
    fn new(headless: bool) -> Self {
        Self {
            client: None,
            child: None,
            chrome_status: None,
            tabs: Vec::new(),
            active_tab_id: None,
            headless,
        }
    }

    /// Requires `&mut self` because `Child::try_wait` does; callers hold
    /// the supervisor's mutex exclusively regardless, so this never
    /// contends with anything else.
    fn is_healthy(&mut self) -> bool {
        let Some(client) = &self.client else { return false };
        if !client.is_connected() {
            return false;
        }
        match &mut self.child {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

/// Owns exactly one Chromium process and one live [`CdpClient`] at a time.
pub struct BrowserSupervisor {
    config: Config,
    port: u16,
    inner: Mutex<Inner>,
    watcher_hook: RwLock<Option<Arc<dyn WatcherLifecycleHook>>>,
}

impl BrowserSupervisor {
    /// Construct a supervisor from resolved configuration. The browser is
    /// not launched until [`Self::ensure_browser`] is first called.
    #[must_use]
    pub fn new(config: Config, port: u16, headless: bool) -> Self {
        Self {
            config,
            port,
            inner: Mutex::new(Inner::new(headless)),
            watcher_hook: RwLock::new(None),
        }
    }

    /// Late-bind the watcher lifecycle hook. Callers wire this after both
    /// the supervisor and the watcher cron manager exist.
    pub async fn set_watcher_hook(&self, hook: Arc<dyn WatcherLifecycleHook>) {
        *self.watcher_hook.write().await = Some(hook);
    }

    /// Best-effort resume hook. Does not launch the browser itself; launch
    /// stays lazy. Failures from the watcher hook are logged, not
    /// propagated — this call always succeeds.
    #[instrument(level = "info", skip(self))]
    pub async fn start(&self) {
        if let Some(hook) = self.watcher_hook.read().await.clone() {
            if let Err(err) = hook.resume().await {
                warn!(error = %err, "watcher resume failed during supervisor start");
            }
        }
    }

    /// Convenience for [`Self::stop`] with the default `TERM` signal.
    pub async fn stop_gracefully(&self) -> Result<(), CoreError> {
        self.stop(StopSignal::default()).await
    }

    /// Cleanly tear down: stop all watcher cron jobs, then stop Chromium.
    #[instrument(level = "info", skip(self))]
    pub async fn stop(&self, signal: process::StopSignal) -> Result<(), CoreError> {
        if let Some(hook) = self.watcher_hook.read().await.clone() {
            if let Err(err) = hook.stop_all_cron_jobs().await {
                warn!(error = %err, "stop_all_cron_jobs failed during supervisor stop");
            }
        }
        self.stop_chrome(signal).await
    }

    async fn stop_chrome(&self, signal: process::StopSignal) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(client) = inner.client.take() {
            client.disconnect().await;
        }
        if let Some(mut child) = inner.child.take() {
            process::stop_child(&mut child, signal, DEFAULT_SIGKILL_GRACE)
                .await
                .map_err(|e| CoreError::BrowserError(format!("{BROWSER_DAEMON_STOP_FAILED}: {e}")))?;
        }
        inner.chrome_status = None;
        inner.tabs.clear();
        inner.active_tab_id = None;
        Ok(())
    }

    /// Return the live CDP client, launching the browser first if
    /// necessary. Concurrent callers serialize on the supervisor's internal
    /// mutex: whichever caller acquires it first performs the launch, and
    /// every later caller observes the already-connected client without
    /// launching again.
    #[instrument(level = "info", skip(self))]
    pub async fn ensure_browser(&self) -> Result<Arc<CdpClient>, CoreError> {
        let mut inner = self.inner.lock().await;
        if inner.is_healthy() {
            if let Some(client) = &inner.client {
                return Ok(client.clone());
            }
        }
        if let Some(mut stale) = inner.child.take() {
            warn!("replacing a stale/unhealthy chromium process before relaunch");
            process::stop_child(&mut stale, process::StopSignal::Kill, DEFAULT_SIGKILL_GRACE).await.ok();
        }
        inner.client = None;

        info!(port = self.port, headless = inner.headless, "launching chromium");
        let launched = launcher::launch(&self.config, self.port, inner.headless)
            .await
            .inspect_err(|_| {
                debug!("chromium launch failed, no cleanup necessary (nothing was spawned)");
            })?;

        let client = match CdpClient::connect(&launched.ws_url).await {
            Ok(client) => Arc::new(client),
            Err(err) => {
                let mut child = launched.child;
                process::stop_child(&mut child, process::StopSignal::Kill, DEFAULT_SIGKILL_GRACE).await.ok();
                return Err(CoreError::Cdp(err));
            }
        };

        if let Err(err) = launcher::inject_stealth_scripts(&client).await {
            warn!(error = %err, "stealth script injection failed, continuing without it");
        }

        inner.client = Some(client.clone());
        inner.child = Some(launched.child);
        inner.chrome_status = Some(ChromeStatus {
            pid: launched.pid,
            port: self.port,
            web_socket_debugger_url: launched.ws_url,
            started_at: SystemTime::now(),
        });
        Ok(client)
    }

    /// Stop the current browser, flip headless on, and relaunch. Watcher
    /// cron jobs keep running — this is a browser restart, not a service
    /// shutdown.
    pub async fn launch_headless(&self) -> Result<Arc<CdpClient>, CoreError> {
        self.restart_with_headless(true).await
    }

    /// Stop the current browser, flip headless off, and relaunch. Watcher
    /// cron jobs keep running — this is a browser restart, not a service
    /// shutdown.
    pub async fn launch_headed(&self) -> Result<Arc<CdpClient>, CoreError> {
        self.restart_with_headless(false)
            .await
            .map_err(|e| CoreError::BrowserError(format!("{BROWSER_LAUNCH_HEADED_FAILED}: {e}")))
    }

    async fn restart_with_headless(&self, headless: bool) -> Result<Arc<CdpClient>, CoreError> {
        self.stop_chrome(process::StopSignal::Term).await?;
        {
            let mut inner = self.inner.lock().await;
            inner.headless = headless;
        }
        self.ensure_browser().await
    }

    /// Capture a screenshot of the active tab and write it under the
    /// configured screenshots directory. Returns the absolute path written.
    pub async fn take_screenshot(&self, quality: u8) -> Result<PathBuf, CoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.is_healthy() {
            return Err(CoreError::BrowserNotRunning);
        }
        let client = inner.client.clone().expect("healthy implies client is set");
        drop(inner);

        let data = scoutbrowser_cdp::protocol::page::CaptureScreenshotParams {
            format: Some(scoutbrowser_cdp::protocol::page::ScreenshotFormat::Jpeg),
            quality: Some(quality),
            clip: None,
            from_surface: Some(true),
            capture_beyond_viewport: None,
        };
        let result: scoutbrowser_cdp::protocol::page::CaptureScreenshotResult = client
            .send("Page.captureScreenshot", Some(data), None)
            .await
            .map_err(|e| CoreError::BrowserError(format!("{SCREENSHOT_FAILED}: {e}")))?;

        let bytes = base64_decode(&result.data)
            .map_err(|e| CoreError::BrowserError(format!("{SCREENSHOT_FAILED}: invalid base64: {e}")))?;

        tokio::fs::create_dir_all(self.config.browser_screenshots())
            .await
            .map_err(|e| CoreError::BrowserError(format!("{SCREENSHOT_FAILED}: {e}")))?;

        let epoch_ms = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let path = self.config.browser_screenshots().join(format!("screenshot-{epoch_ms}.jpg"));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CoreError::BrowserError(format!("{SCREENSHOT_FAILED}: {e}")))?;

        Ok(path)
    }

    /// A synthesized view of the supervisor's current state.
    pub async fn get_status(&self) -> SupervisorStatus {
        let mut inner = self.inner.lock().await;
        let running = inner.is_healthy();
        SupervisorStatus {
            running,
            chrome: if running { inner.chrome_status.clone() } else { None },
            tabs: inner.tabs.clone(),
            active_tab_id: inner.active_tab_id.clone(),
            headless: inner.headless,
            profile_path: self.config.browser_profile().to_path_buf(),
            memory_usage_mb: inner.chrome_status.as_ref().and_then(|s| read_memory_usage_mb(s.pid)),
        }
    }

    /// Normalize the tracked tab set and active-tab choice: the preferred
    /// tab wins if it still exists, otherwise the first known tab does.
    pub async fn update_tab_state(&self, tabs: Vec<String>, preferred_active: Option<&str>) {
        let mut inner = self.inner.lock().await;
        let active = preferred_active
            .filter(|id| tabs.iter().any(|t| t == id))
            .map(String::from)
            .or_else(|| tabs.first().cloned());
        inner.tabs = tabs;
        inner.active_tab_id = active;
    }

    /// The tab currently treated as active, if any.
    pub async fn active_tab_id(&self) -> Option<String> {
        self.inner.lock().await.active_tab_id.clone()
    }
}

fn read_memory_usage_mb(pid: u32) -> Option<f64> {
    #[cfg(target_os = "linux")]
    {
        let status = std::fs::read_to_string(format!("/proc/{pid}/status")).ok()?;
        for line in status.lines() {
            if let Some(rest) = line.strip_prefix("VmRSS:") {
                let kb: f64 = rest.trim().trim_end_matches(" kB").trim().parse().ok()?;
                return Some(kb / 1024.0);
            }
        }
        None
    }
    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("ps")
            .args(["-o", "rss=", "-p", &pid.to_string()])
            .output()
            .ok()?;
        let kb: f64 = String::from_utf8_lossy(&output.stdout).trim().parse().ok()?;
        Some(kb / 1024.0)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        let _ = pid;
        None
    }
}

fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    // Minimal base64 (standard alphabet, padded) decoder: the only consumer
    // is screenshot bytes from CDP, which are always standard-padded.
    const TABLE: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut reverse = [255u8; 256];
    for (i, &c) in TABLE.iter().enumerate() {
        reverse[c as usize] = i as u8;
    }

    let clean: Vec<u8> = input.bytes().filter(|b| *b != b'\n' && *b != b'\r').collect();
    let mut out = Vec::with_capacity(clean.len() / 4 * 3);
    for chunk in clean.chunks(4) {
        let mut buf = [0u8; 4];
        let mut pad = 0;
        for (i, &b) in chunk.iter().enumerate() {
            if b == b'=' {
                pad += 1;
                buf[i] = 0;
            } else {
                let v = reverse[b as usize];
                if v == 255 {
                    return Err(format!("invalid base64 byte {b}"));
                }
                buf[i] = v;
            }
        }
        let n = (u32::from(buf[0]) << 18) | (u32::from(buf[1]) << 12) | (u32::from(buf[2]) << 6) | u32::from(buf[3]);
        out.push((n >> 16) as u8);
        if pad < 2 {
            out.push((n >> 8) as u8);
        }
        if pad < 1 {
            out.push(n as u8);
        }
    }
    Ok(out)
}

/// Fake [`WatcherLifecycleHook`] used only by this crate's own tests.
#[cfg(test)]
pub(crate) struct NoopWatcherHook {
    pub resume_calls: std::sync::atomic::AtomicU32,
    pub stop_calls: std::sync::atomic::AtomicU32,
}

#[cfg(test)]
#[async_trait]
impl WatcherLifecycleHook for NoopWatcherHook {
    async fn resume(&self) -> Result<(), CoreError> {
        self.resume_calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    async fn stop_all_cron_jobs(&self) -> Result<(), CoreError> {
        self.stop_calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
