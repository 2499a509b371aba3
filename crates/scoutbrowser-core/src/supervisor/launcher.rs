//! Chromium child-process launch: flag assembly, spawn, and discovery.
//!
//! Flag assembly follows the stability-flag list the teacher's own
//! launcher builds (`viewpoint-core/src/browser/launcher/chromium_args.rs`),
//! trimmed and reordered to exactly the fixed set the original spec's §6
//! lists — the teacher's list differs in a few flags and is not reused
//! verbatim. Discovery polls `/json/version` rather than scraping stderr
//! for "DevTools listening on", per the original spec §4.B.

use std::path::Path;
use std::time::{Duration, Instant};

use scoutbrowser_cdp::CdpClient;
use serde::Deserialize;
use tokio::process::{Child, Command};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::CoreError;

const LAUNCH_POLL_INTERVAL: Duration = Duration::from_millis(100);
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(10);

/// The exact Chromium flag set from the original spec §6, excluding the
/// three computed at launch time (`--remote-debugging-port`,
/// `--user-data-dir`, `--headless=new`).
const FIXED_FLAGS: &[&str] = &[
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-default-apps",
    "--disable-extensions",
    "--disable-popup-blocking",
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-extensions-with-background-pages",
    "--disable-ipc-flooding-protection",
    "--disable-hang-monitor",
    "--disable-sync",
    "--metrics-recording-only",
    "--safebrowsing-disable-auto-update",
];

/// Build the full Chromium argument list for one launch.
#[must_use]
pub fn build_chromium_args(port: u16, profile_path: &Path, headless: bool) -> Vec<String> {
    let mut args: Vec<String> = FIXED_FLAGS.iter().map(|s| (*s).to_string()).collect();
    args.push(format!("--remote-debugging-port={port}"));
    args.push(format!("--user-data-dir={}", profile_path.display()));
    if headless {
        args.push("--headless=new".to_string());
    }
    args
}

/// A successfully launched and discovered Chromium child process.
pub(super) struct LaunchedChromium {
    pub child: Child,
    pub pid: u32,
    pub ws_url: String,
}

#[derive(Deserialize)]
struct VersionResponse {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: Option<String>,
}

/// Spawn Chromium, poll `/json/version` until it answers, and return the
/// discovered debugger WebSocket URL. Does not itself connect a
/// [`CdpClient`] — the caller does that so it can clean up the child on a
/// connect failure.
#[instrument(level = "info", skip(config))]
pub(super) async fn launch(config: &Config, port: u16, headless: bool) -> Result<LaunchedChromium, CoreError> {
    let binary = config
        .resolve_browser_binary()
        .ok_or(CoreError::ChromeNotFound)?;

    let profile_path = config.browser_profile();
    tokio::fs::create_dir_all(profile_path)
        .await
        .map_err(|e| CoreError::BrowserError(format!("failed to create profile directory: {e}")))?;

    let args = build_chromium_args(port, profile_path, headless);
    debug!(?args, executable = %binary.display(), "spawning chromium");

    let mut command = Command::new(&binary);
    command.args(&args);
    command.stdout(std::process::Stdio::null());
    command.stderr(std::process::Stdio::null());

    let child = command
        .spawn()
        .map_err(|e| CoreError::BrowserError(format!("failed to spawn chromium: {e}")))?;
    let pid = child.id().ok_or_else(|| CoreError::BrowserError("chromium exited immediately after spawn".into()))?;
    info!(pid, port, "chromium process spawned");

    match poll_for_ready(port).await {
        Ok(ws_url) => Ok(LaunchedChromium { child, pid, ws_url }),
        Err(err) => {
            let mut child = child;
            super::process::stop_child(&mut child, super::process::StopSignal::Kill, Duration::from_secs(5))
                .await
                .ok();
            Err(err)
        }
    }
}

async fn poll_for_ready(port: u16) -> Result<String, CoreError> {
    let url = format!("http://127.0.0.1:{port}/json/version");
    let client = reqwest::Client::new();
    let deadline = Instant::now() + LAUNCH_TIMEOUT;

    loop {
        if let Ok(response) = client.get(&url).send().await {
            if response.status().is_success() {
                let body: VersionResponse = response
                    .json()
                    .await
                    .map_err(|e| CoreError::BrowserError(format!("invalid /json/version body: {e}")))?;
                return body
                    .web_socket_debugger_url
                    .ok_or_else(|| CoreError::BrowserError("missing webSocketDebuggerUrl".into()));
            }
        }
        if Instant::now() >= deadline {
            return Err(CoreError::BrowserError(format!(
                "chromium did not become reachable on port {port} within {LAUNCH_TIMEOUT:?}"
            )));
        }
        tokio::time::sleep(LAUNCH_POLL_INTERVAL).await;
    }
}

/// Best-effort stealth script injection via
/// `Page.addScriptToEvaluateOnNewDocument`. Failures are logged and
/// swallowed by the caller — this is never allowed to fail a launch.
pub(super) async fn inject_stealth_scripts(client: &CdpClient) -> Result<(), scoutbrowser_cdp::CdpError> {
    let params = scoutbrowser_cdp::protocol::page::AddScriptToEvaluateOnNewDocumentParams {
        source: STEALTH_SCRIPT.to_string(),
        world_name: None,
        include_command_line_api: None,
        run_immediately: None,
    };
    let _: scoutbrowser_cdp::protocol::page::AddScriptToEvaluateOnNewDocumentResult = client
        .send("Page.addScriptToEvaluateOnNewDocument", Some(params), None)
        .await?;
    Ok(())
}

const STEALTH_SCRIPT: &str = r"Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn build_chromium_args_includes_fixed_flags_and_computed_ones() {
        let args = build_chromium_args(9222, &PathBuf::from("/tmp/profile"), true);
        assert!(args.contains(&"--no-first-run".to_string()));
        assert!(args.contains(&"--remote-debugging-port=9222".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
        assert!(args.contains(&"--headless=new".to_string()));
    }

    #[test]
    fn build_chromium_args_omits_headless_flag_when_headed() {
        let args = build_chromium_args(9222, &PathBuf::from("/tmp/profile"), false);
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
    }
}
