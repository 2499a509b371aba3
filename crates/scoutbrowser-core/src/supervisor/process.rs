//! Child process termination: signal, grace period, escalate to kill.
//!
//! Grounded on the teacher's `kill_and_reap_async`/`_sync` pair
//! (`viewpoint-core/src/browser/process.rs`) — same "always reap, never
//! leave a zombie" discipline, adapted from `std::process::Child`'s
//! blocking `wait()` to `tokio::process::Child`'s async `wait()`, and from
//! an unconditional kill to the original spec's signal-then-grace-then-kill
//! escalation.

use std::time::Duration;

use tokio::process::Child;
use tracing::{info, warn};

/// The signal a caller asks [`stop_child`] to send before escalating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// Request graceful termination (`SIGTERM` on Unix).
    Term,
    /// Skip straight to an unconditional kill (`SIGKILL` on Unix).
    Kill,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::Term
    }
}

/// Send `signal`, wait up to `grace` for the child to exit, and escalate to
/// `SIGKILL` if it hasn't. Always reaps the process before returning
/// `Ok(())` so no zombie is left behind.
pub(super) async fn stop_child(child: &mut Child, signal: StopSignal, grace: Duration) -> Result<(), String> {
    if let Some(pid) = child.id() {
        if signal == StopSignal::Term {
            send_term(pid);
        } else {
            let _ = child.start_kill();
        }
    } else {
        // Already reaped by someone else.
        return Ok(());
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => {
            info!(?status, "browser process exited");
            return Ok(());
        }
        Ok(Err(err)) => {
            warn!(error = %err, "error waiting for browser process exit");
        }
        Err(_) => {
            warn!(grace_ms = grace.as_millis(), "browser process did not exit within grace period, sending KILL");
        }
    }

    child
        .start_kill()
        .map_err(|e| format!("failed to send SIGKILL: {e}"))?;
    child
        .wait()
        .await
        .map(|status| {
            info!(?status, "browser process killed and reaped");
        })
        .map_err(|e| format!("failed to reap browser process after kill: {e}"))
}

#[cfg(unix)]
fn send_term(pid: u32) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;
    if let Err(err) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        warn!(error = %err, pid, "failed to send SIGTERM, will rely on grace-period kill escalation");
    }
}

#[cfg(not(unix))]
fn send_term(_pid: u32) {}
