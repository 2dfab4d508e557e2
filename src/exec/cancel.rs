// src/exec/cancel.rs

//! Cancellation of the in-flight job.
//!
//! The controller only *requests* cancellation; the job task owns the child
//! and performs the termination and the single `running -> false`
//! transition. That keeps the terminal log line exactly-once even when a
//! cancel races natural exit.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::exec::state::{RunOutcome, SharedRunState, lock, wait_for_outcome};

/// Cloneable handle for cancelling whatever job is running.
#[derive(Debug, Clone)]
pub struct CancelController {
    state: SharedRunState,
}

impl CancelController {
    pub(crate) fn new(state: SharedRunState) -> Self {
        Self { state }
    }

    /// Cancel the running job and wait until it has fully finished.
    ///
    /// Returns `None` (and does nothing) when no job is running. Otherwise
    /// returns the job's final outcome, which is `Cancelled` unless the child
    /// exited on its own first.
    pub async fn cancel(&self) -> Option<RunOutcome> {
        let (request, mut finished, script, pid) = {
            let mut state = lock(&self.state);
            if !state.running {
                debug!("cancel requested with no running job; ignoring");
                return None;
            }
            let process = state.process.as_mut()?;
            (
                process.cancel_tx.take(),
                process.finished.clone(),
                process.script.clone(),
                process.pid,
            )
        };

        match request {
            Some(tx) => {
                info!(script = %script, pid = ?pid, "cancellation requested");
                if tx.send(()).is_err() {
                    debug!(script = %script, "job already finishing; waiting for its outcome");
                }
            }
            None => debug!(script = %script, "cancellation already in flight; waiting"),
        }

        Some(wait_for_outcome(&mut finished).await)
    }
}

/// Ask the child to exit, escalating to a hard kill after `grace`, and reap
/// it.
///
/// On Unix the child leads its own process group, so the whole group
/// (including grandchildren still holding our pipes) is signalled.
pub(crate) async fn terminate(child: &mut Child, grace: Duration) -> std::io::Result<ExitStatus> {
    let pid = child.id();
    request_exit(child, pid);

    match timeout(grace, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(pid = ?pid, grace_ms = grace.as_millis() as u64, "child ignored termination request; killing");
            force_kill(child, pid);
            child.wait().await
        }
    }
}

#[cfg(unix)]
fn request_exit(child: &mut Child, pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    if let Err(e) = signal_group(pid, libc::SIGTERM) {
        debug!(pid, error = %e, "SIGTERM to process group failed; signalling child directly");
        if let Err(e) = child.start_kill() {
            debug!(pid, error = %e, "child already gone");
        }
    }
}

#[cfg(not(unix))]
fn request_exit(child: &mut Child, _pid: Option<u32>) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "child already gone");
    }
}

#[cfg(unix)]
fn force_kill(child: &mut Child, pid: Option<u32>) {
    if let Some(pid) = pid {
        if let Err(e) = signal_group(pid, libc::SIGKILL) {
            debug!(pid, error = %e, "SIGKILL to process group failed");
        }
    }
    let _ = child.start_kill();
}

#[cfg(not(unix))]
fn force_kill(child: &mut Child, _pid: Option<u32>) {
    let _ = child.start_kill();
}

/// Send `signal` to the process group led by `pgid`.
#[cfg(unix)]
fn signal_group(pgid: u32, signal: libc::c_int) -> std::io::Result<()> {
    // SAFETY: kill(2) has no memory-safety preconditions; a negative pid
    // addresses the process group.
    let rc = unsafe { libc::kill(-(pgid as libc::pid_t), signal) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::state::RunState;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn cancel_without_running_job_is_a_noop() {
        let state: SharedRunState = Arc::new(Mutex::new(RunState::default()));
        let controller = CancelController::new(Arc::clone(&state));

        assert_eq!(controller.cancel().await, None);
        assert!(!lock(&state).is_running());
        assert!(lock(&state).last_outcome().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_stops_a_sleeping_child() {
        let mut cmd = tokio::process::Command::new("sleep");
        cmd.arg("30").process_group(0).kill_on_drop(true);
        let mut child = cmd.spawn().unwrap();

        let status = timeout(Duration::from_secs(5), terminate(&mut child, Duration::from_secs(2)))
            .await
            .expect("terminate should not hang")
            .unwrap();
        assert!(!status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_escalates_when_sigterm_is_ignored() {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c")
            .arg("trap '' TERM; while true; do sleep 0.05; done")
            .process_group(0)
            .kill_on_drop(true);
        let mut child = cmd.spawn().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let status = timeout(
            Duration::from_secs(5),
            terminate(&mut child, Duration::from_millis(200)),
        )
        .await
        .expect("escalation should not hang")
        .unwrap();
        assert!(!status.success());
    }
}
