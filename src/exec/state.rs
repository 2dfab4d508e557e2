// src/exec/state.rs

//! Run state shared between the supervisor, its job task and the
//! cancellation controller.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{oneshot, watch};

pub const SUCCESS_LINE: &str = "Script completed successfully.";
pub const CANCELLED_LINE: &str = "Script cancelled.";

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Exit code 0.
    Success,
    /// Non-zero exit (negative signal number if killed by a signal).
    Failed(i32),
    /// Terminated through the cancellation controller.
    Cancelled,
    /// The orchestration itself failed after spawn (e.g. waiting on the child).
    Errored(String),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunOutcome::Success => Some(0),
            RunOutcome::Failed(code) => Some(*code),
            RunOutcome::Cancelled | RunOutcome::Errored(_) => None,
        }
    }

    /// The terminal line appended to the log for this outcome.
    pub fn status_line(&self) -> String {
        match self {
            RunOutcome::Success => SUCCESS_LINE.to_string(),
            RunOutcome::Failed(code) => format!("Script exited with error code: {code}"),
            RunOutcome::Cancelled => CANCELLED_LINE.to_string(),
            RunOutcome::Errored(msg) => format!("Error running script: {msg}"),
        }
    }
}

/// Handle to the live child, present exactly while a job is running.
#[derive(Debug)]
pub(crate) struct ProcessHandle {
    pub pid: Option<u32>,
    pub script: String,
    /// Taken by the first `cancel()`; later callers only wait.
    pub cancel_tx: Option<oneshot::Sender<()>>,
    pub finished: watch::Receiver<Option<RunOutcome>>,
}

/// Mutable state of the single job slot.
///
/// `process.is_some()` iff `running`; both are changed in the same critical
/// section.
#[derive(Debug, Default)]
pub struct RunState {
    pub(crate) running: bool,
    pub(crate) process: Option<ProcessHandle>,
    pub(crate) exit_code: Option<i32>,
    pub(crate) last_outcome: Option<RunOutcome>,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn last_outcome(&self) -> Option<&RunOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.pid)
    }

    pub fn running_script(&self) -> Option<&str> {
        self.process.as_ref().map(|p| p.script.as_str())
    }
}

pub(crate) type SharedRunState = Arc<Mutex<RunState>>;

/// Lock the run state, recovering from a poisoned mutex.
///
/// Nothing holds this lock across an `.await` or while calling out to user
/// code, so a poisoned lock still contains consistent data.
pub(crate) fn lock(state: &SharedRunState) -> MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Returned by a successful `start`; resolves once the job has fully
/// finished (terminal line appended, `running` cleared).
#[derive(Debug, Clone)]
pub struct RunHandle {
    script: String,
    pid: Option<u32>,
    finished: watch::Receiver<Option<RunOutcome>>,
}

impl RunHandle {
    pub(crate) fn new(
        script: String,
        pid: Option<u32>,
        finished: watch::Receiver<Option<RunOutcome>>,
    ) -> Self {
        Self {
            script,
            pid,
            finished,
        }
    }

    /// A handle for a run that already ended, for executors that never
    /// spawn a real process.
    pub fn completed(script: impl Into<String>, outcome: RunOutcome) -> Self {
        let (_tx, rx) = watch::channel(Some(outcome));
        Self::new(script.into(), None, rx)
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Outcome if the job has already finished.
    pub fn outcome(&self) -> Option<RunOutcome> {
        (*self.finished.borrow()).clone()
    }

    pub async fn wait(&mut self) -> RunOutcome {
        wait_for_outcome(&mut self.finished).await
    }
}

pub(crate) async fn wait_for_outcome(rx: &mut watch::Receiver<Option<RunOutcome>>) -> RunOutcome {
    match rx.wait_for(Option::is_some).await {
        Ok(outcome) => (*outcome)
            .clone()
            .unwrap_or_else(|| RunOutcome::Errored("run finished without an outcome".to_string())),
        Err(_) => RunOutcome::Errored("run task ended without reporting an outcome".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines_match_log_contract() {
        assert_eq!(RunOutcome::Success.status_line(), "Script completed successfully.");
        assert_eq!(RunOutcome::Failed(3).status_line(), "Script exited with error code: 3");
        assert_eq!(RunOutcome::Cancelled.status_line(), "Script cancelled.");
        assert_eq!(
            RunOutcome::Errored("boom".into()).status_line(),
            "Error running script: boom"
        );
    }

    #[tokio::test]
    async fn completed_handle_resolves_immediately() {
        let mut handle = RunHandle::completed("noop", RunOutcome::Failed(2));
        assert_eq!(handle.outcome(), Some(RunOutcome::Failed(2)));
        assert_eq!(handle.wait().await, RunOutcome::Failed(2));
    }
}
