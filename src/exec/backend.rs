// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The launcher talks to an `ExecutorBackend` instead of a concrete
//! [`Supervisor`]. Production code uses the supervisor; tests can provide an
//! implementation that records jobs and reports outcomes without spawning
//! processes.

use std::future::Future;
use std::pin::Pin;

use crate::errors::LaunchError;
use crate::exec::job::ScriptJob;
use crate::exec::state::{RunHandle, RunOutcome};
use crate::exec::supervisor::Supervisor;
use crate::sink::LogSink;

/// Trait abstracting how resolved jobs are executed.
pub trait ExecutorBackend: Send + Sync {
    /// Start a job, failing fast if one is already active.
    fn start(&self, job: ScriptJob) -> Result<RunHandle, LaunchError>;

    /// Cancel the active job and wait for it to finish.
    fn cancel(&self) -> Pin<Box<dyn Future<Output = Option<RunOutcome>> + Send + '_>>;

    /// The log this backend reports into.
    fn log(&self) -> &LogSink;

    fn is_running(&self) -> bool;
}

impl ExecutorBackend for Supervisor {
    fn start(&self, job: ScriptJob) -> Result<RunHandle, LaunchError> {
        Supervisor::start(self, job)
    }

    fn cancel(&self) -> Pin<Box<dyn Future<Output = Option<RunOutcome>> + Send + '_>> {
        // Clone the controller so the future doesn't borrow the state lock.
        let controller = self.canceller();
        Box::pin(async move { controller.cancel().await })
    }

    fn log(&self) -> &LogSink {
        self.sink()
    }

    fn is_running(&self) -> bool {
        Supervisor::is_running(self)
    }
}
