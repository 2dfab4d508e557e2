use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use scriptrunner::errors::LaunchError;
use scriptrunner::exec::{ExecutorBackend, LogLine, RunHandle, RunOutcome, ScriptJob};
use scriptrunner::sink::LogSink;

/// A fake executor that:
/// - records which jobs were "run"
/// - immediately finishes each with the configured outcome, appending the
///   matching status line to its log.
pub struct FakeExecutor {
    log: LogSink,
    outcome: RunOutcome,
    executed: Arc<Mutex<Vec<ScriptJob>>>,
}

impl FakeExecutor {
    pub fn new(executed: Arc<Mutex<Vec<ScriptJob>>>) -> Self {
        Self::with_outcome(executed, RunOutcome::Success)
    }

    pub fn with_outcome(executed: Arc<Mutex<Vec<ScriptJob>>>, outcome: RunOutcome) -> Self {
        Self {
            log: LogSink::new(),
            outcome,
            executed,
        }
    }
}

impl ExecutorBackend for FakeExecutor {
    fn start(&self, job: ScriptJob) -> Result<RunHandle, LaunchError> {
        self.log.reset();
        let script = job.script_id.clone();
        {
            let mut guard = self.executed.lock().unwrap();
            guard.push(job);
        }
        self.log.append(LogLine::system(self.outcome.status_line()));
        Ok(RunHandle::completed(script, self.outcome.clone()))
    }

    fn cancel(&self) -> Pin<Box<dyn Future<Output = Option<RunOutcome>> + Send + '_>> {
        Box::pin(async { None })
    }

    fn log(&self) -> &LogSink {
        &self.log
    }

    fn is_running(&self) -> bool {
        false
    }
}
