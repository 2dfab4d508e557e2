// src/exec/supervisor.rs

//! Process supervisor: owns the single job slot and the child lifecycle.

use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};
use tracing::{debug, error, info, warn};

use crate::config::ConfigFile;
use crate::errors::LaunchError;
use crate::exec::cancel::{CancelController, terminate};
use crate::exec::job::{ScriptJob, write_input};
use crate::exec::pump::spawn_pump;
use crate::exec::queue::{LineSender, LogLine, Origin, line_queue};
use crate::exec::state::{
    ProcessHandle, RunHandle, RunOutcome, RunState, SharedRunState, lock,
};
use crate::sink::LogSink;

/// Timing knobs for a supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOptions {
    /// Time between SIGTERM and SIGKILL on cancellation.
    pub cancel_grace: Duration,
    /// Max time to wait for stdout/stderr EOF (and the stdin writer) after
    /// the child has exited.
    pub drain_timeout: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            cancel_grace: Duration::from_secs(3),
            drain_timeout: Duration::from_secs(2),
        }
    }
}

impl SupervisorOptions {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            cancel_grace: cfg.cancel_grace,
            drain_timeout: cfg.drain_timeout,
        }
    }
}

/// Runs at most one [`ScriptJob`] at a time and reports into a [`LogSink`].
///
/// Cheap to clone; clones share the same job slot and log.
#[derive(Debug, Clone)]
pub struct Supervisor {
    state: SharedRunState,
    sink: LogSink,
    options: SupervisorOptions,
}

impl Supervisor {
    pub fn new(sink: LogSink, options: SupervisorOptions) -> Self {
        Self {
            state: Arc::new(Mutex::new(RunState::default())),
            sink,
            options,
        }
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    pub fn options(&self) -> SupervisorOptions {
        self.options
    }

    pub fn canceller(&self) -> CancelController {
        CancelController::new(Arc::clone(&self.state))
    }

    /// See [`CancelController::cancel`].
    pub async fn cancel(&self) -> Option<RunOutcome> {
        self.canceller().cancel().await
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).is_running()
    }

    pub fn exit_code(&self) -> Option<i32> {
        lock(&self.state).exit_code()
    }

    pub fn last_outcome(&self) -> Option<RunOutcome> {
        lock(&self.state).last_outcome().cloned()
    }

    pub fn pid(&self) -> Option<u32> {
        lock(&self.state).pid()
    }

    /// Start `job`.
    ///
    /// Fails fast with [`LaunchError::AlreadyRunning`] (touching neither the
    /// run state nor the log) if a job is active. Otherwise the previous
    /// exit code and outcome are cleared, the log is reset and the child is
    /// spawned; spawn failures are reported in the log as well as returned. Must be called from within a Tokio runtime.
    pub fn start(&self, job: ScriptJob) -> Result<RunHandle, LaunchError> {
        let mut state = lock(&self.state);
        if state.running {
            let running = state.running_script().unwrap_or_default().to_string();
            debug!(script = %job.script_id, running = %running, "start rejected; a job is already running");
            return Err(LaunchError::AlreadyRunning { running });
        }
        // The previous run's result no longer describes this slot.
        state.exit_code = None;
        state.last_outcome = None;

        self.sink.reset();
        self.sink.set_busy(true);
        self.sink.append_system(format!(
            "Executing {} with interpreter: {}",
            job.script_path.display(),
            job.interpreter.as_deref().unwrap_or("(none)")
        ));

        let mut child = match spawn_child(&job) {
            Ok(child) => child,
            Err(err) => {
                error!(script = %job.script_id, error = %err, "failed to launch script");
                self.sink.append_system(format!("Error running script: {err}"));
                self.sink.set_busy(false);
                return Err(err);
            }
        };

        let pid = child.id();
        info!(script = %job.script_id, pid = ?pid, program = %job.program(), "script started");

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let (done_tx, done_rx) = watch::channel(None);

        state.running = true;
        state.process = Some(ProcessHandle {
            pid,
            script: job.script_id.clone(),
            cancel_tx: Some(cancel_tx),
            finished: done_rx.clone(),
        });
        drop(state);

        let (tx, rx) = line_queue();
        let forwarder = self.sink.spawn_forwarder(rx);

        let stdin = child.stdin.take();
        let mut streams = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            streams.push(spawn_pump(stdout, Origin::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            streams.push(spawn_pump(stderr, Origin::Stderr, tx.clone()));
        }
        if let Some(stdin) = stdin {
            streams.push(spawn_input_writer(stdin, job.input_payload(), tx.clone()));
        }

        let handle = RunHandle::new(job.script_id.clone(), pid, done_rx);

        let ctx = JobContext {
            job,
            child,
            tx,
            streams,
            forwarder,
            cancel_rx,
            done_tx,
            state: Arc::clone(&self.state),
            sink: self.sink.clone(),
            options: self.options,
        };
        tokio::spawn(run_job(ctx));

        Ok(handle)
    }
}

fn spawn_child(job: &ScriptJob) -> Result<Child, LaunchError> {
    if !job.script_path.exists() {
        return Err(LaunchError::ScriptMissing {
            path: job.script_path.clone(),
        });
    }

    let mut cmd = match &job.interpreter {
        Some(interp) => {
            let mut c = Command::new(interp);
            c.arg(&job.script_path);
            c
        }
        None => Command::new(&job.script_path),
    };

    if let Some(dir) = &job.working_dir {
        cmd.current_dir(dir);
    }

    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group so cancellation reaches grandchildren too.
    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn().map_err(|source| {
        let program = job.program();
        if source.kind() == ErrorKind::NotFound {
            LaunchError::NotFound { program }
        } else {
            LaunchError::Spawn { program, source }
        }
    })
}

/// Write the payload (if any) on its own task, then close stdin.
///
/// A broken pipe is reported in the log; the run carries on since the child
/// is free to ignore its input.
fn spawn_input_writer(
    mut stdin: ChildStdin,
    payload: Option<String>,
    tx: LineSender,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let Some(payload) = payload else {
            return 0;
        };
        match write_input(&mut stdin, &payload).await {
            Ok(()) => {
                let _ = tx.send(LogLine::system(format!("Input data sent: {payload}")));
            }
            Err(err) => {
                warn!(error = %err, "failed to write input to child");
                let _ = tx.send(LogLine::system(format!("Failed to send input data: {err}")));
            }
        }
        drop(stdin);
        1
    })
}

struct JobContext {
    job: ScriptJob,
    child: Child,
    tx: LineSender,
    /// Stdout/stderr pumps and the stdin writer.
    streams: Vec<JoinHandle<usize>>,
    forwarder: JoinHandle<usize>,
    cancel_rx: oneshot::Receiver<()>,
    done_tx: watch::Sender<Option<RunOutcome>>,
    state: SharedRunState,
    sink: LogSink,
    options: SupervisorOptions,
}

async fn run_job(ctx: JobContext) {
    let JobContext {
        job,
        mut child,
        tx,
        streams,
        forwarder,
        mut cancel_rx,
        done_tx,
        state,
        sink,
        options,
    } = ctx;

    let outcome = tokio::select! {
        status = child.wait() => match status {
            Ok(status) => classify_exit(status),
            Err(err) => {
                error!(script = %job.script_id, error = %err, "waiting for child failed");
                RunOutcome::Errored(err.to_string())
            }
        },
        Ok(()) = &mut cancel_rx => {
            match terminate(&mut child, options.cancel_grace).await {
                Ok(status) => debug!(script = %job.script_id, ?status, "cancelled child exited"),
                Err(err) => warn!(script = %job.script_id, error = %err, "error while reaping cancelled child"),
            }
            RunOutcome::Cancelled
        }
    };

    match &outcome {
        RunOutcome::Success => info!(script = %job.script_id, "script completed"),
        RunOutcome::Failed(code) => warn!(script = %job.script_id, exit_code = code, "script failed"),
        RunOutcome::Cancelled => info!(script = %job.script_id, "script cancelled"),
        RunOutcome::Errored(_) => {}
    }

    finish_streams(streams, options.drain_timeout).await;

    let _ = tx.send(LogLine::system(outcome.status_line()));
    drop(tx);
    if let Err(err) = forwarder.await {
        error!(script = %job.script_id, error = %err, "log forwarder failed");
    }

    {
        let mut state = lock(&state);
        state.running = false;
        state.process = None;
        state.exit_code = outcome.exit_code();
        state.last_outcome = Some(outcome.clone());
    }
    sink.set_busy(false);
    done_tx.send_replace(Some(outcome));
}

/// Give the pumps and stdin writer until `drain_timeout` to finish, then
/// abort the stragglers (e.g. a detached grandchild still holding a pipe).
async fn finish_streams(streams: Vec<JoinHandle<usize>>, drain_timeout: Duration) {
    let started = Instant::now();
    for mut handle in streams {
        let remaining = drain_timeout.saturating_sub(started.elapsed());
        if timeout(remaining, &mut handle).await.is_err() {
            warn!("stream still open after drain timeout; abandoning it");
            handle.abort();
            let _ = handle.await;
        }
    }
}

fn classify_exit(status: ExitStatus) -> RunOutcome {
    if status.success() {
        RunOutcome::Success
    } else {
        RunOutcome::Failed(exit_code(status))
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| -sig))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
