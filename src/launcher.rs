// src/launcher.rs

//! Collaborator-facing surface: start a script by name, cancel it, read the
//! log.
//!
//! Nothing here returns an error to the caller; failures end up as lines in
//! the log (plus a `tracing` event), so a front end never has to handle them
//! separately.

use std::path::Path;

use tracing::{info, warn};

use crate::config::ConfigFile;
use crate::errors::LaunchError;
use crate::exec::{ExecutorBackend, RunHandle, RunOutcome, Supervisor, SupervisorOptions};
use crate::registry::{ScriptRegistry, base_dir};
use crate::sink::LogSink;

pub const ALREADY_RUNNING_LINE: &str = "A script is already running. Please wait.";

pub struct Launcher<B: ExecutorBackend = Supervisor> {
    registry: ScriptRegistry,
    backend: B,
}

impl Launcher<Supervisor> {
    /// Production wiring: registry from `cfg`, scripts resolved relative to
    /// `config_path`, a fresh supervisor and log.
    pub fn from_config(cfg: &ConfigFile, config_path: &Path) -> Self {
        let registry = ScriptRegistry::from_config(cfg, &base_dir(cfg, config_path));
        let supervisor = Supervisor::new(LogSink::new(), SupervisorOptions::from_config(cfg));
        Self::new(registry, supervisor)
    }
}

impl<B: ExecutorBackend> Launcher<B> {
    pub fn new(registry: ScriptRegistry, backend: B) -> Self {
        Self { registry, backend }
    }

    pub fn registry(&self) -> &ScriptRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn log(&self) -> &LogSink {
        self.backend.log()
    }

    pub fn is_running(&self) -> bool {
        self.backend.is_running()
    }

    /// Resolve `script` (identifier or display name) with the operator's
    /// `values` and start it.
    ///
    /// Returns the run handle when a child was started, `None` otherwise;
    /// the reason is always in the log.
    ///
    /// Only an actual launch resets the log. An unknown script, a rejected
    /// input value or an already-running job appends its line to whatever the
    /// log currently holds, usually the previous run's output.
    pub fn start(&self, script: &str, values: &[String]) -> Option<RunHandle> {
        if self.backend.is_running() {
            warn!(script, "start requested while another script is running");
            self.log().append_system(ALREADY_RUNNING_LINE);
            return None;
        }

        let job = match self.registry.resolve_job(script, values) {
            Ok(job) => job,
            Err(err) => {
                warn!(script, error = %err, "could not resolve script");
                self.log().append_system(err.to_string());
                return None;
            }
        };

        info!(
            script = %job.script_id,
            inputs = ?job.arguments,
            "running script"
        );

        match self.backend.start(job) {
            Ok(handle) => Some(handle),
            Err(LaunchError::AlreadyRunning { .. }) => {
                // Lost a race with another start after the check above.
                self.log().append_system(ALREADY_RUNNING_LINE);
                None
            }
            // Launch failures are already in the log.
            Err(_) => None,
        }
    }

    /// Cancel the running script, if any, and wait for it to stop.
    pub async fn cancel(&self) -> Option<RunOutcome> {
        self.backend.cancel().await
    }
}
