// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running scripts with
//! `tokio::process::Command` and feeding their output into the log.
//!
//! - [`job`] defines `ScriptJob` and the stdin wire format.
//! - [`queue`] is the per-run line queue shared by all producers.
//! - [`pump`] drains one child stream into the queue.
//! - [`supervisor`] owns the single job slot and the child lifecycle.
//! - [`cancel`] requests termination of the running job.
//! - [`state`] holds the shared run state and outcome types.
//! - [`backend`] provides the `ExecutorBackend` trait so the launcher can be
//!   driven by a fake executor in tests.

pub mod backend;
pub mod cancel;
pub mod job;
pub mod pump;
pub mod queue;
pub mod state;
pub mod supervisor;

pub use backend::ExecutorBackend;
pub use cancel::CancelController;
pub use job::{ScriptJob, decode_input, encode_input};
pub use queue::{LogLine, Origin};
pub use state::{RunHandle, RunOutcome};
pub use supervisor::{Supervisor, SupervisorOptions};
