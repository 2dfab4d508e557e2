// src/errors.rs

//! Crate-wide error types.
//!
//! - [`ScriptRunnerError`] covers loading the config and resolving jobs.
//! - [`LaunchError`] is what `Supervisor::start` rejects a job with.
//! - [`StreamError`] is terminal for a single pump or stdin writer only.
//!
//! A child exiting with a non-zero code is *not* an error here; it is a
//! [`crate::exec::RunOutcome::Failed`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptRunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown script: {0}")]
    ScriptNotFound(String),

    #[error("Invalid input for '{label}': {reason}")]
    InvalidInput { label: String, reason: String },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Reasons a job could not be started.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("a script is already running: {running}")]
    AlreadyRunning { running: String },

    #[error("executable not found: {program}")]
    NotFound { program: String },

    #[error("script file does not exist: {}", path.display())]
    ScriptMissing { path: PathBuf },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl LaunchError {
    pub fn is_already_running(&self) -> bool {
        matches!(self, LaunchError::AlreadyRunning { .. })
    }
}

/// A read or write failure on one of the child's pipes.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("reading {stream}: {source}")]
    Read {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("writing input: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ScriptRunnerError>;
