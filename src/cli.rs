// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `scriptrunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scriptrunner",
    version,
    about = "Run build/automation scripts and stream their output.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the script registry (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Script to run, by identifier or display name.
    #[arg(long, value_name = "SCRIPT")]
    pub script: Option<String>,

    /// Value for the next input field of the script (repeatable, in order).
    ///
    /// Fields without a value use their configured default.
    #[arg(long = "input", value_name = "VALUE")]
    pub inputs: Vec<String>,

    /// List the registered scripts and their inputs, then exit.
    #[arg(long)]
    pub list: bool,

    /// Resolve the job and print what would be run, without running it.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCRIPTRUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
