// src/logging.rs

//! Diagnostics for `scriptrunner` via `tracing` + `tracing-subscriber`.
//!
//! These are the engine's own events (spawns, exits, cancellation, pump
//! errors). They go to STDERR; STDOUT carries the script log view, so the two
//! can be redirected separately.
//!
//! Filter priority:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `SCRIPTRUNNER_LOG`, as `EnvFilter` directives (e.g. `info`,
//!    `scriptrunner::exec=debug`)
//! 3. `warn`

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "SCRIPTRUNNER_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(directive_for(level));
    }
    env.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn directive_for(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_wins_over_env() {
        let filter = build_filter(Some(LogLevel::Debug), Some("error"));
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn env_directives_are_used_when_no_flag() {
        let filter = build_filter(None, Some("scriptrunner=info"));
        assert_eq!(filter.to_string(), "scriptrunner=info");
    }

    #[test]
    fn falls_back_to_warn() {
        assert_eq!(build_filter(None, None).to_string(), "warn");
        assert_eq!(build_filter(None, Some("   ")).to_string(), "warn");
    }
}
