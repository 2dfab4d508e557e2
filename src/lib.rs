// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod launcher;
pub mod logging;
pub mod registry;
pub mod sink;
pub mod types;

use std::io::Write;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::exec::{Origin, RunOutcome};
use crate::launcher::Launcher;
use crate::registry::ScriptRegistry;
use crate::sink::{LogEvent, LogSink};

/// Exit status used when the run was cancelled (as for SIGINT).
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and the script registry
/// - the supervisor and its log
/// - streaming the log to stdout
/// - Ctrl-C → cancellation
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = args.config.clone();
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config from {:?}", config_path))?;

    let launcher = Launcher::from_config(&cfg, &config_path);

    if args.list {
        print_registry(launcher.registry());
        return Ok(0);
    }

    let Some(script) = args.script.as_deref() else {
        anyhow::bail!("no script given; use --script <SCRIPT> or --list");
    };

    if args.dry_run {
        let job = launcher.registry().resolve_job(script, &args.inputs)?;
        println!("scriptrunner dry-run");
        println!("  script:      {} ({})", job.display_name, job.script_id);
        println!("  path:        {}", job.script_path.display());
        println!("  interpreter: {}", job.interpreter.as_deref().unwrap_or("(none)"));
        match job.input_payload() {
            Some(payload) => println!("  stdin:       {payload}"),
            None => println!("  stdin:       (empty)"),
        }
        debug!("dry-run complete (no execution)");
        return Ok(0);
    }

    let Some(mut handle) = launcher.start(script, &args.inputs) else {
        print_lines(launcher.log(), 0);
        return Ok(1);
    };
    let renderer = spawn_renderer(launcher.log().clone());

    let outcome = tokio::select! {
        outcome = handle.wait() => outcome,
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                eprintln!("failed to listen for Ctrl+C: {e}");
            }
            info!("interrupt received; cancelling script");
            match launcher.cancel().await {
                Some(outcome) => outcome,
                None => handle.wait().await,
            }
        }
    };

    if renderer.await.is_err() {
        debug!("log renderer ended abnormally");
    }

    Ok(exit_code_for(&outcome))
}

/// Map a run outcome to this process's exit status.
pub fn exit_code_for(outcome: &RunOutcome) -> i32 {
    match outcome {
        RunOutcome::Success => 0,
        RunOutcome::Failed(code) if (1..=255).contains(code) => *code,
        RunOutcome::Failed(_) => 1,
        RunOutcome::Cancelled => CANCELLED_EXIT_CODE,
        RunOutcome::Errored(_) => 1,
    }
}

/// Print log lines as they arrive until the job clears the busy flag.
///
/// Rendering is cursor-based, so subscribing after the job started (or
/// lagging behind) never loses lines.
fn spawn_renderer(sink: LogSink) -> tokio::task::JoinHandle<()> {
    let mut events = sink.subscribe();
    tokio::spawn(async move {
        let mut cursor = print_lines(&sink, 0);
        if !sink.is_busy() {
            print_lines(&sink, cursor);
            return;
        }
        loop {
            match events.recv().await {
                Ok(LogEvent::Reset) => cursor = 0,
                Ok(LogEvent::Line(_)) | Err(RecvError::Lagged(_)) => {
                    cursor = print_lines(&sink, cursor);
                }
                Ok(LogEvent::Busy(false)) => {
                    print_lines(&sink, cursor);
                    break;
                }
                Ok(LogEvent::Busy(true)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Print every entry from `cursor` on and return the new cursor.
fn print_lines(sink: &LogSink, cursor: usize) -> usize {
    let lines = sink.lines_since(cursor);
    let mut stdout = std::io::stdout().lock();
    for line in &lines {
        let _ = match line.origin {
            Origin::Stderr => writeln!(stdout, "! {}", line.text),
            _ => writeln!(stdout, "{}", line.text),
        };
    }
    let _ = stdout.flush();
    cursor + lines.len()
}

fn print_registry(registry: &ScriptRegistry) {
    println!("scripts ({}):", registry.len());
    for entry in registry.iter() {
        println!("  - {} ({})", entry.display_name, entry.id);
        println!("      path: {}", entry.invocation.script_path.display());
        if let Some(ref interp) = entry.invocation.interpreter {
            println!("      interpreter: {interp}");
        }
        if let Some(ref hint) = entry.hint {
            println!("      hint: {hint}");
        }
        for input in entry.inputs.iter() {
            let mut line = format!("      input: {} [{}]", input.label, input.kind);
            if let Some(ref default) = input.default {
                line.push_str(&format!(" default={default:?}"));
            }
            if !input.options.is_empty() {
                line.push_str(&format!(" options={:?}", input.options));
            }
            println!("{line}");
        }
    }
}
