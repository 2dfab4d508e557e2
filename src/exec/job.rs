// src/exec/job.rs

//! `ScriptJob` and the stdin wire format.
//!
//! The child receives its arguments as one JSON array of strings followed by
//! `\n`, after which stdin is closed. An empty argument list sends nothing.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::errors::StreamError;

/// One invocation of a child script. Immutable once the child is spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptJob {
    pub script_id: String,
    pub display_name: String,
    pub arguments: Vec<String>,
    pub script_path: PathBuf,
    /// `None` means the script is executed directly.
    pub interpreter: Option<String>,
    pub working_dir: Option<PathBuf>,
}

impl ScriptJob {
    pub fn new(script_id: impl Into<String>, script_path: impl Into<PathBuf>) -> Self {
        let script_id = script_id.into();
        Self {
            display_name: script_id.clone(),
            script_id,
            arguments: Vec::new(),
            script_path: script_path.into(),
            interpreter: None,
            working_dir: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_arguments<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = Some(interpreter.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// The executable actually spawned: the interpreter if there is one,
    /// otherwise the script itself.
    pub fn program(&self) -> String {
        match &self.interpreter {
            Some(interp) => interp.clone(),
            None => self.script_path.display().to_string(),
        }
    }

    /// Serialized stdin payload (without the trailing newline).
    pub fn input_payload(&self) -> Option<String> {
        encode_input(&self.arguments)
    }
}

/// Encode an argument list in the wire format, or `None` if there is
/// nothing to send.
pub fn encode_input(args: &[String]) -> Option<String> {
    if args.is_empty() {
        return None;
    }
    // A list of strings always serializes.
    serde_json::to_string(args).ok()
}

/// Decode one wire-format line back into the argument list.
pub fn decode_input(line: &str) -> serde_json::Result<Vec<String>> {
    serde_json::from_str(line.trim_end_matches(['\r', '\n']))
}

/// Write `payload` plus the line terminator and flush.
pub async fn write_input<W>(writer: &mut W, payload: &str) -> Result<(), StreamError>
where
    W: AsyncWrite + Unpin,
{
    let write = async {
        writer.write_all(payload.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await
    };
    write.await.map_err(|source| StreamError::Write { source })
}
