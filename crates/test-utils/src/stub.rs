//! Stub child scripts for exercising the supervisor against real processes.
//!
//! Every stub is a POSIX `sh` script written into its own temp dir; jobs run
//! it with `sh` as the interpreter so no executable bit is needed.

use std::fs;
use std::path::{Path, PathBuf};

use scriptrunner::exec::ScriptJob;
use tempfile::TempDir;

/// A stub script on disk. The directory is removed on drop.
pub struct StubScript {
    dir: TempDir,
    path: PathBuf,
}

impl StubScript {
    /// Write `body` as `<name>.sh` in a fresh temp dir.
    pub fn new(name: &str, body: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir for stub script");
        let path = dir.path().join(format!("{name}.sh"));
        fs::write(&path, body).expect("write stub script");
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// A job running this stub under `sh` with no arguments.
    pub fn job(&self) -> ScriptJob {
        let id = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stub".to_string());
        ScriptJob::new(id, self.path.clone()).with_interpreter("sh")
    }

    pub fn job_with_args<I, S>(&self, args: I) -> ScriptJob
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.job().with_arguments(args)
    }
}

/// Prints `hello` and exits 0.
pub fn hello() -> StubScript {
    StubScript::new("hello", "echo hello\n")
}

/// Exits with `code` without output.
pub fn exit_with(code: i32) -> StubScript {
    StubScript::new("exit_code", &format!("exit {code}\n"))
}

/// Sleeps for `secs`, then prints `woke up`.
pub fn sleeper(secs: u32) -> StubScript {
    StubScript::new("sleeper", &format!("echo started\nsleep {secs}\necho woke up\n"))
}

/// Echoes its single stdin line back on stdout, byte for byte.
pub fn echo_stdin() -> StubScript {
    StubScript::new("echo_stdin", "IFS= read -r line\nprintf '%s\\n' \"$line\"\n")
}

/// Writes `count` numbered lines to stdout and, interleaved, to stderr.
pub fn numbered(count: usize) -> StubScript {
    StubScript::new(
        "numbered",
        &format!(
            "i=0\nwhile [ $i -lt {count} ]; do\n  echo \"out $i\"\n  echo \"err $i\" >&2\n  i=$((i + 1))\ndone\n"
        ),
    )
}

/// Closes stdin without reading it, then succeeds.
pub fn ignores_stdin() -> StubScript {
    StubScript::new("ignores_stdin", "exec 0<&-\necho ignored input\n")
}
