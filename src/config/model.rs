// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::types::InputKind;

/// Top-level configuration exactly as read from a TOML file.
///
/// ```toml
/// [launcher]
/// interpreter = "python3"
/// scripts_dir = "scripts"
/// cancel_grace = "3s"
///
/// [script.docker_setup]
/// name = "Run Docker Setup"
/// script = "docker_setup.py"
///
/// [[script.docker_setup.inputs]]
/// label = "Image tag"
/// kind = "dropdown"
/// default = "latest"
/// options = ["latest", "stable"]
/// ```
///
/// Nothing here is checked beyond what `serde` enforces; see
/// [`ConfigFile`] for the validated form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Global launcher behaviour from `[launcher]`.
    #[serde(default)]
    pub launcher: LauncherSection,

    /// All scripts from `[script.<id>]`, keyed by script identifier.
    #[serde(default)]
    pub script: BTreeMap<String, ScriptConfig>,
}

/// `[launcher]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LauncherSection {
    /// Interpreter used for scripts that don't override it.
    ///
    /// If unset, scripts are executed directly and must be executable.
    #[serde(default)]
    pub interpreter: Option<String>,

    /// Directory holding the scripts, relative to the base directory.
    #[serde(default)]
    pub scripts_dir: Option<String>,

    /// Resolve scripts next to the running executable instead of next to the
    /// config file (bundled distribution).
    #[serde(default)]
    pub packaged: bool,

    /// How long a cancelled child gets between SIGTERM and SIGKILL.
    #[serde(default = "default_cancel_grace")]
    pub cancel_grace: String,

    /// Upper bound on waiting for stdout/stderr to hit EOF once the child
    /// has exited.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout: String,
}

fn default_cancel_grace() -> String {
    "3s".to_string()
}

fn default_drain_timeout() -> String {
    "2s".to_string()
}

impl Default for LauncherSection {
    fn default() -> Self {
        Self {
            interpreter: None,
            scripts_dir: None,
            packaged: false,
            cancel_grace: default_cancel_grace(),
            drain_timeout: default_drain_timeout(),
        }
    }
}

/// `[script.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptConfig {
    /// Human-readable name shown in listings.
    pub name: String,

    /// Script file, relative to the scripts directory.
    pub script: String,

    /// Per-script interpreter override.
    #[serde(default)]
    pub interpreter: Option<String>,

    /// Free-form hint shown by `--list`.
    #[serde(default)]
    pub hint: Option<String>,

    /// Ordered input fields; their values become the child's argument list.
    #[serde(default)]
    pub inputs: Vec<InputConfig>,
}

/// One `[[script.<id>.inputs]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub label: String,

    #[serde(default)]
    pub kind: InputKind,

    #[serde(default)]
    pub default: Option<String>,

    /// Allowed values for `dropdown` inputs.
    #[serde(default)]
    pub options: Vec<String>,
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)` (see
/// `config::validate`), so durations are already parsed and every script has
/// a usable name and path.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub launcher: LauncherSection,
    pub script: BTreeMap<String, ScriptConfig>,
    pub cancel_grace: Duration,
    pub drain_timeout: Duration,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        launcher: LauncherSection,
        script: BTreeMap<String, ScriptConfig>,
        cancel_grace: Duration,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            launcher,
            script,
            cancel_grace,
            drain_timeout,
        }
    }

    /// Effective interpreter for a script: its own override, else the
    /// launcher default.
    pub fn interpreter_for<'a>(&'a self, script: &'a ScriptConfig) -> Option<&'a str> {
        script
            .interpreter
            .as_deref()
            .or(self.launcher.interpreter.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}
