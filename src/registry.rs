// src/registry.rs

//! Static script registry, built once from the config at startup.
//!
//! Maps a script identifier (or its display name) to everything needed to
//! build a [`ScriptJob`]: where the script lives, how to invoke it, and which
//! inputs to collect.

use std::path::{Path, PathBuf};

use crate::config::{ConfigFile, InputConfig};
use crate::errors::{Result, ScriptRunnerError};
use crate::exec::ScriptJob;
use crate::types::InputKind;

/// One operator-facing input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub label: String,
    pub kind: InputKind,
    pub default: Option<String>,
    pub options: Vec<String>,
}

impl From<&InputConfig> for InputField {
    fn from(cfg: &InputConfig) -> Self {
        Self {
            label: cfg.label.clone(),
            kind: cfg.kind,
            default: cfg.default.clone(),
            options: cfg.options.clone(),
        }
    }
}

impl InputField {
    /// Whether this field yields a value for the argument list.
    pub fn takes_value(&self) -> bool {
        self.kind != InputKind::Action
    }
}

/// How to run a script: resolved path, optional interpreter and the
/// directory the child starts in (the scripts directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub script_path: PathBuf,
    pub interpreter: Option<String>,
    pub working_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    pub id: String,
    pub display_name: String,
    pub hint: Option<String>,
    pub inputs: Vec<InputField>,
    pub invocation: Invocation,
}

impl ScriptEntry {
    /// Value-taking fields, in order.
    pub fn value_fields(&self) -> impl Iterator<Item = &InputField> {
        self.inputs.iter().filter(|f| f.takes_value())
    }

    /// Turn operator values into the argument list.
    ///
    /// `values` line up with [`Self::value_fields`]; a missing value falls
    /// back to the field's default. Values are trimmed and empty ones are
    /// dropped. Dropdown values must be one of the field's options when it
    /// has any.
    pub fn collect_arguments(&self, values: &[String]) -> Result<Vec<String>> {
        let fields: Vec<&InputField> = self.value_fields().collect();
        if values.len() > fields.len() {
            return Err(ScriptRunnerError::InvalidInput {
                label: self.display_name.clone(),
                reason: format!(
                    "got {} values but the script takes at most {}",
                    values.len(),
                    fields.len()
                ),
            });
        }

        let mut args = Vec::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            let raw = values
                .get(i)
                .map(String::as_str)
                .or(field.default.as_deref())
                .unwrap_or_default();
            let value = raw.trim();

            if value.is_empty() {
                continue;
            }
            if field.kind == InputKind::Dropdown
                && !field.options.is_empty()
                && !field.options.iter().any(|o| o == value)
            {
                return Err(ScriptRunnerError::InvalidInput {
                    label: field.label.clone(),
                    reason: format!("{value:?} is not one of {:?}", field.options),
                });
            }
            args.push(value.to_string());
        }
        Ok(args)
    }

    pub fn job(&self, arguments: Vec<String>) -> ScriptJob {
        let mut job = ScriptJob::new(self.id.clone(), self.invocation.script_path.clone())
            .with_display_name(self.display_name.clone())
            .with_arguments(arguments)
            .with_working_dir(&self.invocation.working_dir);
        job.interpreter = self.invocation.interpreter.clone();
        job
    }
}

#[derive(Debug, Clone)]
pub struct ScriptRegistry {
    entries: Vec<ScriptEntry>,
}

impl ScriptRegistry {
    /// Build the registry, resolving script paths against `base_dir`.
    pub fn from_config(cfg: &ConfigFile, base_dir: &Path) -> Self {
        let scripts_dir = match cfg.launcher.scripts_dir.as_deref() {
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        };

        let entries = cfg
            .script
            .iter()
            .map(|(id, script)| ScriptEntry {
                id: id.clone(),
                display_name: script.name.trim().to_string(),
                hint: script.hint.clone(),
                inputs: script.inputs.iter().map(InputField::from).collect(),
                invocation: Invocation {
                    script_path: scripts_dir.join(&script.script),
                    interpreter: cfg.interpreter_for(script).map(str::to_string),
                    working_dir: scripts_dir.clone(),
                },
            })
            .collect();

        Self { entries }
    }

    /// Look up by identifier first, then by display name.
    pub fn find(&self, key: &str) -> Option<&ScriptEntry> {
        self.entries
            .iter()
            .find(|e| e.id == key)
            .or_else(|| self.entries.iter().find(|e| e.display_name == key))
    }

    pub fn get(&self, key: &str) -> Result<&ScriptEntry> {
        self.find(key)
            .ok_or_else(|| ScriptRunnerError::ScriptNotFound(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScriptEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a script and operator values into a ready-to-run job.
    pub fn resolve_job(&self, key: &str, values: &[String]) -> Result<ScriptJob> {
        let entry = self.get(key)?;
        let args = entry.collect_arguments(values)?;
        Ok(entry.job(args))
    }
}

/// Directory scripts are resolved against.
///
/// - packaged: the directory of the running executable;
/// - otherwise: the config file's directory, or the current working
///   directory for a bare filename like `Scripts.toml`.
///
/// The result is absolute, since children start inside the scripts
/// directory and a relative script path would no longer resolve there.
pub fn base_dir(cfg: &ConfigFile, config_path: &Path) -> PathBuf {
    if cfg.launcher.packaged {
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            return dir;
        }
    }
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::path::absolute(parent).unwrap_or_else(|_| parent.to_path_buf())
        }
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
