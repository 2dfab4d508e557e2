// src/config/validate.rs

use std::collections::HashMap;

use crate::config::model::{ConfigFile, RawConfigFile, ScriptConfig};
use crate::errors::{Result, ScriptRunnerError};
use crate::types::{InputKind, parse_duration};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ScriptRunnerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_scripts(&raw)?;
        let cancel_grace = parse_launcher_duration("cancel_grace", &raw.launcher.cancel_grace)?;
        let drain_timeout =
            parse_launcher_duration("drain_timeout", &raw.launcher.drain_timeout)?;
        validate_scripts(&raw)?;
        validate_unique_names(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.launcher,
            raw.script,
            cancel_grace,
            drain_timeout,
        ))
    }
}

fn ensure_has_scripts(cfg: &RawConfigFile) -> Result<()> {
    if cfg.script.is_empty() {
        return Err(ScriptRunnerError::ConfigError(
            "config must contain at least one [script.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn parse_launcher_duration(key: &str, value: &str) -> Result<std::time::Duration> {
    parse_duration(value).map_err(|e| {
        ScriptRunnerError::ConfigError(format!("[launcher].{key} = {value:?} is invalid: {e}"))
    })
}

fn validate_scripts(cfg: &RawConfigFile) -> Result<()> {
    for (id, script) in cfg.script.iter() {
        if script.name.trim().is_empty() {
            return Err(ScriptRunnerError::ConfigError(format!(
                "script '{id}' has an empty `name`"
            )));
        }
        if script.script.trim().is_empty() {
            return Err(ScriptRunnerError::ConfigError(format!(
                "script '{id}' has an empty `script` path"
            )));
        }
        validate_inputs(id, script)?;
    }
    Ok(())
}

fn validate_inputs(id: &str, script: &ScriptConfig) -> Result<()> {
    for input in script.inputs.iter() {
        match input.kind {
            InputKind::Dropdown => {
                if let Some(default) = input.default.as_deref() {
                    if !input.options.is_empty() && !input.options.iter().any(|o| o == default) {
                        return Err(ScriptRunnerError::ConfigError(format!(
                            "script '{id}': dropdown '{}' default {default:?} is not one of its options",
                            input.label
                        )));
                    }
                }
            }
            InputKind::Action => {
                if input.default.is_some() || !input.options.is_empty() {
                    return Err(ScriptRunnerError::ConfigError(format!(
                        "script '{id}': action '{}' cannot have a default or options",
                        input.label
                    )));
                }
            }
            InputKind::Text => {
                if !input.options.is_empty() {
                    return Err(ScriptRunnerError::ConfigError(format!(
                        "script '{id}': text input '{}' cannot have options",
                        input.label
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_unique_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (id, script) in cfg.script.iter() {
        if let Some(other) = seen.insert(script.name.trim(), id.as_str()) {
            return Err(ScriptRunnerError::ConfigError(format!(
                "scripts '{other}' and '{id}' share the display name '{}'",
                script.name.trim()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::load_from_str;
    use crate::errors::ScriptRunnerError;
    use crate::types::InputKind;

    #[test]
    fn rejects_config_without_scripts() {
        let err = load_from_str("[launcher]\ninterpreter = \"sh\"\n").unwrap_err();
        assert!(err.to_string().contains("at least one"), "got: {err}");
    }

    #[test]
    fn rejects_bad_durations() {
        let toml = r#"
            [launcher]
            cancel_grace = "soon"

            [script.a]
            name = "A"
            script = "a.sh"
        "#;
        let err = load_from_str(toml).unwrap_err();
        assert!(err.to_string().contains("cancel_grace"), "got: {err}");
    }

    #[test]
    fn oversized_duration_is_a_config_error() {
        let toml = r#"
            [launcher]
            cancel_grace = "99999999999999999h"

            [script.a]
            name = "A"
            script = "a.sh"
        "#;
        let err = load_from_str(toml).unwrap_err();
        assert!(matches!(err, ScriptRunnerError::ConfigError(_)), "got: {err:?}");
        assert!(err.to_string().contains("too large"), "got: {err}");
    }

    #[test]
    fn button_kind_is_accepted_as_action() {
        let toml = r#"
            [script.a]
            name = "A"
            script = "a.sh"

            [[script.a.inputs]]
            label = "Open docs"
            kind = "button"
        "#;
        let cfg = load_from_str(toml).unwrap();
        assert_eq!(cfg.script["a"].inputs[0].kind, InputKind::Action);
    }

    #[test]
    fn rejects_dropdown_default_outside_options() {
        let toml = r#"
            [script.a]
            name = "A"
            script = "a.sh"

            [[script.a.inputs]]
            label = "Branch"
            kind = "dropdown"
            default = "dev"
            options = ["main", "release"]
        "#;
        let err = load_from_str(toml).unwrap_err();
        assert!(err.to_string().contains("not one of its options"), "got: {err}");
    }

    #[test]
    fn rejects_duplicate_display_names() {
        let toml = r#"
            [script.a]
            name = "Build"
            script = "a.sh"

            [script.b]
            name = "Build"
            script = "b.sh"
        "#;
        let err = load_from_str(toml).unwrap_err();
        assert!(err.to_string().contains("share the display name"), "got: {err}");
    }

    #[test]
    fn applies_launcher_defaults() {
        let toml = r#"
            [script.a]
            name = "A"
            script = "a.sh"
        "#;
        let cfg = load_from_str(toml).unwrap();
        assert_eq!(cfg.cancel_grace, std::time::Duration::from_secs(3));
        assert_eq!(cfg.drain_timeout, std::time::Duration::from_secs(2));
        assert!(!cfg.launcher.packaged);
        assert!(cfg.launcher.interpreter.is_none());
    }
}
