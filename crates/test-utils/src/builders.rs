#![allow(dead_code)]

use std::collections::BTreeMap;

use scriptrunner::config::{ConfigFile, InputConfig, LauncherSection, RawConfigFile, ScriptConfig};
use scriptrunner::types::InputKind;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                launcher: LauncherSection::default(),
                script: BTreeMap::new(),
            },
        }
    }

    pub fn with_script(mut self, id: &str, script: ScriptConfig) -> Self {
        self.config.script.insert(id.to_string(), script);
        self
    }

    pub fn interpreter(mut self, interpreter: &str) -> Self {
        self.config.launcher.interpreter = Some(interpreter.to_string());
        self
    }

    pub fn scripts_dir(mut self, dir: &str) -> Self {
        self.config.launcher.scripts_dir = Some(dir.to_string());
        self
    }

    pub fn cancel_grace(mut self, duration: &str) -> Self {
        self.config.launcher.cancel_grace = duration.to_string();
        self
    }

    pub fn drain_timeout(mut self, duration: &str) -> Self {
        self.config.launcher.drain_timeout = duration.to_string();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ScriptConfig`.
pub struct ScriptConfigBuilder {
    script: ScriptConfig,
}

impl ScriptConfigBuilder {
    pub fn new(name: &str, script: &str) -> Self {
        Self {
            script: ScriptConfig {
                name: name.to_string(),
                script: script.to_string(),
                interpreter: None,
                hint: None,
                inputs: vec![],
            },
        }
    }

    pub fn interpreter(mut self, interpreter: &str) -> Self {
        self.script.interpreter = Some(interpreter.to_string());
        self
    }

    pub fn hint(mut self, hint: &str) -> Self {
        self.script.hint = Some(hint.to_string());
        self
    }

    pub fn text(mut self, label: &str, default: Option<&str>) -> Self {
        self.script.inputs.push(InputConfig {
            label: label.to_string(),
            kind: InputKind::Text,
            default: default.map(str::to_string),
            options: vec![],
        });
        self
    }

    pub fn dropdown(mut self, label: &str, default: Option<&str>, options: &[&str]) -> Self {
        self.script.inputs.push(InputConfig {
            label: label.to_string(),
            kind: InputKind::Dropdown,
            default: default.map(str::to_string),
            options: options.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn action(mut self, label: &str) -> Self {
        self.script.inputs.push(InputConfig {
            label: label.to_string(),
            kind: InputKind::Action,
            default: None,
            options: vec![],
        });
        self
    }

    pub fn build(self) -> ScriptConfig {
        self.script
    }
}
