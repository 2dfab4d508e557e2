// src/config/mod.rs

//! Configuration loading and validation for `scriptrunner`.
//!
//! - [`model`] defines the TOML shape (`[launcher]`, `[script.<id>]`).
//! - [`loader`] reads a file from disk.
//! - [`validate`] turns a `RawConfigFile` into a checked `ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{ConfigFile, InputConfig, LauncherSection, RawConfigFile, ScriptConfig};
