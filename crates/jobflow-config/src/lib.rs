//! Configuration system for the jobflow workflow engine.
//!
//! Provides TOML-based configuration with:
//! - `[server]`, `[database]`, `[engine]` and `[logging]` sections
//! - Config file layering (user config dir + project-local overrides)
//! - Defaults for every field, so an empty file is a valid config

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, config_dir, config_path, load_config, load_config_file,
    load_config_with_options, save_config,
};
pub use error::{ConfigError, Result};
pub use types::*;
