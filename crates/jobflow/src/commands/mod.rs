//! CLI command handlers.

pub mod check;
pub mod config;
pub mod start;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use jobflow_config::LoadedConfig;
use jobflow_store::{Store, StoreOptions};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Server URL to connect to.
    pub server_url: String,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Configuration resolved at startup.
    pub loaded: LoadedConfig,
}

impl Context {
    /// Database file from config, resolved against the config directory.
    pub fn database_path(&self, override_path: Option<&PathBuf>) -> PathBuf {
        match override_path {
            Some(path) => path.clone(),
            None => self
                .loaded
                .config
                .database()
                .resolved_path(self.loaded.base_dir().as_deref()),
        }
    }

    /// Open the store with the configured timeouts.
    pub fn open_store(&self, override_path: Option<&PathBuf>) -> Result<Arc<Store>> {
        let database = self.loaded.config.database();
        let options = StoreOptions {
            busy_timeout: database.busy_timeout(),
            lock_timeout: database.lock_timeout(),
        };
        let path = self.database_path(override_path);
        Ok(Arc::new(Store::open_with_options(&path, options)?))
    }
}
