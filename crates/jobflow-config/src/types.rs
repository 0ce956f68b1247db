//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]      # HTTP boundary
//! [database]    # SQLite catalog / job log
//! [engine]      # orchestration timeouts
//! [logging]     # log file output
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default port for the HTTP server.
pub const DEFAULT_PORT: u16 = 5090;

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default database file name.
pub const DEFAULT_DATABASE_FILE: &str = "jobflow.db";

/// Default max REST request body size (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Origin of the bundled web front end.
pub const DEFAULT_CORS_ORIGIN: &str = "http://0.0.0.0:5095";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobflowConfig {
    /// HTTP server configuration.
    pub server: Option<ServerConfig>,

    /// Database configuration.
    pub database: Option<DatabaseConfig>,

    /// Orchestration engine configuration.
    pub engine: Option<EngineConfig>,

    /// Log output configuration.
    pub logging: Option<LoggingConfig>,
}

impl JobflowConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Merging is per section: a section present in `other` replaces the
    /// whole section here.
    pub fn merge(&mut self, other: JobflowConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.engine.is_some() {
            self.engine = other.engine;
        }
        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Server section, or defaults.
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// Database section, or defaults.
    pub fn database(&self) -> DatabaseConfig {
        self.database.clone().unwrap_or_default()
    }

    /// Engine section, or defaults.
    pub fn engine(&self) -> EngineConfig {
        self.engine.clone().unwrap_or_default()
    }

    /// Logging section, or defaults.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Origins allowed by CORS (empty = no CORS headers).
    pub cors_origins: Vec<String>,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Enable per-request logging middleware.
    pub request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            request_logging: true,
        }
    }
}

impl ServerConfig {
    /// Parse `bind` and `port` into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                field: "server.bind".to_string(),
                reason: e.to_string(),
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Database Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite file. Relative paths resolve against the config dir.
    pub path: PathBuf,
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// Maximum wait for the connection guard in milliseconds.
    pub lock_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_FILE),
            busy_timeout_ms: 5_000,
            lock_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    /// Resolve `path` against `base` when it is relative.
    pub fn resolved_path(&self, base: Option<&Path>) -> PathBuf {
        match base {
            Some(base) if self.path.is_relative() => base.join(&self.path),
            _ => self.path.clone(),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Orchestration engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound for any single store interaction, in seconds.
    pub store_timeout_secs: u64,
    /// Commit the transaction around condition routines.
    pub commit_conditions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout_secs: 30,
            commit_conditions: false,
        }
    }
}

impl EngineConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rolling log files. Relative paths resolve against the
    /// config dir.
    pub dir: PathBuf,
    /// Write JSON log files in addition to console output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            json: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
