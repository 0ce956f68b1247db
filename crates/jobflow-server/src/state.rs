//! Application state shared across handlers.

use std::sync::Arc;

use jobflow_engine::EngineServices;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Engine services (controller, executor, job log).
    pub engine: EngineServices,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(engine: EngineServices, config: ServerConfig) -> Self {
        Self {
            engine,
            config: Arc::new(config),
        }
    }
}
