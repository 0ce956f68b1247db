//! Engine services facade.

use std::sync::Arc;
use std::time::Duration;

use jobflow_store::{CatalogStorage, JobLogStorage, Store};
use tracing::info;

use crate::controller::JobController;
use crate::executor::StepExecutor;
use crate::invoker::{ProcedureInvoker, RoutineSubstrate};
use crate::job_log::JobLog;

/// Runtime settings for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on every store interaction.
    pub store_timeout: Duration,
    /// Run condition routines under `CommitMode::Commit`.
    pub commit_conditions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(30),
            commit_conditions: false,
        }
    }
}

impl EngineConfig {
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_commit_conditions(mut self, commit: bool) -> Self {
        self.commit_conditions = commit;
        self
    }
}

impl From<&jobflow_config::EngineConfig> for EngineConfig {
    fn from(config: &jobflow_config::EngineConfig) -> Self {
        Self {
            store_timeout: config.store_timeout(),
            commit_conditions: config.commit_conditions,
        }
    }
}

/// Unified entry point for transport layers.
#[derive(Clone)]
pub struct EngineServices {
    controller: Arc<JobController>,
    executor: Arc<StepExecutor>,
    log: Arc<JobLog>,
}

impl EngineServices {
    pub fn new(
        catalog: Arc<dyn CatalogStorage>,
        log: Arc<dyn JobLogStorage>,
        routines: Arc<dyn RoutineSubstrate>,
        config: EngineConfig,
    ) -> Self {
        info!(
            store_timeout_secs = config.store_timeout.as_secs_f64(),
            commit_conditions = config.commit_conditions,
            "Initializing engine services"
        );

        let invoker = ProcedureInvoker::new(routines, config.store_timeout);
        Self {
            controller: Arc::new(JobController::new(catalog.clone(), config.store_timeout)),
            executor: Arc::new(StepExecutor::new(
                catalog,
                invoker,
                config.store_timeout,
                config.commit_conditions,
            )),
            log: Arc::new(JobLog::new(log, config.store_timeout)),
        }
    }

    /// Catalog, log and routines all served by one SQLite store.
    pub fn from_store(store: Arc<Store>, config: EngineConfig) -> Self {
        Self::new(store.clone(), store.clone(), store, config)
    }

    pub fn controller(&self) -> &JobController {
        &self.controller
    }

    pub fn executor(&self) -> &StepExecutor {
        &self.executor
    }

    pub fn log(&self) -> &JobLog {
        &self.log
    }
}
