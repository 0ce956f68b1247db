//! Job allocation and catalog reads.

use std::sync::Arc;
use std::time::Duration;

use jobflow_store::{CatalogStorage, StoreError, Workflow};
use tracing::warn;

use crate::blocking::run_bounded;
use crate::error::{EngineError, Result};

pub struct JobController {
    catalog: Arc<dyn CatalogStorage>,
    store_timeout: Duration,
}

impl JobController {
    pub fn new(catalog: Arc<dyn CatalogStorage>, store_timeout: Duration) -> Self {
        Self {
            catalog,
            store_timeout,
        }
    }

    /// Allocate a job for `workflow_id` with its cursor on the first step.
    pub async fn start_job(&self, workflow_id: i64) -> Result<i64> {
        if workflow_id <= 0 {
            return Err(EngineError::Validation(format!(
                "workflow id must be positive, got {workflow_id}"
            )));
        }

        let catalog = Arc::clone(&self.catalog);
        run_bounded(self.store_timeout, move || {
            catalog.start_job(workflow_id).map_err(|err| match err {
                StoreError::Timeout(d) => EngineError::Timeout(d),
                other => {
                    warn!(workflow_id, error = %other, "Job start rejected");
                    EngineError::JobStart(other.to_string())
                }
            })
        })
        .await
    }

    /// Non-hidden workflows, ordered by id.
    pub async fn list_workflows(&self) -> Result<Vec<Workflow>> {
        let catalog = Arc::clone(&self.catalog);
        run_bounded(self.store_timeout, move || {
            catalog.list_workflows().map_err(Into::into)
        })
        .await
    }

    /// Round-trip to the store with no side effects.
    pub async fn ping(&self) -> Result<()> {
        let catalog = Arc::clone(&self.catalog);
        run_bounded(self.store_timeout, move || catalog.ping().map_err(Into::into)).await
    }
}
