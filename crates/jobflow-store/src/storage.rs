//! Storage abstraction traits consumed by the orchestration engine.
//!
//! ```text
//! CatalogStorage (trait)   - workflow/step lookups, job allocation, dropdown reads
//!     └── Store            - SQLite implementation
//!
//! JobLogStorage (trait)    - append-only step log and job cursor
//!     └── Store            - SQLite implementation
//! ```
//!
//! Implementations are blocking; callers that run on an async executor are
//! expected to move calls onto a blocking thread.

use crate::Result;
use crate::store::Store;
use crate::types::{Job, NewStepRecord, StepDefinition, StepLogRecord, StepRecordAck, Workflow};

/// Read-only workflow catalog plus job allocation.
pub trait CatalogStorage: Send + Sync {
    /// Non-hidden workflows, ordered by id.
    fn list_workflows(&self) -> Result<Vec<Workflow>>;

    /// Definition of one step, `None` if absent.
    fn get_step(&self, workflow_id: i64, step_id: i64) -> Result<Option<StepDefinition>>;

    /// Allocate a job with its cursor on the workflow's first step.
    fn start_job(&self, workflow_id: i64) -> Result<i64>;

    /// First-column values of a named view or table.
    fn query_first_column(&self, source: &str) -> Result<Vec<String>>;

    /// Side-effect free connectivity check.
    fn ping(&self) -> Result<()>;
}

/// Append-only job step log.
pub trait JobLogStorage: Send + Sync {
    /// Append one record in a single transaction.
    fn append_step_record(&self, record: &NewStepRecord) -> Result<StepRecordAck>;

    /// All records for a job, oldest first.
    fn list_step_records(&self, job_id: i64) -> Result<Vec<StepLogRecord>>;

    /// Current state of a job.
    fn get_job(&self, job_id: i64) -> Result<Job>;
}

impl CatalogStorage for Store {
    fn list_workflows(&self) -> Result<Vec<Workflow>> {
        Store::list_workflows(self)
    }

    fn get_step(&self, workflow_id: i64, step_id: i64) -> Result<Option<StepDefinition>> {
        Store::get_step(self, workflow_id, step_id)
    }

    fn start_job(&self, workflow_id: i64) -> Result<i64> {
        Store::start_job(self, workflow_id)
    }

    fn query_first_column(&self, source: &str) -> Result<Vec<String>> {
        Store::query_first_column(self, source)
    }

    fn ping(&self) -> Result<()> {
        Store::ping(self)
    }
}

impl JobLogStorage for Store {
    fn append_step_record(&self, record: &NewStepRecord) -> Result<StepRecordAck> {
        Store::append_step_record(self, record)
    }

    fn list_step_records(&self, job_id: i64) -> Result<Vec<StepLogRecord>> {
        Store::list_step_records(self, job_id)
    }

    fn get_job(&self, job_id: i64) -> Result<Job> {
        Store::get_job(self, job_id)
    }
}
