//! Persistent state for jobflow.
//!
//! A single SQLite database holds the read-only workflow catalog, the
//! `routines` procedure store, and the append-only job step log. Schema
//! changes are applied through embedded refinery migrations on open.

mod catalog;
pub mod error;
mod journal;
mod procedures;
pub mod storage;
pub mod store;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod fixtures;

pub use error::{Result, StoreError};
pub use storage::{CatalogStorage, JobLogStorage};
pub use store::{Store, StoreOptions};
pub use types::{
    Job, NewStepRecord, RoutineParam, StepDefinition, StepLogRecord, StepRecordAck, Workflow,
};
