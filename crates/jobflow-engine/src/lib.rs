//! Step-execution orchestration for jobflow.
//!
//! The engine resolves a job's current step against the workflow catalog,
//! invokes the step's action and condition routines, classifies their
//! `ERROR:`-prefixed output, and records completed steps in the job log.
//!
//! ```text
//! EngineServices
//!   ├── JobController   - start jobs, list workflows, ping
//!   ├── StepExecutor    - step lookup, dropdowns, action → condition
//!   │     └── ProcedureInvoker ──► RoutineSubstrate
//!   └── JobLog          - append-only step records, job reads
//! ```
//!
//! All store work runs on the blocking pool under a time bound.

mod blocking;
pub mod controller;
pub mod error;
pub mod executor;
pub mod interpreter;
pub mod invoker;
pub mod job_log;
pub mod registry;
pub mod services;

pub use controller::JobController;
pub use error::{EngineError, Result};
pub use executor::{RoutineKind, StepExecutor, StepOutcome};
pub use interpreter::{ERROR_PREFIX, RoutineResult, classify};
pub use invoker::{CommitMode, ProcedureInvoker, RoutineSubstrate, SubstrateError};
pub use job_log::JobLog;
pub use registry::{InMemoryRoutines, RoutineCall, RoutineFn};
pub use services::{EngineConfig, EngineServices};
