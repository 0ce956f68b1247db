//! Error types for the orchestration engine.

use std::time::Duration;

use jobflow_store::StoreError;
use thiserror::Error;

use crate::executor::RoutineKind;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by engine operations.
///
/// Every variant carries a human-readable message; none are swallowed.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or missing caller input. Never retried automatically.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No step definition for the given key.
    #[error("Step {step_id} not found in workflow {workflow_id}")]
    StepNotFound { workflow_id: i64, step_id: i64 },

    /// The step declares no dropdown source.
    #[error("No dropdown view specified for step {step_id} of workflow {workflow_id}")]
    NoDropdownConfigured { workflow_id: i64, step_id: i64 },

    /// The step declares no routine of the requested kind.
    #[error("No {kind} procedure specified for step {step_id} of workflow {workflow_id}")]
    NoRoutineConfigured {
        kind: RoutineKind,
        workflow_id: i64,
        step_id: i64,
    },

    /// Unknown job id.
    #[error("Job not found: {0}")]
    JobNotFound(i64),

    /// The routine is missing or raised while executing.
    #[error("Routine '{routine}' failed: {message}")]
    Invocation { routine: String, message: String },

    /// The routine produced no output row.
    #[error("Routine '{routine}' returned no result")]
    NoResult { routine: String },

    /// The routine reported an error through the `ERROR:` sentinel.
    /// Displays as the routine's own message.
    #[error("{0}")]
    RoutineReported(String),

    /// The store refused to allocate a job.
    #[error("Failed to start job: {0}")]
    JobStart(String),

    /// The step log append failed and was rolled back.
    #[error("Failed to write step log: {0}")]
    LogWrite(String),

    /// A store interaction exceeded its time bound.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Any other store failure (connectivity, schema).
    #[error("Store error: {0}")]
    Store(StoreError),

    /// A blocking task panicked or was cancelled.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout(d) => EngineError::Timeout(d),
            other => EngineError::Store(other),
        }
    }
}

impl EngineError {
    /// Whether retrying the whole operation unchanged may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Invocation { .. }
                | EngineError::NoResult { .. }
                | EngineError::LogWrite(_)
                | EngineError::Timeout(_)
                | EngineError::Store(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_timeout_maps_to_timeout() {
        let err: EngineError = StoreError::Timeout(Duration::from_millis(5)).into();
        assert!(matches!(err, EngineError::Timeout(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_routine_reported_displays_verbatim() {
        let err = EngineError::RoutineReported("bad value".into());
        assert_eq!(err.to_string(), "bad value");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_no_routine_message_names_kind() {
        let err = EngineError::NoRoutineConfigured {
            kind: RoutineKind::Condition,
            workflow_id: 1,
            step_id: 2,
        };
        assert!(err.to_string().contains("condition"));
    }
}
