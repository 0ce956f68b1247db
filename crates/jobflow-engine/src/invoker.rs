//! Routine invocation.
//!
//! ```text
//! ProcedureInvoker ──► RoutineSubstrate (trait)
//!                          ├── Store             - SQL bodies in the `routines` table
//!                          └── InMemoryRoutines  - closures, for tests and embedding
//! ```
//!
//! Invocation is synchronous from the caller's point of view: the invoker
//! waits for the substrate's output or its time bound, whichever comes first.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jobflow_store::{RoutineParam, Store, StoreError};
use thiserror::Error;
use tracing::debug;

use crate::blocking::run_bounded;
use crate::error::{EngineError, Result};
use crate::interpreter::{RoutineResult, classify};

/// Whether a routine's writes are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    Commit,
    ReadOnly,
}

impl CommitMode {
    pub fn commits(self) -> bool {
        matches!(self, CommitMode::Commit)
    }
}

impl fmt::Display for CommitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitMode::Commit => write!(f, "commit"),
            CommitMode::ReadOnly => write!(f, "read-only"),
        }
    }
}

/// Failure reported by a substrate before any output was classified.
#[derive(Debug, Error)]
pub enum SubstrateError {
    #[error("routine '{0}' does not exist")]
    UnknownRoutine(String),

    #[error("routine produced no result row")]
    NoResult,

    #[error("{0}")]
    Failed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Something that can execute a named routine with positional parameters
/// and return its single text output.
///
/// Implementations are blocking.
pub trait RoutineSubstrate: Send + Sync {
    fn execute(
        &self,
        name: &str,
        params: &[RoutineParam],
        mode: CommitMode,
    ) -> std::result::Result<String, SubstrateError>;
}

impl RoutineSubstrate for Store {
    fn execute(
        &self,
        name: &str,
        params: &[RoutineParam],
        mode: CommitMode,
    ) -> std::result::Result<String, SubstrateError> {
        self.call_procedure(name, params, mode.commits())
            .map_err(|err| match err {
                StoreError::UnknownRoutine(name) => SubstrateError::UnknownRoutine(name),
                StoreError::NoRows(_) => SubstrateError::NoResult,
                StoreError::Timeout(d) => SubstrateError::Timeout(d),
                other => SubstrateError::Failed(other.to_string()),
            })
    }
}

/// Invokes routines on a substrate under a time bound and classifies their
/// output.
#[derive(Clone)]
pub struct ProcedureInvoker {
    substrate: Arc<dyn RoutineSubstrate>,
    timeout: Duration,
}

impl ProcedureInvoker {
    pub fn new(substrate: Arc<dyn RoutineSubstrate>, timeout: Duration) -> Self {
        Self { substrate, timeout }
    }

    /// Invoke `routine` with `params` bound in order.
    ///
    /// An `ERROR:`-prefixed output is returned as an error-classified
    /// [`RoutineResult`], not as `Err`.
    pub async fn invoke(
        &self,
        routine: &str,
        params: Vec<RoutineParam>,
        mode: CommitMode,
    ) -> Result<RoutineResult> {
        if routine.trim().is_empty() {
            return Err(EngineError::Validation(
                "routine name must not be empty".to_string(),
            ));
        }

        let substrate = Arc::clone(&self.substrate);
        let name = routine.to_string();
        let raw = run_bounded(self.timeout, move || {
            substrate
                .execute(&name, &params, mode)
                .map_err(|err| substrate_error(&name, err))
        })
        .await?;

        let result = classify(&raw);
        debug!(
            routine,
            %mode,
            is_error = result.is_error,
            "Routine invoked"
        );
        Ok(result)
    }
}

fn substrate_error(routine: &str, err: SubstrateError) -> EngineError {
    match err {
        SubstrateError::NoResult => EngineError::NoResult {
            routine: routine.to_string(),
        },
        SubstrateError::Timeout(d) => EngineError::Timeout(d),
        other => EngineError::Invocation {
            routine: routine.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::InMemoryRoutines;
    use jobflow_store::fixtures::test_store;

    fn store_invoker() -> ProcedureInvoker {
        ProcedureInvoker::new(Arc::new(test_store()), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_success_output() {
        let result = store_invoker()
            .invoke("R_OK", vec![], CommitMode::ReadOnly)
            .await
            .unwrap();
        assert_eq!(result, RoutineResult::success("done"));
    }

    #[tokio::test]
    async fn test_error_sentinel_is_classified_not_raised() {
        let result = store_invoker()
            .invoke("R_FAIL", vec![], CommitMode::Commit)
            .await
            .unwrap();
        assert_eq!(result, RoutineResult::error("bad value"));
    }

    #[tokio::test]
    async fn test_params_bound_in_order() {
        let result = store_invoker()
            .invoke(
                "R_ORDER",
                vec![11.into(), 22.into(), "abc".into()],
                CommitMode::ReadOnly,
            )
            .await
            .unwrap();
        assert_eq!(result.payload, "11|22|abc");
    }

    #[tokio::test]
    async fn test_unknown_routine_is_invocation_error() {
        let err = store_invoker()
            .invoke("R_MISSING", vec![], CommitMode::ReadOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Invocation { ref routine, .. } if routine == "R_MISSING"));
    }

    #[tokio::test]
    async fn test_empty_result_is_no_result() {
        let err = store_invoker()
            .invoke("R_EMPTY", vec![], CommitMode::ReadOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NoResult { .. }));
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let err = store_invoker()
            .invoke("  ", vec![], CommitMode::ReadOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_slow_substrate_times_out() {
        let routines = InMemoryRoutines::new().with_routine("SLOW", |_| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(Some("late".to_string()))
        });
        let invoker = ProcedureInvoker::new(Arc::new(routines), Duration::from_millis(20));
        let err = invoker
            .invoke("SLOW", vec![], CommitMode::ReadOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_mode_reaches_substrate() {
        let routines = Arc::new(InMemoryRoutines::new().returning("R", "x"));
        let invoker = ProcedureInvoker::new(routines.clone(), Duration::from_secs(1));
        invoker.invoke("R", vec![], CommitMode::Commit).await.unwrap();
        invoker.invoke("R", vec![], CommitMode::ReadOnly).await.unwrap();

        let modes: Vec<_> = routines.calls().into_iter().map(|c| c.mode).collect();
        assert_eq!(modes, vec![CommitMode::Commit, CommitMode::ReadOnly]);
    }
}
