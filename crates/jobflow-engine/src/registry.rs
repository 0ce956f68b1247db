//! In-process routine substrate.
//!
//! Routines are closures keyed by name. Every call is recorded, which makes
//! the registry useful for asserting invocation order and parameters.

use std::collections::HashMap;
use std::sync::Arc;

use jobflow_store::RoutineParam;
use parking_lot::{Mutex, RwLock};

use crate::invoker::{CommitMode, RoutineSubstrate, SubstrateError};

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineCall {
    pub name: String,
    pub params: Vec<RoutineParam>,
    pub mode: CommitMode,
}

/// Routine body: `Ok(Some(output))`, `Ok(None)` for no result, or
/// `Err(message)` for a raised failure.
pub type RoutineFn =
    Arc<dyn Fn(&RoutineCall) -> std::result::Result<Option<String>, String> + Send + Sync>;

#[derive(Default)]
pub struct InMemoryRoutines {
    routines: RwLock<HashMap<String, RoutineFn>>,
    calls: Mutex<Vec<RoutineCall>>,
}

impl InMemoryRoutines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_routine<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&RoutineCall) -> std::result::Result<Option<String>, String> + Send + Sync + 'static,
    {
        self.register(name, f);
        self
    }

    /// A routine that always returns `output`.
    pub fn returning(self, name: impl Into<String>, output: impl Into<String>) -> Self {
        let output = output.into();
        self.with_routine(name, move |_| Ok(Some(output.clone())))
    }

    pub fn register<F>(&self, name: impl Into<String>, f: F)
    where
        F: Fn(&RoutineCall) -> std::result::Result<Option<String>, String> + Send + Sync + 'static,
    {
        self.routines.write().insert(name.into(), Arc::new(f));
    }

    /// All calls so far, oldest first. Includes calls to unknown routines.
    pub fn calls(&self) -> Vec<RoutineCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.name == name).count()
    }
}

impl RoutineSubstrate for InMemoryRoutines {
    fn execute(
        &self,
        name: &str,
        params: &[RoutineParam],
        mode: CommitMode,
    ) -> std::result::Result<String, SubstrateError> {
        let call = RoutineCall {
            name: name.to_string(),
            params: params.to_vec(),
            mode,
        };
        self.calls.lock().push(call.clone());

        let routine = self
            .routines
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| SubstrateError::UnknownRoutine(name.to_string()))?;

        match routine(&call) {
            Ok(Some(output)) => Ok(output),
            Ok(None) => Err(SubstrateError::NoResult),
            Err(message) => Err(SubstrateError::Failed(message)),
        }
    }
}
