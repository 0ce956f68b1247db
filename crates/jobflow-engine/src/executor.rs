//! Step execution: action then condition, with short-circuit on error.
//!
//! The executor never writes the job log. Callers persist a
//! [`StepOutcome::Completed`] through [`JobLog`](crate::JobLog) when they
//! choose to advance the job.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jobflow_store::{CatalogStorage, RoutineParam, StepDefinition, StoreError};
use serde::Serialize;
use tracing::{debug, warn};

use crate::blocking::run_bounded;
use crate::error::{EngineError, Result};
use crate::invoker::{CommitMode, ProcedureInvoker};
use crate::interpreter::RoutineResult;

/// Which of a step's two routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineKind {
    Action,
    Condition,
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutineKind::Action => write!(f, "action"),
            RoutineKind::Condition => write!(f, "condition"),
        }
    }
}

/// Result of executing one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed {
        action_output: String,
        condition_output: String,
    },
    Failed {
        stage: RoutineKind,
        message: String,
    },
}

impl StepOutcome {
    /// `(action_output, condition_output)` on success, or
    /// [`EngineError::RoutineReported`] carrying the routine's message.
    pub fn into_outputs(self) -> Result<(String, String)> {
        match self {
            StepOutcome::Completed {
                action_output,
                condition_output,
            } => Ok((action_output, condition_output)),
            StepOutcome::Failed { message, .. } => Err(EngineError::RoutineReported(message)),
        }
    }
}

pub struct StepExecutor {
    catalog: Arc<dyn CatalogStorage>,
    invoker: ProcedureInvoker,
    store_timeout: Duration,
    commit_conditions: bool,
}

impl StepExecutor {
    pub fn new(
        catalog: Arc<dyn CatalogStorage>,
        invoker: ProcedureInvoker,
        store_timeout: Duration,
        commit_conditions: bool,
    ) -> Self {
        Self {
            catalog,
            invoker,
            store_timeout,
            commit_conditions,
        }
    }

    /// Fetch a step definition.
    pub async fn get_step(&self, workflow_id: i64, step_id: i64) -> Result<StepDefinition> {
        let catalog = Arc::clone(&self.catalog);
        run_bounded(self.store_timeout, move || {
            catalog.get_step(workflow_id, step_id).map_err(Into::into)
        })
        .await?
        .ok_or(EngineError::StepNotFound {
            workflow_id,
            step_id,
        })
    }

    /// First-column values of the step's dropdown source, in row order.
    pub async fn resolve_dropdown(&self, workflow_id: i64, step_id: i64) -> Result<Vec<String>> {
        let step = self.get_step(workflow_id, step_id).await?;
        let source = step
            .dropdown_source
            .ok_or(EngineError::NoDropdownConfigured {
                workflow_id,
                step_id,
            })?;

        let catalog = Arc::clone(&self.catalog);
        let values = run_bounded(self.store_timeout, move || {
            catalog.query_first_column(&source).map_err(|err| match err {
                StoreError::InvalidIdentifier(name) => {
                    EngineError::Validation(format!("invalid dropdown source '{name}'"))
                }
                other => other.into(),
            })
        })
        .await?;

        debug!(workflow_id, step_id, options = values.len(), "Dropdown resolved");
        Ok(values)
    }

    /// Run the step's action then condition routine.
    ///
    /// A routine-reported error stops execution at that stage and is returned
    /// as [`StepOutcome::Failed`]; the condition never runs after a failed
    /// action. Steps without routines complete with empty outputs.
    pub async fn execute_step(
        &self,
        workflow_id: i64,
        step_id: i64,
        job_id: i64,
        user_input: &str,
    ) -> Result<StepOutcome> {
        validate_job_id(job_id)?;
        let step = self.get_step(workflow_id, step_id).await?;

        let mut action_output = String::new();
        if let Some(routine) = step.action_routine.as_deref() {
            let result = self
                .invoke_stage(RoutineKind::Action, routine, job_id, step_id, user_input)
                .await?;
            if result.is_error {
                return Ok(failed(RoutineKind::Action, routine, job_id, step_id, result));
            }
            action_output = result.payload;
        }

        let mut condition_output = String::new();
        if let Some(routine) = step.condition_routine.as_deref() {
            let result = self
                .invoke_stage(RoutineKind::Condition, routine, job_id, step_id, user_input)
                .await?;
            if result.is_error {
                return Ok(failed(RoutineKind::Condition, routine, job_id, step_id, result));
            }
            condition_output = result.payload;
        }

        debug!(workflow_id, step_id, job_id, "Step executed");
        Ok(StepOutcome::Completed {
            action_output,
            condition_output,
        })
    }

    /// Run exactly one of the step's routines and return its output.
    pub async fn run_routine(
        &self,
        kind: RoutineKind,
        workflow_id: i64,
        step_id: i64,
        job_id: i64,
        user_input: &str,
    ) -> Result<String> {
        validate_job_id(job_id)?;
        let step = self.get_step(workflow_id, step_id).await?;
        let routine = match kind {
            RoutineKind::Action => step.action_routine,
            RoutineKind::Condition => step.condition_routine,
        }
        .ok_or(EngineError::NoRoutineConfigured {
            kind,
            workflow_id,
            step_id,
        })?;

        let result = self
            .invoke_stage(kind, &routine, job_id, step_id, user_input)
            .await?;
        if result.is_error {
            warn!(%kind, routine = %routine, job_id, step_id, message = %result.payload, "Routine reported error");
        }
        result.into_result()
    }

    fn commit_mode(&self, kind: RoutineKind) -> CommitMode {
        match kind {
            RoutineKind::Action => CommitMode::Commit,
            RoutineKind::Condition if self.commit_conditions => CommitMode::Commit,
            RoutineKind::Condition => CommitMode::ReadOnly,
        }
    }

    async fn invoke_stage(
        &self,
        kind: RoutineKind,
        routine: &str,
        job_id: i64,
        step_id: i64,
        user_input: &str,
    ) -> Result<RoutineResult> {
        let params = vec![
            RoutineParam::Integer(job_id),
            RoutineParam::Integer(step_id),
            RoutineParam::Text(user_input.to_string()),
        ];
        self.invoker
            .invoke(routine, params, self.commit_mode(kind))
            .await
    }
}

fn failed(
    stage: RoutineKind,
    routine: &str,
    job_id: i64,
    step_id: i64,
    result: RoutineResult,
) -> StepOutcome {
    warn!(%stage, routine, job_id, step_id, message = %result.payload, "Step failed");
    StepOutcome::Failed {
        stage,
        message: result.payload,
    }
}

fn validate_job_id(job_id: i64) -> Result<()> {
    if job_id <= 0 {
        return Err(EngineError::Validation(format!(
            "job id must be positive, got {job_id}"
        )));
    }
    Ok(())
}
