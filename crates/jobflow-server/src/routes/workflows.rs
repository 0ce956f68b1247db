//! Workflow catalog and step execution endpoints.

use axum::{Json, extract::State, http::StatusCode};
use jobflow_engine::RoutineKind;
use jobflow_store::{StepDefinition, Workflow};
use serde::{Deserialize, Serialize};

use super::ids::{IdField, require_id, require_text};
use crate::error::ServerError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

// ── Request/Response types ──────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkflowSummary {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "WorkflowName")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "CreationDate")]
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct StartJobRequest {
    #[serde(rename = "WorkflowID", default)]
    pub workflow_id: Option<IdField>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartJobResponse {
    #[serde(rename = "JOB_ID")]
    pub job_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StepResponse {
    #[serde(rename = "StepID")]
    pub step_id: i64,
    #[serde(rename = "VariableName")]
    pub variable_name: String,
    #[serde(rename = "Question")]
    pub question: String,
    #[serde(rename = "HelpText")]
    pub help_text: String,
    #[serde(rename = "InputType")]
    pub input_type: String,
    #[serde(rename = "Retrieve")]
    pub dropdown_source: Option<String>,
    #[serde(rename = "HintText")]
    pub hint_text: String,
    #[serde(rename = "Actions")]
    pub action_routine: Option<String>,
    #[serde(rename = "Conditions")]
    pub condition_routine: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DropdownResponse {
    #[serde(rename = "DropdownData")]
    pub values: Vec<String>,
}

/// Body shared by `execute`, `actions` and `conditions`.
#[derive(Debug, Deserialize)]
pub struct StepInputRequest {
    #[serde(rename = "JOB_ID", default)]
    pub job_id: Option<IdField>,
    #[serde(rename = "UserInput", default)]
    pub user_input: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecuteResponse {
    #[serde(rename = "ActionsOutput")]
    pub action_output: String,
    #[serde(rename = "ConditionsOutput")]
    pub condition_output: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoutineResponse {
    #[serde(rename = "Result")]
    pub result: String,
}

// ── Helpers ─────────────────────────────────────────────────────────

fn to_summary(workflow: Workflow) -> WorkflowSummary {
    WorkflowSummary {
        id: workflow.id,
        name: workflow.name,
        description: workflow.description,
        created_at: workflow.created_at.format("%Y-%m-%d").to_string(),
    }
}

fn to_step_response(step: StepDefinition) -> StepResponse {
    StepResponse {
        step_id: step.step_id,
        variable_name: step.variable_name,
        question: step.question,
        help_text: step.help_text,
        input_type: step.input_type,
        dropdown_source: step.dropdown_source,
        hint_text: step.hint_text,
        action_routine: step.action_routine,
        condition_routine: step.condition_routine,
    }
}

async fn run_single(
    state: &AppState,
    kind: RoutineKind,
    workflow_id: i64,
    step_id: i64,
    req: StepInputRequest,
) -> Result<Json<RoutineResponse>, ServerError> {
    let job_id = require_id("JOB_ID", req.job_id.as_ref())?;
    let user_input = require_text("UserInput", req.user_input)?;
    let result = state
        .engine
        .executor()
        .run_routine(kind, workflow_id, step_id, job_id, &user_input)
        .await?;
    Ok(Json(RoutineResponse { result }))
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /api/v1/workflows
pub async fn list_workflows_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<WorkflowSummary>>, ServerError> {
    let workflows = state.engine.controller().list_workflows().await?;
    Ok(Json(workflows.into_iter().map(to_summary).collect()))
}

/// POST /api/v1/workflow/start
pub async fn start_job_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<StartJobRequest>,
) -> Result<(StatusCode, Json<StartJobResponse>), ServerError> {
    let workflow_id = require_id("WorkflowID", req.workflow_id.as_ref())?;
    let job_id = state.engine.controller().start_job(workflow_id).await?;
    tracing::info!(workflow_id, job_id, "Job started");
    Ok((StatusCode::CREATED, Json(StartJobResponse { job_id })))
}

/// GET /api/v1/workflow/{wf}/step/{step}
pub async fn get_step_handler(
    State(state): State<AppState>,
    ApiPath((workflow_id, step_id)): ApiPath<(i64, i64)>,
) -> Result<Json<StepResponse>, ServerError> {
    let step = state.engine.executor().get_step(workflow_id, step_id).await?;
    Ok(Json(to_step_response(step)))
}

/// GET /api/v1/workflow/{wf}/step/{step}/dropdown
pub async fn dropdown_handler(
    State(state): State<AppState>,
    ApiPath((workflow_id, step_id)): ApiPath<(i64, i64)>,
) -> Result<Json<DropdownResponse>, ServerError> {
    let values = state
        .engine
        .executor()
        .resolve_dropdown(workflow_id, step_id)
        .await?;
    Ok(Json(DropdownResponse { values }))
}

/// POST /api/v1/workflow/{wf}/step/{step}/execute
///
/// A routine-reported failure becomes a 400 carrying the routine's message.
pub async fn execute_step_handler(
    State(state): State<AppState>,
    ApiPath((workflow_id, step_id)): ApiPath<(i64, i64)>,
    ApiJson(req): ApiJson<StepInputRequest>,
) -> Result<Json<ExecuteResponse>, ServerError> {
    let job_id = require_id("JOB_ID", req.job_id.as_ref())?;
    let user_input = require_text("UserInput", req.user_input)?;
    let (action_output, condition_output) = state
        .engine
        .executor()
        .execute_step(workflow_id, step_id, job_id, &user_input)
        .await?
        .into_outputs()?;
    Ok(Json(ExecuteResponse {
        action_output,
        condition_output,
    }))
}

/// POST /api/v1/workflow/{wf}/step/{step}/actions
pub async fn run_action_handler(
    State(state): State<AppState>,
    ApiPath((workflow_id, step_id)): ApiPath<(i64, i64)>,
    ApiJson(req): ApiJson<StepInputRequest>,
) -> Result<Json<RoutineResponse>, ServerError> {
    run_single(&state, RoutineKind::Action, workflow_id, step_id, req).await
}

/// POST /api/v1/workflow/{wf}/step/{step}/conditions
pub async fn run_condition_handler(
    State(state): State<AppState>,
    ApiPath((workflow_id, step_id)): ApiPath<(i64, i64)>,
    ApiJson(req): ApiJson<StepInputRequest>,
) -> Result<Json<RoutineResponse>, ServerError> {
    run_single(&state, RoutineKind::Condition, workflow_id, step_id, req).await
}
