//! Job log endpoints.

use axum::{Json, extract::State, http::StatusCode};
use jobflow_store::{Job, NewStepRecord, StepLogRecord};
use serde::{Deserialize, Serialize};

use super::ids::{IdField, require_id, require_text};
use crate::error::ServerError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

// ── Request/Response types ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LogStepRequest {
    #[serde(rename = "JOB_ID", default)]
    pub job_id: Option<IdField>,
    #[serde(rename = "STEP_ID", default)]
    pub step_id: Option<IdField>,
    #[serde(rename = "USER_INPUT", default)]
    pub user_input: Option<String>,
    #[serde(rename = "VariableName", default)]
    pub variable_name: Option<String>,
    #[serde(rename = "ActionsOutput", default)]
    pub action_output: Option<String>,
    #[serde(rename = "ConditionsOutput", default)]
    pub condition_output: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogStepResponse {
    pub response: String,
    #[serde(rename = "RecordID")]
    pub record_id: i64,
    #[serde(rename = "LoggedAt")]
    pub logged_at: String,
    /// Step the job cursor moved to; `null` once the workflow is complete.
    #[serde(rename = "NextStepID")]
    pub next_step_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobResponse {
    #[serde(rename = "JOB_ID")]
    pub job_id: i64,
    #[serde(rename = "WorkflowID")]
    pub workflow_id: i64,
    #[serde(rename = "CurrentStepID")]
    pub current_step_id: Option<i64>,
    #[serde(rename = "Complete")]
    pub complete: bool,
    #[serde(rename = "StartedAt")]
    pub started_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StepRecordResponse {
    #[serde(rename = "RecordID")]
    pub record_id: i64,
    #[serde(rename = "STEP_ID")]
    pub step_id: i64,
    #[serde(rename = "USER_INPUT")]
    pub user_input: String,
    #[serde(rename = "VariableName")]
    pub variable_name: String,
    #[serde(rename = "ActionsOutput")]
    pub action_output: String,
    #[serde(rename = "ConditionsOutput")]
    pub condition_output: String,
    #[serde(rename = "LoggedAt")]
    pub logged_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobLogResponse {
    pub records: Vec<StepRecordResponse>,
}

// ── Helpers ─────────────────────────────────────────────────────────

fn to_job_response(job: Job) -> JobResponse {
    JobResponse {
        job_id: job.id,
        workflow_id: job.workflow_id,
        current_step_id: job.current_step_id,
        complete: job.is_complete(),
        started_at: job.started_at.to_rfc3339(),
    }
}

fn to_record_response(record: StepLogRecord) -> StepRecordResponse {
    StepRecordResponse {
        record_id: record.id,
        step_id: record.step_id,
        user_input: record.user_input,
        variable_name: record.variable_name,
        action_output: record.action_output,
        condition_output: record.condition_output,
        logged_at: record.logged_at.to_rfc3339(),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /api/v1/workflow/step/log
pub async fn log_step_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LogStepRequest>,
) -> Result<(StatusCode, Json<LogStepResponse>), ServerError> {
    let record = NewStepRecord {
        job_id: require_id("JOB_ID", req.job_id.as_ref())?,
        step_id: require_id("STEP_ID", req.step_id.as_ref())?,
        user_input: require_text("USER_INPUT", req.user_input)?,
        variable_name: require_text("VariableName", req.variable_name)?,
        action_output: require_text("ActionsOutput", req.action_output)?,
        condition_output: require_text("ConditionsOutput", req.condition_output)?,
    };

    let ack = state.engine.log().append_step_record(record).await?;
    Ok((
        StatusCode::CREATED,
        Json(LogStepResponse {
            response: "Step logged".to_string(),
            record_id: ack.record_id,
            logged_at: ack.logged_at.to_rfc3339(),
            next_step_id: ack.next_step_id,
        }),
    ))
}

/// GET /api/v1/jobs/{job}
pub async fn get_job_handler(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<i64>,
) -> Result<Json<JobResponse>, ServerError> {
    let job = state.engine.log().get_job(job_id).await?;
    Ok(Json(to_job_response(job)))
}

/// GET /api/v1/jobs/{job}/log
pub async fn job_log_handler(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<i64>,
) -> Result<Json<JobLogResponse>, ServerError> {
    let records = state.engine.log().list_step_records(job_id).await?;
    Ok(Json(JobLogResponse {
        records: records.into_iter().map(to_record_response).collect(),
    }))
}
