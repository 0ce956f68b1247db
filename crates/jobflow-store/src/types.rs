use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use serde::{Deserialize, Serialize};

/// A named, ordered template of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub hidden: bool,
}

/// Catalog definition of one step, keyed by `(workflow_id, step_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub workflow_id: i64,
    pub step_id: i64,
    pub variable_name: String,
    pub question: String,
    pub help_text: String,
    pub input_type: String,
    /// View or table whose first column feeds a dropdown.
    pub dropdown_source: Option<String>,
    pub hint_text: String,
    pub action_routine: Option<String>,
    pub condition_routine: Option<String>,
}

/// One running instance of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub workflow_id: i64,
    /// `None` once every step in the catalog has been logged past.
    pub current_step_id: Option<i64>,
    pub started_at: DateTime<Utc>,
}

impl Job {
    pub fn is_complete(&self) -> bool {
        self.current_step_id.is_none()
    }
}

/// Payload for appending to the job step log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStepRecord {
    pub job_id: i64,
    pub step_id: i64,
    pub user_input: String,
    pub variable_name: String,
    pub action_output: String,
    pub condition_output: String,
}

/// A persisted, immutable step log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLogRecord {
    pub id: i64,
    pub job_id: i64,
    pub step_id: i64,
    pub user_input: String,
    pub variable_name: String,
    pub action_output: String,
    pub condition_output: String,
    pub logged_at: DateTime<Utc>,
}

/// Acknowledgement of a committed append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecordAck {
    pub record_id: i64,
    pub logged_at: DateTime<Utc>,
    /// The job cursor after the append.
    pub next_step_id: Option<i64>,
}

/// A positional routine parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoutineParam {
    Integer(i64),
    Text(String),
}

impl From<i64> for RoutineParam {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for RoutineParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RoutineParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl ToSql for RoutineParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// Render a single SQLite value as routine output text.
///
/// `NULL` renders as the empty string.
pub(crate) fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}
