//! API routes.

pub mod health;
pub mod ids;
pub mod jobs;
pub mod workflows;

pub use health::health_routes;
pub use jobs::{
    JobLogResponse, JobResponse, LogStepRequest, LogStepResponse, StepRecordResponse,
    get_job_handler, job_log_handler, log_step_handler,
};
pub use workflows::{
    DropdownResponse, ExecuteResponse, RoutineResponse, StartJobRequest, StartJobResponse,
    StepInputRequest, StepResponse, WorkflowSummary, dropdown_handler, execute_step_handler,
    get_step_handler, list_workflows_handler, run_action_handler, run_condition_handler,
    start_job_handler,
};
