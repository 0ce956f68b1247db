//! Server integration tests.
//!
//! These drive a real server on an ephemeral port through a full job.

mod common;

use anyhow::Result;
use serde_json::{Value, json};

#[tokio::test]
async fn test_server_health_and_liveness() -> Result<()> {
    let server = common::TestServer::start().await?;

    let body: Value = server.get("/health").send().await?.json().await?;
    assert_eq!(body["status"], "ok");
    assert!(body.get("version").is_some());

    let body: Value = server.get("/test").send().await?.json().await?;
    assert_eq!(body["status"], "success");

    Ok(())
}

#[tokio::test]
async fn test_full_job_lifecycle() -> Result<()> {
    let server = common::TestServer::start().await?;
    let job_id = server.start_job(5).await?;

    let job: Value = server
        .get(&format!("/api/v1/jobs/{job_id}"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(job["CurrentStepID"], 1);

    let steps = [(1, "hello"), (2, "green"), (3, "yes")];
    for (step_id, input) in steps {
        let step: Value = server
            .get(&format!("/api/v1/workflow/5/step/{step_id}"))
            .send()
            .await?
            .json()
            .await?;

        let resp = server
            .post(&format!("/api/v1/workflow/5/step/{step_id}/execute"))
            .json(&json!({ "JOB_ID": job_id, "UserInput": input }))
            .send()
            .await?;
        assert!(resp.status().is_success(), "step {step_id}: {}", resp.status());
        let outputs: Value = resp.json().await?;

        let resp = server
            .post("/api/v1/workflow/step/log")
            .json(&json!({
                "JOB_ID": job_id,
                "STEP_ID": step_id,
                "USER_INPUT": input,
                "VariableName": step["VariableName"],
                "ActionsOutput": outputs["ActionsOutput"],
                "ConditionsOutput": outputs["ConditionsOutput"],
            }))
            .send()
            .await?;
        assert_eq!(resp.status().as_u16(), 201);
    }

    let job: Value = server
        .get(&format!("/api/v1/jobs/{job_id}"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(job["Complete"], true);
    assert!(job["CurrentStepID"].is_null());

    let log: Value = server
        .get(&format!("/api/v1/jobs/{job_id}/log"))
        .send()
        .await?
        .json()
        .await?;
    let records = log["records"].as_array().cloned().unwrap_or_default();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1]["ActionsOutput"], "saved:green");
    assert_eq!(records[1]["ConditionsOutput"], "ok");

    Ok(())
}

#[tokio::test]
async fn test_failed_action_logs_nothing() -> Result<()> {
    let server = common::TestServer::start().await?;
    let job_id = server.start_job(6).await?;

    let resp = server
        .post("/api/v1/workflow/6/step/1/execute")
        .json(&json!({ "JOB_ID": job_id, "UserInput": "3" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await?;
    assert_eq!(body["error"], "bad value");
    assert_eq!(body["code"], "routine_error");

    assert!(server.store.list_step_records(job_id)?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_start_job_errors() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server
        .post("/api/v1/workflow/start")
        .json(&json!({ "WorkflowID": "" }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);

    let resp = server
        .post("/api/v1/workflow/start")
        .json(&json!({ "WorkflowID": 404 }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 422);
    let body: Value = resp.json().await?;
    assert_eq!(body["code"], "job_start_failed");

    Ok(())
}

#[tokio::test]
async fn test_duplicate_log_submissions_append_twice() -> Result<()> {
    let server = common::TestServer::start().await?;
    let job_id = server.start_job(5).await?;
    let record = json!({
        "JOB_ID": job_id,
        "STEP_ID": 1,
        "USER_INPUT": "hi",
        "VariableName": "greeting",
        "ActionsOutput": "done",
        "ConditionsOutput": "",
    });

    for _ in 0..2 {
        let resp = server.post("/api/v1/workflow/step/log").json(&record).send().await?;
        assert_eq!(resp.status().as_u16(), 201);
    }

    assert_eq!(server.store.list_step_records(job_id)?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_incomplete_requests_change_nothing() -> Result<()> {
    let server = common::TestServer::start().await?;
    let job_id = server.start_job(5).await?;

    let resp = server
        .post("/api/v1/workflow/5/step/2/actions")
        .json(&json!({ "JOB_ID": job_id }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await?;
    assert_eq!(body["code"], "validation_error");
    assert!(server.store.query_first_column("answers")?.is_empty());

    let resp = server
        .post("/api/v1/workflow/step/log")
        .json(&json!({ "JOB_ID": job_id, "STEP_ID": 1 }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);
    assert!(server.store.list_step_records(job_id)?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_structured() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server
        .post("/api/v1/workflow/start")
        .json(&json!({ "WorkflowID": 5.5 }))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await?;
    assert_eq!(body["code"], "validation_error");

    Ok(())
}
