//! Append-only job step log.

use std::sync::Arc;
use std::time::Duration;

use jobflow_store::{Job, JobLogStorage, NewStepRecord, StepLogRecord, StepRecordAck, StoreError};
use tracing::error;

use crate::blocking::run_bounded;
use crate::error::{EngineError, Result};

pub struct JobLog {
    storage: Arc<dyn JobLogStorage>,
    store_timeout: Duration,
}

impl JobLog {
    pub fn new(storage: Arc<dyn JobLogStorage>, store_timeout: Duration) -> Self {
        Self {
            storage,
            store_timeout,
        }
    }

    /// Append one record and advance the job cursor.
    ///
    /// Fields are stored verbatim. Resubmitting the same record appends a
    /// duplicate; callers own idempotency.
    pub async fn append_step_record(&self, record: NewStepRecord) -> Result<StepRecordAck> {
        if record.job_id <= 0 || record.step_id <= 0 {
            return Err(EngineError::Validation(
                "job id and step id must be positive".to_string(),
            ));
        }

        let storage = Arc::clone(&self.storage);
        let job_id = record.job_id;
        run_bounded(self.store_timeout, move || {
            storage
                .append_step_record(&record)
                .map_err(|err| match err {
                    StoreError::Timeout(d) => EngineError::Timeout(d),
                    other => {
                        error!(job_id, error = %other, "Step log append rolled back");
                        EngineError::LogWrite(other.to_string())
                    }
                })
        })
        .await
    }

    pub async fn list_step_records(&self, job_id: i64) -> Result<Vec<StepLogRecord>> {
        self.get_job(job_id).await?;
        let storage = Arc::clone(&self.storage);
        run_bounded(self.store_timeout, move || {
            storage.list_step_records(job_id).map_err(Into::into)
        })
        .await
    }

    pub async fn get_job(&self, job_id: i64) -> Result<Job> {
        let storage = Arc::clone(&self.storage);
        run_bounded(self.store_timeout, move || {
            storage.get_job(job_id).map_err(|err| match err {
                StoreError::NotFound(_) => EngineError::JobNotFound(job_id),
                other => other.into(),
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobflow_store::Store;
    use jobflow_store::fixtures::test_store;

    fn log_for(store: Arc<Store>) -> JobLog {
        JobLog::new(store, Duration::from_secs(5))
    }

    fn record(job_id: i64, step_id: i64) -> NewStepRecord {
        NewStepRecord {
            job_id,
            step_id,
            user_input: " hello ".into(),
            variable_name: "greeting".into(),
            action_output: "done".into(),
            condition_output: "ERROR:kept verbatim".into(),
        }
    }

    #[tokio::test]
    async fn test_append_adds_exactly_one_verbatim_record() {
        let store = Arc::new(test_store());
        let job_id = store.start_job(5).unwrap();
        let log = log_for(store);

        let before = log.list_step_records(job_id).await.unwrap().len();
        let ack = log.append_step_record(record(job_id, 1)).await.unwrap();
        let records = log.list_step_records(job_id).await.unwrap();

        assert_eq!(records.len(), before + 1);
        let last = records.last().unwrap();
        assert_eq!(last.id, ack.record_id);
        assert_eq!(last.user_input, " hello ");
        assert_eq!(last.variable_name, "greeting");
        assert_eq!(last.action_output, "done");
        assert_eq!(last.condition_output, "ERROR:kept verbatim");
        assert_eq!(ack.next_step_id, Some(2));
    }

    #[tokio::test]
    async fn test_cursor_reaches_completion() {
        let store = Arc::new(test_store());
        let job_id = store.start_job(5).unwrap();
        let log = log_for(store);

        for step in 1..=3 {
            log.append_step_record(record(job_id, step)).await.unwrap();
        }
        let job = log.get_job(job_id).await.unwrap();
        assert!(job.is_complete());
    }

    #[tokio::test]
    async fn test_unknown_job_is_log_write_error() {
        let log = log_for(Arc::new(test_store()));
        let err = log.append_step_record(record(999, 1)).await.unwrap_err();
        assert!(matches!(err, EngineError::LogWrite(_)));
    }

    #[tokio::test]
    async fn test_invalid_ids_rejected() {
        let log = log_for(Arc::new(test_store()));
        let err = log.append_step_record(record(0, 1)).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reads_for_unknown_job() {
        let log = log_for(Arc::new(test_store()));
        assert!(matches!(
            log.get_job(404).await.unwrap_err(),
            EngineError::JobNotFound(404)
        ));
        assert!(matches!(
            log.list_step_records(404).await.unwrap_err(),
            EngineError::JobNotFound(404)
        ));
    }
}
