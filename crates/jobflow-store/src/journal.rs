//! Append-only job step log and job cursor.

use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use tracing::info;

use crate::store::{Store, parse_dt};
use crate::types::{Job, NewStepRecord, StepLogRecord, StepRecordAck};
use crate::{Result, StoreError};

impl Store {
    /// Append one step record and advance the job cursor, atomically.
    ///
    /// The cursor moves to the next step after `record.step_id` in catalog
    /// order, or to `None` when the logged step is the last one. Nothing is
    /// written if any statement fails.
    pub fn append_step_record(&self, record: &NewStepRecord) -> Result<StepRecordAck> {
        let logged_at = Utc::now();

        let ack = self.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO job_step_log
                    (job_id, step_id, user_input, variable_name, action_output, condition_output, logged_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.job_id,
                    record.step_id,
                    record.user_input,
                    record.variable_name,
                    record.action_output,
                    record.condition_output,
                    logged_at.to_rfc3339(),
                ],
            )?;
            let record_id = tx.last_insert_rowid();

            let next_step_id: Option<i64> = tx.query_row(
                "SELECT MIN(s.step_id)
                 FROM workflow_steps s JOIN jobs j ON j.workflow_id = s.workflow_id
                 WHERE j.id = ?1 AND s.step_id > ?2",
                params![record.job_id, record.step_id],
                |row| row.get(0),
            )?;

            tx.execute(
                "UPDATE jobs SET current_step_id = ?1 WHERE id = ?2",
                params![next_step_id, record.job_id],
            )?;

            Ok(StepRecordAck {
                record_id,
                logged_at,
                next_step_id,
            })
        })?;

        info!(
            job_id = record.job_id,
            step_id = record.step_id,
            record_id = ack.record_id,
            next_step_id = ?ack.next_step_id,
            "Step record appended"
        );
        Ok(ack)
    }

    /// All records for a job, in append order.
    pub fn list_step_records(&self, job_id: i64) -> Result<Vec<StepLogRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, job_id, step_id, user_input, variable_name, action_output,
                    condition_output, logged_at
             FROM job_step_log WHERE job_id = ?1 ORDER BY id",
        )?;
        let iter = stmt.query_map(params![job_id], row_to_record)?;
        let mut records = Vec::new();
        for r in iter {
            records.push(r?);
        }
        Ok(records)
    }

    pub fn get_job(&self, job_id: i64) -> Result<Job> {
        self.conn()?
            .query_row(
                "SELECT id, workflow_id, current_step_id, started_at FROM jobs WHERE id = ?1",
                params![job_id],
                |row| {
                    Ok(Job {
                        id: row.get(0)?,
                        workflow_id: row.get(1)?,
                        current_step_id: row.get(2)?,
                        started_at: parse_dt(&row.get::<_, String>(3)?),
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("job {job_id}")))
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<StepLogRecord> {
    Ok(StepLogRecord {
        id: row.get(0)?,
        job_id: row.get(1)?,
        step_id: row.get(2)?,
        user_input: row.get(3)?,
        variable_name: row.get(4)?,
        action_output: row.get(5)?,
        condition_output: row.get(6)?,
        logged_at: parse_dt(&row.get::<_, String>(7)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test_store;

    fn record(job_id: i64, step_id: i64) -> NewStepRecord {
        NewStepRecord {
            job_id,
            step_id,
            user_input: "hello".into(),
            variable_name: "greeting".into(),
            action_output: "done".into(),
            condition_output: String::new(),
        }
    }

    #[test]
    fn test_append_adds_exactly_one_record() {
        let store = test_store();
        let job_id = store.start_job(5).unwrap();
        let before = store.list_step_records(job_id).unwrap().len();

        let submitted = record(job_id, 1);
        let ack = store.append_step_record(&submitted).unwrap();

        let records = store.list_step_records(job_id).unwrap();
        assert_eq!(records.len(), before + 1);
        let last = records.last().unwrap();
        assert_eq!(last.id, ack.record_id);
        assert_eq!(last.user_input, submitted.user_input);
        assert_eq!(last.variable_name, submitted.variable_name);
        assert_eq!(last.action_output, submitted.action_output);
        assert_eq!(last.condition_output, submitted.condition_output);
    }

    #[test]
    fn test_append_advances_cursor_in_catalog_order() {
        let store = test_store();
        let job_id = store.start_job(5).unwrap();

        let ack = store.append_step_record(&record(job_id, 1)).unwrap();
        assert_eq!(ack.next_step_id, Some(2));
        assert_eq!(store.get_job(job_id).unwrap().current_step_id, Some(2));

        store.append_step_record(&record(job_id, 2)).unwrap();
        let ack = store.append_step_record(&record(job_id, 3)).unwrap();
        assert_eq!(ack.next_step_id, None);
        assert!(store.get_job(job_id).unwrap().is_complete());
    }

    #[test]
    fn test_retry_appends_duplicate() {
        let store = test_store();
        let job_id = store.start_job(5).unwrap();

        let first = store.append_step_record(&record(job_id, 1)).unwrap();
        let second = store.append_step_record(&record(job_id, 1)).unwrap();
        assert_ne!(first.record_id, second.record_id);

        let records = store.list_step_records(job_id).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.step_id == 1));
    }

    #[test]
    fn test_append_unknown_job_leaves_nothing() {
        let store = test_store();
        let err = store.append_step_record(&record(404, 1)).unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(store.list_step_records(404).unwrap().is_empty());
    }

    #[test]
    fn test_get_job_not_found() {
        let store = test_store();
        assert!(matches!(
            store.get_job(1).unwrap_err(),
            StoreError::NotFound(_)
        ));
    }
}
