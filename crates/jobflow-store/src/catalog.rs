//! Read-side of the workflow catalog, plus job allocation.

use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info};

use crate::store::{Store, parse_dt};
use crate::types::{StepDefinition, Workflow, value_to_text};
use crate::{Result, StoreError};

impl Store {
    /// List workflows that are not hidden, ordered by id.
    pub fn list_workflows(&self) -> Result<Vec<Workflow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, created_at, hidden
             FROM workflows WHERE hidden = 0 ORDER BY id",
        )?;
        let iter = stmt.query_map([], row_to_workflow)?;
        let mut rows = Vec::new();
        for r in iter {
            rows.push(r?);
        }
        Ok(rows)
    }

    pub fn get_step(&self, workflow_id: i64, step_id: i64) -> Result<Option<StepDefinition>> {
        Ok(self
            .conn()?
            .query_row(
                "SELECT workflow_id, step_id, variable_name, question, help_text, input_type,
                        dropdown_source, hint_text, action_routine, condition_routine
                 FROM workflow_steps WHERE workflow_id = ?1 AND step_id = ?2",
                params![workflow_id, step_id],
                row_to_step,
            )
            .optional()?)
    }

    /// Allocate a job for `workflow_id` with its cursor on the first step.
    ///
    /// Unknown and hidden workflows are rejected without allocating.
    pub fn start_job(&self, workflow_id: i64) -> Result<i64> {
        let job_id = self.with_transaction(|tx| {
            let hidden: Option<i32> = tx
                .query_row(
                    "SELECT hidden FROM workflows WHERE id = ?1",
                    params![workflow_id],
                    |row| row.get(0),
                )
                .optional()?;
            match hidden {
                None => {
                    return Err(StoreError::WorkflowUnavailable {
                        id: workflow_id,
                        reason: "unknown",
                    });
                }
                Some(h) if h != 0 => {
                    return Err(StoreError::WorkflowUnavailable {
                        id: workflow_id,
                        reason: "hidden",
                    });
                }
                Some(_) => {}
            }

            let first_step: Option<i64> = tx.query_row(
                "SELECT MIN(step_id) FROM workflow_steps WHERE workflow_id = ?1",
                params![workflow_id],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO jobs (workflow_id, current_step_id, started_at) VALUES (?1, ?2, ?3)",
                params![workflow_id, first_step, Utc::now().to_rfc3339()],
            )?;
            Ok(tx.last_insert_rowid())
        })?;

        info!(job_id, workflow_id, "Job allocated");
        Ok(job_id)
    }

    /// Read the first column of every row in a view or table.
    ///
    /// `source` must be a plain identifier, optionally schema-qualified; it is
    /// quoted before use and never interpolated raw.
    pub fn query_first_column(&self, source: &str) -> Result<Vec<String>> {
        let quoted = quote_identifier(source)?;
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT * FROM {quoted}"))?;
        let mut rows = stmt.query([])?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            values.push(value_to_text(row.get_ref(0)?));
        }
        debug!(source, count = values.len(), "Resolved first-column values");
        Ok(values)
    }
}

/// Validate and double-quote a (possibly schema-qualified) SQL identifier.
pub(crate) fn quote_identifier(name: &str) -> Result<String> {
    let valid_segment = |seg: &str| {
        let mut chars = seg.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() > 2 || !segments.iter().all(|s| valid_segment(s)) {
        return Err(StoreError::InvalidIdentifier(name.to_string()));
    }

    Ok(segments
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join("."))
}

fn row_to_workflow(row: &rusqlite::Row<'_>) -> rusqlite::Result<Workflow> {
    Ok(Workflow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_dt(&row.get::<_, String>(3)?),
        hidden: row.get::<_, i32>(4)? != 0,
    })
}

fn row_to_step(row: &rusqlite::Row<'_>) -> rusqlite::Result<StepDefinition> {
    Ok(StepDefinition {
        workflow_id: row.get(0)?,
        step_id: row.get(1)?,
        variable_name: row.get(2)?,
        question: row.get(3)?,
        help_text: row.get(4)?,
        input_type: row.get(5)?,
        dropdown_source: non_empty(row.get(6)?),
        hint_text: row.get(7)?,
        action_routine: non_empty(row.get(8)?),
        condition_routine: non_empty(row.get(9)?),
    })
}

/// Blank routine/source columns mean "not configured".
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{seed_catalog, test_store};

    #[test]
    fn test_list_excludes_hidden() {
        let store = test_store();
        let workflows = store.list_workflows().unwrap();
        let ids: Vec<i64> = workflows.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![5, 6]);
        assert_eq!(workflows[0].name, "Onboarding");
        assert!(!workflows[0].hidden);
    }

    #[test]
    fn test_get_step() {
        let store = test_store();
        let step = store.get_step(5, 1).unwrap().unwrap();
        assert_eq!(step.variable_name, "greeting");
        assert_eq!(step.action_routine.as_deref(), Some("R_OK"));
        assert!(step.condition_routine.is_none());
        assert!(step.dropdown_source.is_none());

        assert!(store.get_step(5, 42).unwrap().is_none());
    }

    #[test]
    fn test_blank_routine_columns_are_absent() {
        let store = Store::open_in_memory().unwrap();
        seed_catalog(&store);
        store
            .with_transaction(|tx| {
                tx.execute(
                    "INSERT INTO workflow_steps (workflow_id, step_id, action_routine, dropdown_source)
                     VALUES (6, 9, '  ', '')",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        let step = store.get_step(6, 9).unwrap().unwrap();
        assert!(step.action_routine.is_none());
        assert!(step.dropdown_source.is_none());
    }

    #[test]
    fn test_start_job_sets_first_step() {
        let store = test_store();
        let job_id = store.start_job(5).unwrap();
        let job = store.get_job(job_id).unwrap();
        assert_eq!(job.workflow_id, 5);
        assert_eq!(job.current_step_id, Some(1));

        let second = store.start_job(5).unwrap();
        assert!(second > job_id);
    }

    #[test]
    fn test_start_job_rejects_unknown_and_hidden() {
        let store = test_store();

        let err = store.start_job(99).unwrap_err();
        assert!(matches!(err, StoreError::WorkflowUnavailable { reason: "unknown", .. }));

        let err = store.start_job(7).unwrap_err();
        assert!(matches!(err, StoreError::WorkflowUnavailable { reason: "hidden", .. }));

        let count: i64 = store
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_query_first_column() {
        let store = test_store();
        let colours = store.query_first_column("v_colours").unwrap();
        assert_eq!(colours, vec!["blue", "green", "red"]);
    }

    #[test]
    fn test_query_first_column_rejects_injection() {
        let store = test_store();
        for bad in ["v_colours; DROP TABLE jobs", "1abc", "a.b.c", "", "x y"] {
            let err = store.query_first_column(bad).unwrap_err();
            assert!(matches!(err, StoreError::InvalidIdentifier(_)), "{bad}");
        }
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("v_list").unwrap(), "\"v_list\"");
        assert_eq!(quote_identifier("main.v_list").unwrap(), "\"main\".\"v_list\"");
    }

    #[test]
    fn test_query_first_column_missing_source() {
        let store = test_store();
        let err = store.query_first_column("no_such_view").unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
