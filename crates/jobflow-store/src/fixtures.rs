//! Seed data shared by tests across the workspace.
//!
//! Catalog:
//! - workflow 5 "Onboarding": step 1 (`R_OK`), step 2 (dropdown `v_colours`,
//!   `R_SAVE` + `C_NONEMPTY`), step 3 (no routines)
//! - workflow 6 "Survey": step 1 (`R_FAIL` + `C_NONEMPTY`), step 2
//!   (`R_OK` + `C_NONEMPTY`)
//! - workflow 7 "Legacy": hidden

use crate::store::Store;

/// Catalog and routine rows used by the fixtures.
pub const SEED_SQL: &str = r#"
CREATE TABLE colours (name TEXT NOT NULL);
INSERT INTO colours (name) VALUES ('red'), ('green'), ('blue');
CREATE VIEW v_colours AS SELECT name FROM colours ORDER BY name;

CREATE TABLE answers (job_id INTEGER, step_id INTEGER, value TEXT);

INSERT INTO workflows (id, name, description, created_at, hidden) VALUES
    (5, 'Onboarding', 'New starter checklist', '2024-11-02T09:30:00+00:00', 0),
    (6, 'Survey', 'Feedback survey', '2024-12-01T00:00:00+00:00', 0),
    (7, 'Legacy', 'Retired workflow', '2023-01-01T00:00:00+00:00', 1);

INSERT INTO workflow_steps
    (workflow_id, step_id, variable_name, question, help_text, input_type,
     dropdown_source, hint_text, action_routine, condition_routine)
VALUES
    (5, 1, 'greeting', 'Say hello', 'Any text', 'text', NULL, 'hello', 'R_OK', NULL),
    (5, 2, 'colour', 'Pick a colour', '', 'dropdown', 'v_colours', '', 'R_SAVE', 'C_NONEMPTY'),
    (5, 3, 'confirm', 'Confirm', '', 'checkbox', NULL, '', NULL, NULL),
    (6, 1, 'rating', 'Rate us', '', 'number', NULL, '', 'R_FAIL', 'C_NONEMPTY'),
    (6, 2, 'comment', 'Comments', '', 'text', NULL, '', 'R_OK', 'C_NONEMPTY'),
    (7, 1, 'old', 'Old question', '', 'text', NULL, '', NULL, NULL);

INSERT INTO routines (name, body) VALUES
    ('R_OK', 'SELECT ''done'''),
    ('R_FAIL', 'SELECT ''ERROR:bad value'''),
    ('R_ORDER', 'SELECT ?1 || ''|'' || ?2 || ''|'' || ?3'),
    ('R_SAVE', 'INSERT INTO answers (job_id, step_id, value) VALUES (?1, ?2, ?3) RETURNING ''saved:'' || value'),
    ('C_NONEMPTY', 'SELECT CASE WHEN length(?3) > 0 THEN ''ok'' ELSE ''ERROR:input required'' END'),
    ('R_EMPTY', 'SELECT name FROM colours WHERE 0'),
    ('R_NULL', 'SELECT NULL'),
    ('R_BROKEN', 'SELECT * FROM missing_table');
"#;

/// Load [`SEED_SQL`] into `store`.
pub fn seed_catalog(store: &Store) {
    store
        .with_transaction(|tx| {
            tx.execute_batch(SEED_SQL)?;
            Ok(())
        })
        .expect("failed to seed catalog");
}

/// An in-memory store with the seed catalog loaded.
pub fn test_store() -> Store {
    let store = Store::open_in_memory().expect("failed to open in-memory store");
    seed_catalog(&store);
    store
}
