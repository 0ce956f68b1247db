//! Named SQL routines stored in the `routines` table.
//!
//! A routine body is a single SQL statement. Positional parameters bind to
//! `?1..?N` in the order given; a body that declares fewer placeholders than
//! parameters supplied simply ignores the trailing ones.

use rusqlite::{OptionalExtension, params};
use tracing::debug;

use crate::store::Store;
use crate::types::{RoutineParam, value_to_text};
use crate::{Result, StoreError};

impl Store {
    /// Execute routine `name` and return the first column of its first row.
    ///
    /// The statement runs in its own transaction, which is committed only
    /// when `commit` is true and rolled back otherwise.
    pub fn call_procedure(
        &self,
        name: &str,
        params: &[RoutineParam],
        commit: bool,
    ) -> Result<String> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let body: String = tx
            .query_row(
                "SELECT body FROM routines WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::UnknownRoutine(name.to_string()))?;

        let value = {
            let mut stmt = tx.prepare(&body)?;
            let declared = stmt.parameter_count();
            for (idx, param) in params.iter().take(declared).enumerate() {
                stmt.raw_bind_parameter(idx + 1, param)?;
            }
            let mut rows = stmt.raw_query();
            match rows.next()? {
                Some(row) => Some(value_to_text(row.get_ref(0)?)),
                None => None,
            }
        };

        if commit {
            tx.commit()?;
        } else {
            tx.rollback()?;
        }

        debug!(routine = name, commit, has_row = value.is_some(), "Procedure executed");
        value.ok_or_else(|| StoreError::NoRows(name.to_string()))
    }
}
