use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OpenFlags, Transaction};
use tracing::{debug, info};

use crate::{Result, StoreError};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Timeouts applied to every store interaction.
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// SQLite busy handler timeout for locked database files.
    pub busy_timeout: Duration,
    /// Maximum wait to acquire the connection guard.
    pub lock_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            lock_timeout: Duration::from_secs(5),
        }
    }
}

/// Thin repository over SQLite for the workflow catalog, job log and
/// procedure store.
///
/// The connection is guarded by a non-poisoning mutex. Every operation
/// acquires it for the duration of one call and releases it on return; the
/// acquisition itself is bounded by [`StoreOptions::lock_timeout`].
pub struct Store {
    conn: Mutex<Connection>,
    lock_timeout: Duration,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("lock_timeout", &self.lock_timeout)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Open (or create) the database at `path` and run pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_options(path, StoreOptions::default())
    }

    /// Open with explicit timeouts.
    pub fn open_with_options(path: &Path, options: StoreOptions) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let store = Self::init(conn, options)?;
        info!(path = %path.display(), "Store opened");
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::init(conn, StoreOptions::default())
    }

    fn init(conn: Connection, options: StoreOptions) -> Result<Self> {
        conn.busy_timeout(options.busy_timeout)?;
        let mut store = Self {
            conn: Mutex::new(conn),
            lock_timeout: options.lock_timeout,
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&mut self) -> Result<()> {
        let conn = self.conn.get_mut();
        let report = embedded::migrations::runner()
            .run(conn)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        debug!(applied = report.applied_migrations().len(), "Migrations run");
        Ok(())
    }

    /// Lock the connection for one operation.
    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .try_lock_for(self.lock_timeout)
            .ok_or(StoreError::Timeout(self.lock_timeout))
    }

    /// Execute a function within a transaction.
    ///
    /// The transaction commits only when `f` returns `Ok`; on error it is
    /// rolled back when dropped.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Round-trip a trivial query to prove the database answers.
    pub fn ping(&self) -> Result<()> {
        self.conn()?
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

pub(crate) fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_migrations_run() {
        let store = Store::open_in_memory().unwrap();
        store.ping().unwrap();
    }

    #[test]
    fn test_open_file_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("jobflow.db");
        let store = Store::open(&path).unwrap();
        store.ping().unwrap();
        assert!(path.exists());

        // Reopening applies no migrations twice
        drop(store);
        Store::open(&path).unwrap().ping().unwrap();
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let store = Store::open_in_memory().unwrap();
        let result: Result<()> = store.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO routines (name, body) VALUES ('r', 'SELECT 1')",
                [],
            )?;
            Err(StoreError::NotFound("forced".into()))
        });
        assert!(result.is_err());

        let count: i64 = store
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM routines", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_lock_timeout() {
        let dir = TempDir::new().unwrap();
        let store = Store::open_with_options(
            &dir.path().join("t.db"),
            StoreOptions {
                lock_timeout: Duration::from_millis(20),
                ..Default::default()
            },
        )
        .unwrap();

        let _held = store.conn().unwrap();
        let err = store.ping().unwrap_err();
        assert!(matches!(err, StoreError::Timeout(_)));
    }
}
