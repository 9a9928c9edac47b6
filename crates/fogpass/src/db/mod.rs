//! Relational store for upload jobs, rejected rows, landmarks and routes.
//!
//! Uses rusqlite (SQLite) behind a cloneable `Database` handle. Every
//! repository call takes the lock for a single statement or transaction,
//! so status polling interleaves with a running ingestion instead of
//! waiting for it to finish.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{Connection, Transaction};

pub mod error;
pub mod failure_repo;
pub mod file_repo;
pub mod job_repo;
pub mod landmark_repo;
pub mod migrations;
pub mod route_repo;

pub use error::DatabaseError;

/// How long a statement waits on a lock held by another connection to the
/// same file (an operator's sqlite shell, a backup) before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the fogpass store.
///
/// Workers and request handlers hold clones of one handle. A job that
/// panics while holding the lock does not take the store down with it:
/// the next caller clears the poison and carries on, since each statement
/// either committed or rolled back on its own.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database at the given path in WAL mode and
    /// runs all pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Self::prepare(conn)?;

        log::info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| {
            log::warn!("Database lock was poisoned by a panicking job, recovering");
            self.conn.clear_poison();
            poisoned.into_inner()
        })
    }

    /// Runs `f` with the connection locked.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let conn = self.lock();
        f(&conn)
    }

    /// Runs `f` inside one transaction. Commits when `f` succeeds, rolls
    /// back otherwise.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, DatabaseError>,
    {
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Returns the canonical database path: `~/.fogpass/data/fogpass.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".fogpass").join("data").join("fogpass.db"))
}
