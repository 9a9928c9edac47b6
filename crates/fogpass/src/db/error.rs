//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error when creating the database directory.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration failed to apply.
    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// A stored result summary could not be encoded or decoded.
    #[error("Invalid result summary for job {job_id}: {source}")]
    Summary {
        job_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored job status is not one this service writes.
    #[error("Unknown status '{status}' on job {job_id}")]
    UnknownStatus { job_id: String, status: String },
}
