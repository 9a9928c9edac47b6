use thiserror::Error;

use crate::db::DatabaseError;
use crate::parser::ParseError;

/// Errors that end a job in `FAILED`.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Route not found: {0}")]
    RouteVanished(i64),

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Failed to write landmark batch {batch}: {source}")]
    BatchWrite {
        batch: usize,
        #[source]
        source: DatabaseError,
    },

    #[error("Failed to record rejected row {row_number}: {source}")]
    FailureWrite {
        row_number: u64,
        #[source]
        source: DatabaseError,
    },

    #[error("Failed to finalize job: {0}")]
    Finalize(#[source] DatabaseError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Ingest aborted: {0}")]
    Aborted(String),
}
