//! Rejected-row repository: append-only rows of `failed_upload_rows`.

use rusqlite::{params, Row};
use serde::Serialize;

use super::{Database, DatabaseError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRowRecord {
    pub id: i64,
    pub job_id: String,
    pub row_number: i64,
    pub row_data: String,
    pub error_message: String,
}

impl FailedRowRecord {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            row_number: row.get("row_number")?,
            row_data: row.get("row_data")?,
            error_message: row.get("error_message")?,
        })
    }
}

/// Appends one rejected row and returns its id.
pub fn insert(
    db: &Database,
    job_id: &str,
    row_number: i64,
    row_data: &str,
    error_message: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO failed_upload_rows (job_id, row_number, row_data, error_message)
             VALUES (?1, ?2, ?3, ?4)",
            params![job_id, row_number, row_data, error_message],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Returns one page of a job's rejected rows in insertion order, together
/// with the total number of rejected rows for the job. A page whose offset
/// does not fit SQLite's integer range is past the end and comes back empty.
pub fn page_by_job(
    db: &Database,
    job_id: &str,
    page: u64,
    size: u64,
) -> Result<(Vec<FailedRowRecord>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let total: u64 = conn.query_row(
            "SELECT COUNT(*) FROM failed_upload_rows WHERE job_id = ?1",
            params![job_id],
            |r| r.get(0),
        )?;

        let Some(offset) = page
            .checked_mul(size)
            .and_then(|o| i64::try_from(o).ok())
        else {
            return Ok((Vec::new(), total));
        };
        let limit = i64::try_from(size).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(
            "SELECT * FROM failed_upload_rows WHERE job_id = ?1
             ORDER BY id ASC LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
            .query_map(params![job_id, limit, offset], FailedRowRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

pub fn count_by_job(db: &Database, job_id: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM failed_upload_rows WHERE job_id = ?1",
            params![job_id],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
