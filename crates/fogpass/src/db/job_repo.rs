//! Upload job repository: rows of the `upload_jobs` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

/// A raw upload job row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadJobRow {
    pub job_id: String,
    pub file_name: String,
    pub status: String,
    pub uploaded_by: String,
    pub client_ip: Option<String>,
    pub upload_timestamp: String,
    pub result_json: Option<String>,
    pub landmark_file_id: Option<i64>,
    pub updated_at: String,
}

impl UploadJobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            job_id: row.get("job_id")?,
            file_name: row.get("file_name")?,
            status: row.get("status")?,
            uploaded_by: row.get("uploaded_by")?,
            client_ip: row.get("client_ip")?,
            upload_timestamp: row.get("upload_timestamp")?,
            result_json: row.get("result_json")?,
            landmark_file_id: row.get("landmark_file_id")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub fn insert(db: &Database, job: &UploadJobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO upload_jobs (job_id, file_name, status, uploaded_by, client_ip,
             upload_timestamp, result_json, landmark_file_id, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                job.job_id,
                job.file_name,
                job.status,
                job.uploaded_by,
                job.client_ip,
                job.upload_timestamp,
                job.result_json,
                job.landmark_file_id,
                job.updated_at,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, job_id: &str) -> Result<Option<UploadJobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT * FROM upload_jobs WHERE job_id = ?1",
                params![job_id],
                UploadJobRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Moves a job to `to` only if its current status is one of `from`.
///
/// `result_json` is written only while the stored value is still NULL, so
/// a summary is never overwritten once set. Returns whether a row changed.
pub fn transition(
    db: &Database,
    job_id: &str,
    from: &[&str],
    to: &str,
    result_json: Option<&str>,
    updated_at: &str,
) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let placeholders = (0..from.len())
            .map(|i| format!("?{}", i + 5))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE upload_jobs
             SET status = ?2, result_json = COALESCE(result_json, ?3), updated_at = ?4
             WHERE job_id = ?1 AND status IN ({})",
            placeholders
        );

        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![
            Box::new(job_id.to_string()),
            Box::new(to.to_string()),
            Box::new(result_json.map(str::to_string)),
            Box::new(updated_at.to_string()),
        ];
        for status in from {
            values.push(Box::new(status.to_string()));
        }

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(|v| v.as_ref()).collect();
        let changed = conn.execute(&sql, params_ref.as_slice())?;
        Ok(changed > 0)
    })
}

/// Links a stored copy of the source file to the job.
pub fn set_landmark_file(
    db: &Database,
    job_id: &str,
    landmark_file_id: i64,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE upload_jobs SET landmark_file_id = ?2 WHERE job_id = ?1",
            params![job_id, landmark_file_id],
        )?;
        Ok(())
    })
}

pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM upload_jobs WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

pub fn count_all(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM upload_jobs", [], |r| r.get(0))?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample_job(id: &str) -> UploadJobRow {
        UploadJobRow {
            job_id: id.to_string(),
            file_name: "landmarks.csv".to_string(),
            status: "PENDING".to_string(),
            uploaded_by: "system".to_string(),
            client_ip: Some("10.0.0.8".to_string()),
            upload_timestamp: "2026-03-01T08:00:00Z".to_string(),
            result_json: None,
            landmark_file_id: None,
            updated_at: "2026-03-01T08:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        insert(&db, &sample_job("j1")).unwrap();

        let found = find_by_id(&db, "j1").unwrap().unwrap();
        assert_eq!(found, sample_job("j1"));
    }

    #[test]
    fn test_find_missing() {
        let db = test_db();
        assert!(find_by_id(&db, "nope").unwrap().is_none());
    }

    #[test]
    fn test_transition_from_allowed_status() {
        let db = test_db();
        insert(&db, &sample_job("j1")).unwrap();

        let changed =
            transition(&db, "j1", &["PENDING"], "PROCESSING", None, "2026-03-01T08:00:01Z")
                .unwrap();
        assert!(changed);

        let found = find_by_id(&db, "j1").unwrap().unwrap();
        assert_eq!(found.status, "PROCESSING");
        assert_eq!(found.updated_at, "2026-03-01T08:00:01Z");
        assert!(found.result_json.is_none());
    }

    #[test]
    fn test_transition_from_disallowed_status_is_noop() {
        let db = test_db();
        let mut job = sample_job("j1");
        job.status = "COMPLETED".to_string();
        job.result_json = Some("{}".to_string());
        insert(&db, &job).unwrap();

        let changed = transition(
            &db,
            "j1",
            &["PENDING", "PROCESSING"],
            "FAILED",
            Some("{\"x\":1}"),
            "2026-03-01T09:00:00Z",
        )
        .unwrap();
        assert!(!changed);

        let found = find_by_id(&db, "j1").unwrap().unwrap();
        assert_eq!(found.status, "COMPLETED");
        assert_eq!(found.result_json.as_deref(), Some("{}"));
    }

    #[test]
    fn test_transition_keeps_existing_result() {
        let db = test_db();
        let mut job = sample_job("j1");
        job.status = "PROCESSING".to_string();
        job.result_json = Some("{\"first\":true}".to_string());
        insert(&db, &job).unwrap();

        transition(
            &db,
            "j1",
            &["PROCESSING"],
            "FAILED",
            Some("{\"second\":true}"),
            "2026-03-01T09:00:00Z",
        )
        .unwrap();

        let found = find_by_id(&db, "j1").unwrap().unwrap();
        assert_eq!(found.status, "FAILED");
        assert_eq!(found.result_json.as_deref(), Some("{\"first\":true}"));
    }

    #[test]
    fn test_count_by_status() {
        let db = test_db();
        insert(&db, &sample_job("j1")).unwrap();
        insert(&db, &sample_job("j2")).unwrap();
        transition(&db, "j2", &["PENDING"], "PROCESSING", None, "t").unwrap();

        assert_eq!(count_by_status(&db, "PENDING").unwrap(), 1);
        assert_eq!(count_by_status(&db, "PROCESSING").unwrap(), 1);
        assert_eq!(count_all(&db).unwrap(), 2);
    }
}
