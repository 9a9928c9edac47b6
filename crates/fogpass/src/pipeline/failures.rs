use crate::db::{failure_repo, Database};

use super::error::PipelineError;

/// Writes one record per rejected row, as soon as it is rejected.
pub struct FailureRecorder {
    db: Database,
    job_id: String,
}

impl FailureRecorder {
    pub fn new(db: Database, job_id: &str) -> Self {
        Self {
            db,
            job_id: job_id.to_string(),
        }
    }

    pub fn record(
        &self,
        row_number: u64,
        row_data: &str,
        error_message: &str,
    ) -> Result<(), PipelineError> {
        failure_repo::insert(
            &self.db,
            &self.job_id,
            row_number as i64,
            row_data,
            error_message,
        )
        .map_err(|e| PipelineError::FailureWrite {
            row_number,
            source: e,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobTracker, NewUploadJob};

    #[test]
    fn test_record_is_visible_immediately() {
        let db = Database::open_in_memory().unwrap();
        JobTracker::new(db.clone())
            .create(NewUploadJob {
                job_id: "job-1".to_string(),
                file_name: "a.csv".to_string(),
                uploaded_by: "system".to_string(),
                client_ip: None,
            })
            .unwrap();

        let recorder = FailureRecorder::new(db.clone(), "job-1");
        recorder.record(4, "X,Y", "latitude is required").unwrap();

        let (rows, total) = failure_repo::page_by_job(&db, "job-1", 0, 20).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].row_number, 4);
        assert_eq!(rows[0].row_data, "X,Y");
        assert_eq!(rows[0].error_message, "latitude is required");
    }

    #[test]
    fn test_unknown_job_is_failure_write_error() {
        let db = Database::open_in_memory().unwrap();
        let recorder = FailureRecorder::new(db, "missing");
        let err = recorder.record(2, "", "bad").unwrap_err();
        assert!(matches!(err, PipelineError::FailureWrite { row_number: 2, .. }));
    }
}
