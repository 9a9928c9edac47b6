//! Job state, persisted on the `upload_jobs` table.
//!
//! Every status change is a guarded update that only matches rows in an
//! allowed predecessor state, so a job that reached `COMPLETED` or
//! `FAILED` stays there no matter who writes next. A summary, once
//! stored, is never replaced.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::status::JobStatus;
use super::summary::ResultSummary;
use crate::db::job_repo::{self, UploadJobRow};
use crate::db::{Database, DatabaseError};

/// Fields supplied by intake for a new job.
#[derive(Debug, Clone)]
pub struct NewUploadJob {
    pub job_id: String,
    pub file_name: String,
    pub uploaded_by: String,
    pub client_ip: Option<String>,
}

/// A job as seen by status queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadJob {
    pub job_id: String,
    pub file_name: String,
    pub status: JobStatus,
    pub uploaded_by: String,
    pub client_ip: Option<String>,
    pub upload_timestamp: String,
    pub result: Option<ResultSummary>,
    pub landmark_file_id: Option<i64>,
    pub updated_at: String,
}

impl TryFrom<UploadJobRow> for UploadJob {
    type Error = DatabaseError;

    fn try_from(row: UploadJobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::parse(&row.status).ok_or_else(|| DatabaseError::UnknownStatus {
            job_id: row.job_id.clone(),
            status: row.status.clone(),
        })?;
        let result = row
            .result_json
            .as_deref()
            .map(serde_json::from_str::<ResultSummary>)
            .transpose()
            .map_err(|e| DatabaseError::Summary {
                job_id: row.job_id.clone(),
                source: e,
            })?;

        Ok(Self {
            job_id: row.job_id,
            file_name: row.file_name,
            status,
            uploaded_by: row.uploaded_by,
            client_ip: row.client_ip,
            upload_timestamp: row.upload_timestamp,
            result,
            landmark_file_id: row.landmark_file_id,
            updated_at: row.updated_at,
        })
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Clone)]
pub struct JobTracker {
    db: Database,
}

impl JobTracker {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Inserts a job in `PENDING`.
    pub fn create(&self, job: NewUploadJob) -> Result<UploadJob, DatabaseError> {
        let timestamp = now();
        let row = UploadJobRow {
            job_id: job.job_id,
            file_name: job.file_name,
            status: JobStatus::Pending.as_str().to_string(),
            uploaded_by: job.uploaded_by,
            client_ip: job.client_ip,
            upload_timestamp: timestamp.clone(),
            result_json: None,
            landmark_file_id: None,
            updated_at: timestamp,
        };
        job_repo::insert(&self.db, &row)?;
        UploadJob::try_from(row)
    }

    pub fn find(&self, job_id: &str) -> Result<Option<UploadJob>, DatabaseError> {
        job_repo::find_by_id(&self.db, job_id)?
            .map(UploadJob::try_from)
            .transpose()
    }

    /// Claims a pending job for processing. Returns `false` if the job is
    /// missing or no longer pending.
    pub fn mark_processing(&self, job_id: &str) -> Result<bool, DatabaseError> {
        self.transition(job_id, JobStatus::Processing, None)
    }

    pub fn complete(&self, job_id: &str, summary: &ResultSummary) -> Result<bool, DatabaseError> {
        self.transition(job_id, JobStatus::Completed, Some(summary))
    }

    /// Marks the job failed. The summary is stored only if the job does not
    /// have one yet.
    pub fn fail(&self, job_id: &str, summary: &ResultSummary) -> Result<bool, DatabaseError> {
        self.transition(job_id, JobStatus::Failed, Some(summary))
    }

    pub fn attach_file(&self, job_id: &str, landmark_file_id: i64) -> Result<(), DatabaseError> {
        job_repo::set_landmark_file(&self.db, job_id, landmark_file_id)
    }

    fn transition(
        &self,
        job_id: &str,
        to: JobStatus,
        summary: Option<&ResultSummary>,
    ) -> Result<bool, DatabaseError> {
        let result_json = summary
            .map(ResultSummary::to_json)
            .transpose()
            .map_err(|e| DatabaseError::Summary {
                job_id: job_id.to_string(),
                source: e,
            })?;
        let from: Vec<&str> = to.predecessors().iter().map(JobStatus::as_str).collect();

        let changed = job_repo::transition(
            &self.db,
            job_id,
            &from,
            to.as_str(),
            result_json.as_deref(),
            &now(),
        )?;
        if !changed {
            log::warn!("Job {} not moved to {}: not in an allowed state", job_id, to);
        }
        Ok(changed)
    }
}
