//! Upload intake: synchronous checks, job creation, staging and dispatch.
//!
//! Nothing here parses the file. Once an upload passes the request checks
//! it gets a `PENDING` job, a scratch copy, and a place in the ingest pool;
//! the caller gets the job id back without waiting for processing.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::file_repo::{self, LandmarkFileRow};
use crate::db::{route_repo, Database};
use crate::error::IntakeError;
use crate::job::{JobStatus, JobTracker, NewUploadJob, ResultSummary};
use crate::metrics::PipelineMetrics;
use crate::parser::{extension_of, SourceFormat};
use crate::storage::{LandmarkFileStore, ScratchSpace};
use crate::worker::{IngestPool, IngestTask, Submission};

pub const DEFAULT_UPLOADER: &str = "system";
pub const ACCEPTED_MESSAGE: &str = "Upload accepted";

/// An upload as received from a client.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file_name: Option<String>,
    /// `None` when the request carried no file part at all.
    pub content: Option<Vec<u8>>,
    pub route_id: i64,
    pub uploaded_by: Option<String>,
    pub client_ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAccepted {
    pub job_id: String,
    pub status: JobStatus,
    pub message: String,
}

pub struct UploadIntake {
    db: Database,
    tracker: JobTracker,
    scratch: ScratchSpace,
    file_store: Option<LandmarkFileStore>,
    pool: Arc<IngestPool>,
}

impl UploadIntake {
    pub fn new(
        db: Database,
        scratch: ScratchSpace,
        file_store: Option<LandmarkFileStore>,
        pool: Arc<IngestPool>,
    ) -> Self {
        Self {
            tracker: JobTracker::new(db.clone()),
            db,
            scratch,
            file_store,
            pool,
        }
    }

    pub fn tracker(&self) -> &JobTracker {
        &self.tracker
    }

    pub fn accept(&self, request: UploadRequest) -> Result<UploadAccepted, IntakeError> {
        let content = request.content.ok_or(IntakeError::MissingFile)?;
        if content.is_empty() {
            return Err(IntakeError::EmptyFile);
        }

        let file_name = request
            .file_name
            .map(|n| n.trim().to_string())
            .unwrap_or_default();
        let extension = extension_of(&file_name);
        let format = SourceFormat::from_extension(extension)
            .ok_or_else(|| IntakeError::UnsupportedFileType(extension.to_string()))?;

        if route_repo::find_by_id(&self.db, request.route_id)?.is_none() {
            return Err(IntakeError::RouteNotFound(request.route_id));
        }

        let uploaded_by = request
            .uploaded_by
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_UPLOADER.to_string());

        let job_id = uuid::Uuid::new_v4().to_string();
        self.tracker.create(NewUploadJob {
            job_id: job_id.clone(),
            file_name: file_name.clone(),
            uploaded_by: uploaded_by.clone(),
            client_ip: request.client_ip,
        })?;
        info!(
            job_id = %job_id,
            route_id = request.route_id,
            file = %file_name,
            size = content.len(),
            uploaded_by = %uploaded_by,
            "Upload received"
        );

        self.keep_copy(&job_id, request.route_id, &file_name, &content);

        let staged_path = match self.scratch.stage(&job_id, &file_name, &content) {
            Ok(path) => path,
            Err(e) => {
                self.abandon(&job_id, &e.to_string());
                return Err(IntakeError::Staging { job_id, source: e });
            }
        };

        PipelineMetrics::job_started();

        let task = IngestTask {
            job_id: job_id.clone(),
            route_id: request.route_id,
            staged_path: staged_path.clone(),
            format,
            file_name,
        };
        match self.pool.submit(task) {
            Ok(Submission::Queued) => debug!(job_id = %job_id, "Job queued"),
            Ok(Submission::RanInline(outcome)) => {
                debug!(job_id = %job_id, status = %outcome.status, "Job ran on intake thread")
            }
            Err(e) => {
                self.abandon(&job_id, &e.to_string());
                if let Err(remove_err) = self.scratch.remove(&staged_path) {
                    warn!(job_id = %job_id, error = %remove_err, "Failed to remove staged upload");
                }
                return Err(e.into());
            }
        }

        Ok(UploadAccepted {
            job_id,
            status: JobStatus::Pending,
            message: ACCEPTED_MESSAGE.to_string(),
        })
    }

    /// Stores the durable copy and links it to the job. Failures are logged
    /// and otherwise ignored.
    fn keep_copy(&self, job_id: &str, route_id: i64, file_name: &str, content: &[u8]) {
        let Some(store) = &self.file_store else {
            return;
        };

        match self.store_copy(store, job_id, route_id, file_name, content) {
            Ok(file_id) => debug!(job_id = %job_id, file_id, "Stored landmark file copy"),
            Err(e) => warn!(job_id = %job_id, error = %e, "Could not store landmark file copy"),
        }
    }

    fn store_copy(
        &self,
        store: &LandmarkFileStore,
        job_id: &str,
        route_id: i64,
        file_name: &str,
        content: &[u8],
    ) -> crate::error::Result<i64> {
        let stored = store.store(route_id, file_name, content)?;
        let row = LandmarkFileRow {
            id: 0,
            route_id,
            original_file_name: file_name.to_string(),
            storage_file_name: stored.storage_file_name,
            file_path: stored.path.to_string_lossy().to_string(),
            file_type: stored.file_type,
            file_size: stored.size as i64,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        let file_id = file_repo::insert(&self.db, &row)?;
        self.tracker.attach_file(job_id, file_id)?;
        Ok(file_id)
    }

    /// Fails a job that never reached the pool so it does not stay pending.
    fn abandon(&self, job_id: &str, cause: &str) {
        let summary = ResultSummary::new(0, 0, Vec::new()).with_fatal_error(cause);
        if let Err(e) = self.tracker.fail(job_id, &summary) {
            warn!(job_id = %job_id, error = %e, "Could not mark abandoned job failed");
        }
    }
}
