//! Test harness for isolated ingestion runs.
//!
//! Each `TestHarness` owns an in-memory database with migrations applied,
//! a scratch directory for staged uploads, and a directory for durable
//! copies. Jobs can be driven through the pipeline directly or through
//! intake and a real worker pool.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use fogpass::db::failure_repo::{self, FailedRowRecord};
use fogpass::db::landmark_repo;
use fogpass::db::route_repo::{self, RouteRow};
use fogpass::job::NewUploadJob;
use fogpass::storage::{LandmarkFileStore, ScratchSpace};
use fogpass::{
    Database, IngestPool, IngestTask, JobOutcome, JobTracker, Landmark, Pipeline,
    PipelineConfig, SourceFormat, UploadIntake, UploadJob,
};

pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub tracker: JobTracker,
    pub scratch_dir: PathBuf,
    pub landmarks_dir: PathBuf,
    pub pipeline: Arc<Pipeline>,
}

impl TestHarness {
    /// Harness with the production limits (10 000 rows, batches of 1 000).
    pub fn new() -> Self {
        Self::with_limits(10_000, 1_000)
    }

    pub fn with_limits(max_rows: u64, batch_size: usize) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let scratch_dir = temp_dir.path().join("uploads");
        let landmarks_dir = temp_dir.path().join("landmarks");

        let db = Database::open_in_memory().expect("Failed to open database");
        let config = Arc::new(PipelineConfig {
            max_rows,
            batch_size,
            upload_dir: scratch_dir.clone(),
        });

        Self {
            tracker: JobTracker::new(db.clone()),
            pipeline: Arc::new(Pipeline::from_config(config, db.clone())),
            db,
            scratch_dir,
            landmarks_dir,
            temp_dir,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn add_route(&self, id: i64) {
        route_repo::insert(
            &self.db,
            &RouteRow {
                id,
                name: format!("Route {}", id),
                route_code: format!("R{:03}", id),
                direction: Some("UP".to_string()),
            },
        )
        .expect("Failed to insert route");
    }

    pub fn scratch(&self) -> ScratchSpace {
        ScratchSpace::new(&self.scratch_dir)
    }

    /// Creates a pending job and stages its file, as intake would.
    pub fn stage(&self, job_id: &str, route_id: i64, file_name: &str, content: &[u8]) -> IngestTask {
        self.tracker
            .create(NewUploadJob {
                job_id: job_id.to_string(),
                file_name: file_name.to_string(),
                uploaded_by: "system".to_string(),
                client_ip: None,
            })
            .expect("Failed to create job");

        let staged_path = self
            .scratch()
            .stage(job_id, file_name, content)
            .expect("Failed to stage upload");

        let extension = fogpass::parser::extension_of(file_name);
        IngestTask {
            job_id: job_id.to_string(),
            route_id,
            staged_path,
            format: SourceFormat::from_extension(extension).expect("Unsupported fixture type"),
            file_name: file_name.to_string(),
        }
    }

    pub fn run(&self, task: &IngestTask) -> JobOutcome {
        self.pipeline.run(task)
    }

    pub fn pool(&self, workers: usize, capacity: usize) -> Arc<IngestPool> {
        Arc::new(
            IngestPool::new(Arc::clone(&self.pipeline), workers, capacity)
                .expect("Failed to start pool"),
        )
    }

    pub fn intake(&self, pool: &Arc<IngestPool>) -> UploadIntake {
        UploadIntake::new(
            self.db.clone(),
            self.scratch(),
            Some(LandmarkFileStore::new(&self.landmarks_dir)),
            Arc::clone(pool),
        )
    }

    pub fn job(&self, job_id: &str) -> UploadJob {
        self.tracker
            .find(job_id)
            .expect("Failed to read job")
            .expect("Job not found")
    }

    pub fn failures(&self, job_id: &str) -> Vec<FailedRowRecord> {
        let (rows, _) =
            failure_repo::page_by_job(&self.db, job_id, 0, 1_000).expect("Failed to read failures");
        rows
    }

    pub fn landmarks(&self, route_id: i64) -> Vec<Landmark> {
        landmark_repo::list_by_route(&self.db, route_id).expect("Failed to read landmarks")
    }

    pub fn job_count(&self) -> u64 {
        fogpass::db::job_repo::count_all(&self.db).expect("Failed to count jobs")
    }

    /// Files still present in the scratch directory.
    pub fn staged_files(&self) -> usize {
        match std::fs::read_dir(&self.scratch_dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}
