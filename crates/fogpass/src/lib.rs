pub mod config;
pub mod db;
pub mod error;
pub mod intake;
pub mod job;
pub mod landmark;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod sanitize;
pub mod storage;
pub mod worker;

pub use config::{load_config, Config, SeedRoute};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, FogpassError, IntakeError, Result, StorageError, WorkerError};
pub use intake::{UploadAccepted, UploadIntake, UploadRequest};
pub use job::{JobStatus, JobTracker, ResultSummary, UploadJob};
pub use landmark::{Landmark, RawLandmark, RowError};
pub use metrics::PipelineMetrics;
pub use parser::{ParseError, SourceFormat};
pub use pipeline::{JobOutcome, Pipeline, PipelineConfig, PipelineError};
pub use storage::{LandmarkFileStore, ScratchSpace};
pub use worker::{IngestPool, IngestTask, Submission};
