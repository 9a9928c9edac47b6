use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FogpassError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Reasons an upload is turned away before any job exists.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("No file provided")]
    MissingFile,

    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Route not found: {0}")]
    RouteNotFound(i64),

    #[error("Failed to stage upload for job {job_id}: {source}")]
    Staging {
        job_id: String,
        #[source]
        source: StorageError,
    },

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Worker pool rejected job: {0}")]
    Worker(#[from] WorkerError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove file '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Job {job_id} panicked on the submitting thread: {message}")]
    JobPanicked { job_id: String, message: String },
}

pub type Result<T> = std::result::Result<T, FogpassError>;
