use std::path::PathBuf;
use thiserror::Error;

use crate::sanitize::redact_path;

/// Problems with a source file as a whole. These end the job.
///
/// Messages name the file only, since they are copied into job results.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to open '{}': {source}", redact_path(.path))]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read '{}': {source}", redact_path(.path))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a readable workbook '{}': {reason}", redact_path(.path))]
    Workbook { path: PathBuf, reason: String },

    #[error("Malformed worksheet XML in '{}': {reason}", redact_path(.path))]
    Xml { path: PathBuf, reason: String },
}
