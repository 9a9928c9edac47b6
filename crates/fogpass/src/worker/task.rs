use std::path::PathBuf;

use crate::parser::SourceFormat;

/// One accepted upload waiting to be ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestTask {
    pub job_id: String,
    pub route_id: i64,
    /// Scratch copy of the upload. Removed when the job ends.
    pub staged_path: PathBuf,
    pub format: SourceFormat,
    /// Name as submitted, for logs.
    pub file_name: String,
}
