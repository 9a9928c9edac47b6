//! Upload job lifecycle.

pub mod status;
pub mod summary;
pub mod tracker;

pub use status::JobStatus;
pub use summary::{ResultSummary, ERROR_SAMPLE_LIMIT};
pub use tracker::{JobTracker, NewUploadJob, UploadJob};
