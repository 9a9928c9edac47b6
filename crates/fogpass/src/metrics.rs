//! Ingestion metrics.
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! host process installs a recorder.

pub const JOBS_STARTED: &str = "bulk_upload_jobs_started";
pub const JOBS_COMPLETED: &str = "bulk_upload_jobs_completed";
pub const JOBS_FAILED: &str = "bulk_upload_jobs_failed";
pub const JOB_DURATION_SECONDS: &str = "bulk_upload_duration_seconds";
pub const ROWS_SUCCEEDED: &str = "bulk_upload_rows_succeeded";
pub const ROWS_FAILED: &str = "bulk_upload_rows_failed";

pub struct PipelineMetrics;

impl PipelineMetrics {
    /// An upload was accepted and handed to the pool.
    pub fn job_started() {
        ::metrics::counter!(JOBS_STARTED).increment(1);
    }

    pub fn job_completed() {
        ::metrics::counter!(JOBS_COMPLETED).increment(1);
    }

    pub fn job_failed() {
        ::metrics::counter!(JOBS_FAILED).increment(1);
    }

    /// Wall time of one job run, recorded on every path.
    pub fn record_duration(duration_secs: f64) {
        ::metrics::histogram!(JOB_DURATION_SECONDS).record(duration_secs);
    }

    pub fn rows_processed(success: u64, failure: u64) {
        ::metrics::counter!(ROWS_SUCCEEDED).increment(success);
        ::metrics::counter!(ROWS_FAILED).increment(failure);
    }

    /// Touches every metric so an exporter lists them before first use.
    pub fn register() {
        use metrics::{counter, histogram};

        let _ = counter!(JOBS_STARTED);
        let _ = counter!(JOBS_COMPLETED);
        let _ = counter!(JOBS_FAILED);
        let _ = counter!(ROWS_SUCCEEDED);
        let _ = counter!(ROWS_FAILED);
        let _ = histogram!(JOB_DURATION_SECONDS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        PipelineMetrics::register();
        PipelineMetrics::job_started();
        PipelineMetrics::job_completed();
        PipelineMetrics::job_failed();
        PipelineMetrics::record_duration(0.25);
        PipelineMetrics::rows_processed(3, 1);
    }
}
