use crate::job::{ResultSummary, ERROR_SAMPLE_LIMIT};

/// Row counters for a single job run.
///
/// Owned by one invocation of the pipeline, never shared between jobs.
#[derive(Debug, Default)]
pub struct JobTally {
    success: u64,
    committed: u64,
    failure: u64,
    error_sample: Vec<String>,
}

impl JobTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self) {
        self.success += 1;
    }

    /// Records how many accepted rows have reached the landmark table.
    pub fn set_committed(&mut self, rows: u64) {
        self.committed = rows;
    }

    /// Counts a rejected row and keeps its message if the sample has room.
    pub fn record_failure(&mut self, row_number: u64, cause: &str) {
        self.failure += 1;
        if self.error_sample.len() < ERROR_SAMPLE_LIMIT {
            self.error_sample
                .push(format!("Row {}: {}", row_number, cause));
        }
    }

    pub fn success_count(&self) -> u64 {
        self.success
    }

    pub fn failure_count(&self) -> u64 {
        self.failure
    }

    pub fn processed(&self) -> u64 {
        self.success + self.failure
    }

    pub fn reached(&self, max_rows: u64) -> bool {
        self.processed() >= max_rows
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary::new(self.success, self.failure, self.error_sample.clone())
    }

    /// Summary of a run that stopped early, ending with the fatal cause.
    /// Successes are the rows committed before the failure.
    pub fn fatal_summary(&self, cause: &str) -> ResultSummary {
        ResultSummary::new(self.committed, self.failure, self.error_sample.clone())
            .with_fatal_error(cause)
    }
}
