use serde::{Deserialize, Serialize};

/// Maximum number of row messages carried in a summary.
pub const ERROR_SAMPLE_LIMIT: usize = 10;

/// Terminal result of a job, stored as JSON on the job row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub total_rows: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub error_details: Vec<String>,
}

impl ResultSummary {
    /// Builds a summary whose total is always `success + failure`.
    pub fn new(success_count: u64, failure_count: u64, mut error_details: Vec<String>) -> Self {
        error_details.truncate(ERROR_SAMPLE_LIMIT);
        Self {
            total_rows: success_count + failure_count,
            success_count,
            failure_count,
            error_details,
        }
    }

    /// Appends the cause of a job-fatal error, keeping the sample bounded and
    /// the fatal message last.
    pub fn with_fatal_error(mut self, cause: &str) -> Self {
        self.error_details.truncate(ERROR_SAMPLE_LIMIT - 1);
        self.error_details.push(format!("Fatal error: {}", cause));
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
