use thiserror::Error;

/// Why a single input row was rejected. Row errors are recorded and
/// counted; they never stop the job.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("row is not valid UTF-8")]
    InvalidUtf8,

    #[error("expected {expected} columns, got {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be decimal degrees or ddmm.mmmm")]
    Coordinate { field: &'static str },

    #[error("{field} must be an integer, got '{value}'")]
    NotInteger { field: &'static str, value: String },

    #[error("{field} must be numeric")]
    NotNumeric { field: &'static str },

    #[error("{field} {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: i64 },
}
