pub mod batch;
pub mod config;
pub mod context;
pub mod error;
pub mod failures;
pub mod runner;

pub use batch::BatchPersister;
pub use config::PipelineConfig;
pub use context::JobTally;
pub use error::PipelineError;
pub use failures::FailureRecorder;
pub use runner::{JobOutcome, Pipeline};
pub(crate) use runner::panic_message;
