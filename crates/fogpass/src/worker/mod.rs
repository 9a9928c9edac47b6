pub mod pool;
pub mod task;

pub use pool::{IngestPool, Submission};
pub use task::IngestTask;
