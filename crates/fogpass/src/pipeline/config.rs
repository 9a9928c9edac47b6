use std::path::PathBuf;

use crate::config::Config;

/// Limits applied to every job a pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Reading stops once this many rows have been counted.
    pub max_rows: u64,
    /// Landmarks per insert transaction.
    pub batch_size: usize,
    /// Where staged uploads live until their job finishes.
    pub upload_dir: PathBuf,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_rows: config.max_rows,
            batch_size: config.batch_size.max(1),
            upload_dir: config.upload_dir.clone(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
