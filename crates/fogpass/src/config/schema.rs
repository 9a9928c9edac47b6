use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    /// SQLite file. Falls back to `~/.fogpass/data/fogpass.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Scratch directory for staged uploads.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Root for durable upload copies. Copies are skipped when unset.
    #[serde(default)]
    pub landmarks_path: Option<PathBuf>,
    #[serde(default = "default_max_rows")]
    pub max_rows: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    /// Jobs that may wait for a worker. Defaults to twice the worker count.
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub json_logs: bool,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
    #[serde(default)]
    pub seed_routes: Vec<SeedRoute>,
}

/// A route inserted at startup if it does not already exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRoute {
    pub id: i64,
    pub name: String,
    pub route_code: String,
    #[serde(default)]
    pub direction: Option<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_max_rows() -> u64 {
    10_000
}

fn default_batch_size() -> usize {
    1_000
}

fn default_max_concurrent_jobs() -> usize {
    3
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or(self.max_concurrent_jobs * 2)
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(crate::db::default_database_path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            database_path: None,
            upload_dir: default_upload_dir(),
            landmarks_path: None,
            max_rows: default_max_rows(),
            batch_size: default_batch_size(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            queue_capacity: None,
            bind_address: default_bind_address(),
            max_upload_bytes: default_max_upload_bytes(),
            json_logs: false,
            metrics_enabled: true,
            seed_routes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_rows, 10_000);
        assert_eq!(config.batch_size, 1_000);
        assert_eq!(config.max_concurrent_jobs, 3);
        assert_eq!(config.queue_capacity(), 6);
        assert!(config.landmarks_path.is_none());
    }

    #[test]
    fn test_explicit_queue_capacity() {
        let config = Config {
            queue_capacity: Some(1),
            ..Config::default()
        };
        assert_eq!(config.queue_capacity(), 1);
    }

    #[test]
    fn test_empty_object_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.upload_dir, PathBuf::from("./uploads"));
        assert!(config.metrics_enabled);
        assert!(config.seed_routes.is_empty());
    }
}
