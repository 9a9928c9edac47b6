use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;

/// Per-user config file: `~/.fogpass/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".fogpass").join("config.json"))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(invalid(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    if config.max_concurrent_jobs == 0 {
        return Err(invalid("max_concurrent_jobs must be at least 1"));
    }
    if config.queue_capacity() == 0 {
        return Err(invalid("queue_capacity must be at least 1"));
    }
    if config.batch_size == 0 {
        return Err(invalid("batch_size must be at least 1"));
    }
    if config.max_rows == 0 {
        return Err(invalid("max_rows must be at least 1"));
    }
    if config.batch_size as u64 > config.max_rows {
        return Err(invalid(format!(
            "batch_size ({}) cannot exceed max_rows ({})",
            config.batch_size, config.max_rows
        )));
    }
    if config.max_upload_bytes == 0 {
        return Err(invalid("max_upload_bytes must be at least 1"));
    }

    config
        .bind_address
        .parse::<SocketAddr>()
        .map_err(|e| invalid(format!("Invalid bind_address '{}': {}", config.bind_address, e)))?;

    let mut seen = std::collections::HashSet::new();
    for route in &config.seed_routes {
        if !seen.insert(route.id) {
            return Err(invalid(format!("Duplicate seed route id {}", route.id)));
        }
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_full_config() {
        let config = load_config_from_str(
            r#"{
                "version": "1.0",
                "database_path": "/var/lib/fogpass/fogpass.db",
                "upload_dir": "/var/lib/fogpass/uploads",
                "landmarks_path": "/var/lib/fogpass/landmarks",
                "max_rows": 5000,
                "batch_size": 500,
                "max_concurrent_jobs": 2,
                "queue_capacity": 8,
                "bind_address": "127.0.0.1:9000",
                "seed_routes": [{"id": 1, "name": "Main", "route_code": "M1"}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.max_rows, 5000);
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.queue_capacity(), 8);
        assert_eq!(config.seed_routes.len(), 1);
        assert_eq!(config.seed_routes[0].direction, None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_concurrent_jobs": 1}}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.max_concurrent_jobs, 1);
        assert_eq!(config.queue_capacity(), 2);
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/fogpass.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let result = load_config_from_str(r#"{"version": "2.0"}"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_zero_workers() {
        let result = load_config_from_str(r#"{"max_concurrent_jobs": 0}"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_batch_larger_than_cap() {
        let result = load_config_from_str(r#"{"max_rows": 100, "batch_size": 1000}"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_bad_bind_address() {
        let result = load_config_from_str(r#"{"bind_address": "localhost"}"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_rejects_duplicate_seed_routes() {
        let result = load_config_from_str(
            r#"{"seed_routes": [
                {"id": 1, "name": "A", "route_code": "A"},
                {"id": 1, "name": "B", "route_code": "B"}
            ]}"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }
}
