//! Working copies of uploads, owned by exactly one job each.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::ensure_directory;
use crate::error::StorageError;
use crate::sanitize::sanitize_file_name;

#[derive(Debug, Clone)]
pub struct ScratchSpace {
    directory: PathBuf,
}

impl ScratchSpace {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes the upload to `<dir>/<job_id>_<sanitized name>`.
    pub fn stage(
        &self,
        job_id: &str,
        file_name: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        ensure_directory(&self.directory)?;

        let path = self
            .directory
            .join(format!("{}_{}", job_id, sanitize_file_name(file_name)));

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => StorageError::FileExists(path.clone()),
                _ => StorageError::WriteFile {
                    path: path.clone(),
                    source: e,
                },
            })?;
        fill_or_discard(&path, file, |f| {
            f.write_all(content)?;
            f.sync_all()
        })?;

        Ok(path)
    }

    /// Deletes a staged file. Returns `false` if it was already gone.
    pub fn remove(&self, path: &Path) -> Result<bool, StorageError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::RemoveFile {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

/// Runs `fill` on a freshly created file. On failure the partial file is
/// removed.
fn fill_or_discard<F>(path: &Path, mut file: File, fill: F) -> Result<(), StorageError>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    if let Err(e) = fill(&mut file) {
        drop(file);
        if let Err(remove_err) = std::fs::remove_file(path) {
            log::warn!(
                "Could not remove partial upload {}: {}",
                crate::sanitize::redact_path(path),
                remove_err
            );
        }
        return Err(StorageError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stage_writes_prefixed_file() {
        let temp = TempDir::new().unwrap();
        let scratch = ScratchSpace::new(temp.path().join("uploads"));

        let path = scratch.stage("job-1", "north route.csv", b"a,b").unwrap();
        assert_eq!(path.file_name().unwrap(), "job-1_north_route.csv");
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b");
    }

    #[test]
    fn test_stage_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let scratch = ScratchSpace::new(temp.path());

        scratch.stage("job-1", "a.csv", b"1").unwrap();
        let second = scratch.stage("job-1", "a.csv", b"2");
        assert!(matches!(second, Err(StorageError::FileExists(_))));
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let temp = TempDir::new().unwrap();
        let scratch = ScratchSpace::new(temp.path());
        let path = scratch.stage("job-1", "a.csv", b"1").unwrap();

        assert!(scratch.remove(&path).unwrap());
        assert!(!scratch.remove(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_write_leaves_no_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("job-1_a.csv");
        let file = File::create(&path).unwrap();

        let result = fill_or_discard(&path, file, |f| {
            f.write_all(b"ALD,STATION")?;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        });

        assert!(matches!(result, Err(StorageError::WriteFile { .. })));
        assert!(!path.exists());
    }
}
