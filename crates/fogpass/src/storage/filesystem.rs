//! Durable copies of uploaded landmark files.
//!
//! Copies are kept for traceability under
//! `<root>/route_<id>/<YYYY>/<MM>/<uuid>.<ext>`, one per accepted upload.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};

use super::ensure_directory;
use crate::error::StorageError;
use crate::parser::extension_of;

/// Location and metadata of a stored copy.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub storage_file_name: String,
    pub file_type: String,
    pub size: u64,
}

pub struct LandmarkFileStore {
    root: PathBuf,
}

impl LandmarkFileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(
        &self,
        route_id: i64,
        original_name: &str,
        content: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let now = Utc::now();
        let dir_path = self
            .root
            .join(format!("route_{}", route_id))
            .join(format!("{:04}", now.year()))
            .join(format!("{:02}", now.month()));
        ensure_directory(&dir_path)?;

        let extension = extension_of(original_name).to_lowercase();
        let file_type = mime_guess::from_path(original_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let (path, storage_file_name) =
            self.store_with_atomic_creation(&dir_path, &extension, content)?;

        Ok(StoredFile {
            path,
            storage_file_name,
            file_type,
            size: content.len() as u64,
        })
    }

    /// Creates the file with O_EXCL semantics. A name collision draws a new
    /// UUID rather than overwriting.
    fn store_with_atomic_creation(
        &self,
        dir_path: &Path,
        extension: &str,
        content: &[u8],
    ) -> Result<(PathBuf, String), StorageError> {
        for _ in 0..8 {
            let id = uuid::Uuid::new_v4();
            let file_name = if extension.is_empty() {
                id.to_string()
            } else {
                format!("{}.{}", id, extension)
            };
            let try_path = dir_path.join(&file_name);

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&try_path)
            {
                Ok(mut file) => {
                    file.write_all(content)
                        .map_err(|e| StorageError::WriteFile {
                            path: try_path.clone(),
                            source: e,
                        })?;
                    return Ok((try_path, file_name));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: try_path,
                        source: e,
                    });
                }
            }
        }

        Err(StorageError::FileExists(dir_path.to_path_buf()))
    }
}
