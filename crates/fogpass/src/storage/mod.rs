pub mod filesystem;
pub mod scratch;

pub use filesystem::{LandmarkFileStore, StoredFile};
pub use scratch::ScratchSpace;

use std::path::Path;

use crate::error::StorageError;

pub(crate) fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}
