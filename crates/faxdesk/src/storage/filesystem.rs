use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Name of the subfolder processed originals are moved into.
pub const PROCESSED_DIR: &str = "processed";

const MAX_SUFFIX: u32 = 10_000;

/// Move a file from `src` to `dst`. Uses `rename` first and falls back to
/// copy + delete when rename fails (cross-device moves).
fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Files processed originals under `<watch_folder>/processed`.
pub struct FileStorage {
    processed_dir: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(watch_folder: P) -> Self {
        Self {
            processed_dir: watch_folder.as_ref().join(PROCESSED_DIR),
        }
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    /// Moves `source` into the processed folder, keeping its file name and
    /// appending `_1`, `_2`, ... to the stem when the name is taken.
    pub fn move_to_processed(&self, source: &Path) -> Result<PathBuf, StorageError> {
        std::fs::create_dir_all(&self.processed_dir).map_err(|e| {
            StorageError::CreateDirectory {
                path: self.processed_dir.clone(),
                source: e,
            }
        })?;

        let name = source.file_name().ok_or_else(|| StorageError::MoveFile {
            from: source.to_path_buf(),
            to: self.processed_dir.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        })?;
        let target = self.resolve_conflict(name)?;

        move_file(source, &target)?;
        log::debug!("Moved {} to {}", source.display(), target.display());
        Ok(target)
    }

    fn resolve_conflict(&self, filename: &OsStr) -> Result<PathBuf, StorageError> {
        let candidate = self.processed_dir.join(filename);
        if !candidate.exists() {
            return Ok(candidate);
        }

        let path = Path::new(filename);
        let stem = path.file_stem().unwrap_or(filename);
        let ext = path.extension();

        for counter in 1..=MAX_SUFFIX {
            let mut name = OsString::from(stem);
            name.push(format!("_{}", counter));
            if let Some(ext) = ext {
                name.push(".");
                name.push(ext);
            }

            let candidate = self.processed_dir.join(name);
            if !candidate.exists() {
                return Ok(candidate);
            }
        }

        Err(StorageError::FileExists(self.processed_dir.join(filename)))
    }
}
