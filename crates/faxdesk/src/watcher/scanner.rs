use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::WatcherError;
use crate::processor;

/// Lists supported documents directly inside `folder`, sorted by path.
/// Subfolders (including `processed/`) are not descended into.
pub fn list_candidates(folder: &Path) -> Result<Vec<PathBuf>, WatcherError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| WatcherError::ScanFailed {
            path: folder.to_path_buf(),
            reason: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if processor::is_supported(path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_only_supported_top_level_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.PDF"), b"x").unwrap();
        std::fs::write(dir.path().join("a.tif"), b"x").unwrap();
        std::fs::write(dir.path().join("c.tiff"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("processed")).unwrap();
        std::fs::write(dir.path().join("processed").join("old.pdf"), b"x").unwrap();

        let names: Vec<_> = list_candidates(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.tif", "b.PDF", "c.tiff"]);
    }

    #[test]
    fn test_missing_folder_is_scan_error() {
        let result = list_candidates(Path::new("/nonexistent/fax_inbox"));
        assert!(matches!(result, Err(WatcherError::ScanFailed { .. })));
    }
}
