//! Work directory guard
//!
//! Every file a run creates (source, fragments, downloads, merged output)
//! lives in one directory owned by a [`WorkDir`]. Dropping the guard removes
//! the directory, so early returns, errors, and panics all clean up.

use crate::error::{FragError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the `index`-th fragment file
pub fn part_file_name(index: usize) -> String {
    format!("part_{}.bin", index)
}

/// Name of the `index`-th downloaded fragment file
pub fn downloaded_file_name(index: usize) -> String {
    format!("downloaded_part_{}.bin", index)
}

/// Short human label for a byte size: `1kb`, `4mb`, `1000b`
pub fn size_label(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB && bytes % GB == 0 {
        format!("{}gb", bytes / GB)
    } else if bytes >= MB && bytes % MB == 0 {
        format!("{}mb", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}kb", bytes / KB)
    } else {
        format!("{}b", bytes)
    }
}

/// Scoped owner of the run directory
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    keep: bool,
}

impl WorkDir {
    /// Create the directory.
    ///
    /// An existing directory is only accepted when empty, since the whole
    /// directory is removed when the guard drops.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if path.exists() {
            let mut entries = std::fs::read_dir(&path).map_err(|e| FragError::file(&path, e))?;
            if entries.next().is_some() {
                return Err(FragError::WorkDirNotEmpty(path));
            }
        } else {
            std::fs::create_dir_all(&path).map_err(|e| FragError::file(&path, e))?;
        }

        debug!(path = %path.display(), "Created work directory");
        Ok(Self { path, keep: false })
    }

    /// Leave the directory on disk when the guard drops
    pub fn keep_on_drop(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// Directory root
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Generated source file
    pub fn source_path(&self, total_size: u64) -> PathBuf {
        self.path.join(format!("source_{}.bin", size_label(total_size)))
    }

    /// Fragment file written by the fragmenter
    pub fn part_path(&self, index: usize) -> PathBuf {
        self.path.join(part_file_name(index))
    }

    /// Fragment file written after download
    pub fn downloaded_path(&self, index: usize) -> PathBuf {
        self.path.join(downloaded_file_name(index))
    }

    /// Reassembled output
    pub fn merged_path(&self, total_size: u64) -> PathBuf {
        self.path.join(format!("merged_{}.bin", size_label(total_size)))
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.keep {
            debug!(path = %self.path.display(), "Keeping work directory");
            return;
        }

        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed work directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove work directory"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_size_label() {
        assert_eq!(size_label(1024), "1kb");
        assert_eq!(size_label(4 * 1024 * 1024), "4mb");
        assert_eq!(size_label(1000), "1000b");
        assert_eq!(size_label(0), "0b");
        assert_eq!(size_label(1536), "1536b");
    }

    #[test]
    fn test_layout() {
        let base = TempDir::new().unwrap();
        let work = WorkDir::create(base.path().join("run")).unwrap();

        assert!(work.part_path(2).ends_with("part_2.bin"));
        assert!(work.downloaded_path(2).ends_with("downloaded_part_2.bin"));
        assert!(work.merged_path(1024).ends_with("merged_1kb.bin"));
        assert!(work.source_path(1024).ends_with("source_1kb.bin"));
    }

    #[test]
    fn test_removed_on_drop() {
        let base = TempDir::new().unwrap();
        let dir = base.path().join("run");

        {
            let work = WorkDir::create(&dir).unwrap();
            std::fs::write(work.part_path(0), b"data").unwrap();
            assert!(dir.exists());
        }

        assert!(!dir.exists());
    }

    #[test]
    fn test_removed_on_panic() {
        let base = TempDir::new().unwrap();
        let dir = base.path().join("run");
        let inner = dir.clone();

        let result = std::panic::catch_unwind(move || {
            let work = WorkDir::create(&inner).unwrap();
            std::fs::write(work.part_path(0), b"data").unwrap();
            panic!("run aborted");
        });

        assert!(result.is_err());
        assert!(!dir.exists());
    }

    #[test]
    fn test_keep_on_drop() {
        let base = TempDir::new().unwrap();
        let dir = base.path().join("run");

        drop(WorkDir::create(&dir).unwrap().keep_on_drop(true));
        assert!(dir.exists());
    }

    #[test]
    fn test_refuses_non_empty_directory() {
        let base = TempDir::new().unwrap();
        std::fs::write(base.path().join("precious.txt"), b"keep me").unwrap();

        let result = WorkDir::create(base.path());
        assert!(matches!(result, Err(FragError::WorkDirNotEmpty(_))));
        assert!(base.path().join("precious.txt").exists());
    }
}
