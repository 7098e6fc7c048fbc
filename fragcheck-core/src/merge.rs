//! Reassembly
//!
//! Concatenates fragment files in the order given. Reassembly is purely
//! positional: content handles carry no ordering information, so the
//! caller must pass fragments in their original order.

use crate::error::{FragError, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Concatenate `paths` into `output`, returning the total bytes written.
///
/// A failure on any fragment aborts the merge. Bytes already written to
/// `output` are left in place.
pub async fn merge_files<P: AsRef<Path>>(paths: &[P], output: &Path) -> Result<u64> {
    let mut out = File::create(output)
        .await
        .map_err(|e| FragError::file(output, e))?;

    let mut total = 0u64;
    for (index, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        let merge_err = |source: std::io::Error| FragError::Merge {
            index,
            path: PathBuf::from(path),
            source,
        };

        let mut input = File::open(path).await.map_err(merge_err)?;
        let written = tokio::io::copy(&mut input, &mut out)
            .await
            .map_err(merge_err)?;

        debug!(index, bytes = written, path = %path.display(), "Merged fragment");
        total += written;
    }

    out.flush().await.map_err(|e| FragError::file(output, e))?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::split_file;
    use crate::verify::files_equal;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_merge_in_given_order() {
        let dir = TempDir::new().unwrap();
        let parts = ["one-", "two-", "three"];
        let mut paths = Vec::new();
        for (i, part) in parts.iter().enumerate() {
            let path = dir.path().join(format!("p{}", i));
            tokio::fs::write(&path, part).await.unwrap();
            paths.push(path);
        }

        let output = dir.path().join("merged.bin");
        let written = merge_files(&paths, &output).await.unwrap();
        assert_eq!(written, 13);
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"one-two-three");
    }

    #[tokio::test]
    async fn test_split_then_merge_roundtrip() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.bin");
        let data: Vec<u8> = (0..1000).map(|i| (i * 7 % 256) as u8).collect();
        tokio::fs::write(&source, &data).await.unwrap();

        let fragments = split_file(&source, 256, dir.path()).await.unwrap();
        let paths: Vec<_> = fragments.iter().map(|f| f.path.clone()).collect();

        let merged = dir.path().join("merged.bin");
        merge_files(&paths, &merged).await.unwrap();
        assert!(files_equal(&source, &merged).await);
    }

    #[tokio::test]
    async fn test_reordered_merge_detected() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.bin");
        let data: Vec<u8> = (0..1024).map(|i| (i % 256) as u8).collect();
        tokio::fs::write(&source, &data).await.unwrap();

        let fragments = split_file(&source, 256, dir.path()).await.unwrap();
        let mut paths: Vec<_> = fragments.iter().map(|f| f.path.clone()).collect();
        paths.swap(0, 1);

        let merged = dir.path().join("merged.bin");
        merge_files(&paths, &merged).await.unwrap();
        assert!(!files_equal(&source, &merged).await);
    }

    #[tokio::test]
    async fn test_missing_fragment_aborts() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("p0");
        tokio::fs::write(&first, b"abc").await.unwrap();
        let missing = dir.path().join("p1");

        let output = dir.path().join("merged.bin");
        let result = merge_files(&[first, missing], &output).await;
        assert!(matches!(result, Err(FragError::Merge { index: 1, .. })));
    }

    #[tokio::test]
    async fn test_merge_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("merged.bin");
        let paths: Vec<PathBuf> = Vec::new();

        assert_eq!(merge_files(&paths, &output).await.unwrap(), 0);
    }
}
