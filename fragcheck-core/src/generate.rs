//! Test file generation

use crate::error::{FragError, Result};
use crate::IO_BUFFER_SIZE;
use rand::rngs::OsRng;
use rand::RngCore;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Write `size` bytes from the OS random source to `path`.
///
/// The file is created or truncated. Returns the number of bytes written.
pub async fn generate_random_file(path: &Path, size: u64) -> Result<u64> {
    let mut file = File::create(path)
        .await
        .map_err(|e| FragError::file(path, e))?;

    let mut block = vec![0u8; IO_BUFFER_SIZE];
    let mut remaining = size;

    while remaining > 0 {
        let n = remaining.min(block.len() as u64) as usize;
        OsRng.fill_bytes(&mut block[..n]);
        file.write_all(&block[..n])
            .await
            .map_err(|e| FragError::file(path, e))?;
        remaining -= n as u64;
    }

    file.flush().await.map_err(|e| FragError::file(path, e))?;

    debug!(path = %path.display(), size, "Generated random file");
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_generates_exact_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("source.bin");

        let written = generate_random_file(&path, 1024).await.unwrap();
        assert_eq!(written, 1024);
        assert_eq!(tokio::fs::metadata(&path).await.unwrap().len(), 1024);
    }

    #[tokio::test]
    async fn test_larger_than_one_block() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let size = IO_BUFFER_SIZE as u64 * 2 + 17;

        generate_random_file(&path, size).await.unwrap();
        assert_eq!(tokio::fs::metadata(&path).await.unwrap().len(), size);
    }

    #[tokio::test]
    async fn test_two_runs_differ() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");

        generate_random_file(&a, 256).await.unwrap();
        generate_random_file(&b, 256).await.unwrap();

        let a = tokio::fs::read(&a).await.unwrap();
        let b = tokio::fs::read(&b).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");

        assert_eq!(generate_random_file(&path, 0).await.unwrap(), 0);
        assert_eq!(tokio::fs::metadata(&path).await.unwrap().len(), 0);
    }
}
