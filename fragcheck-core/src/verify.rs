//! File comparison
//!
//! Exact byte-for-byte comparison of two files. Lengths are compared
//! first, so files of different sizes are never scanned.

use crate::error::{FragError, Result};
use crate::IO_BUFFER_SIZE;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Compare two files.
///
/// Returns `Ok(false)` when the contents differ and an error when either
/// file cannot be opened or read, keeping "not equal" apart from
/// "could not compare".
pub async fn compare_files(a: &Path, b: &Path) -> Result<bool> {
    let mut fa = File::open(a).await.map_err(|e| FragError::file(a, e))?;
    let mut fb = File::open(b).await.map_err(|e| FragError::file(b, e))?;

    let len_a = fa.metadata().await.map_err(|e| FragError::file(a, e))?.len();
    let len_b = fb.metadata().await.map_err(|e| FragError::file(b, e))?.len();
    if len_a != len_b {
        return Ok(false);
    }

    let mut buf_a = vec![0u8; IO_BUFFER_SIZE];
    let mut buf_b = vec![0u8; IO_BUFFER_SIZE];

    loop {
        let n_a = read_block(&mut fa, &mut buf_a)
            .await
            .map_err(|e| FragError::file(a, e))?;
        let n_b = read_block(&mut fb, &mut buf_b)
            .await
            .map_err(|e| FragError::file(b, e))?;

        if n_a != n_b {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
        if buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
    }
}

/// Compare two files, treating any I/O failure as "not equal"
pub async fn files_equal(a: &Path, b: &Path) -> bool {
    match compare_files(a, b).await {
        Ok(equal) => equal,
        Err(e) => {
            debug!(error = %e, "Comparison failed, treating files as different");
            false
        }
    }
}

/// Fill as much of the buffer as the file allows
async fn read_block(file: &mut File, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = file.read(&mut buffer[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
