//! Fragmenting
//!
//! Splits a source file into an ordered sequence of fixed-size fragments.
//! Every fragment is `fragment_size` bytes except possibly the last one,
//! which holds the remainder. Each fragment is written to its own
//! `part_<i>.bin` file so it can be handed to a store independently.

use crate::error::{FragError, Result};
use crate::workdir::part_file_name;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// A contiguous byte range of the source, materialized as its own file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Position within the source (for ordered reassembly)
    pub index: usize,

    /// Byte offset of the first byte within the source
    pub offset: u64,

    /// Fragment length in bytes
    pub len: u64,

    /// File holding the fragment bytes
    pub path: PathBuf,
}

/// Number of fragments a `total`-byte source splits into
pub fn fragment_count(total: u64, fragment_size: u64) -> Result<u64> {
    if fragment_size == 0 {
        return Err(FragError::InvalidFragmentSize(fragment_size));
    }
    Ok(total.div_ceil(fragment_size))
}

/// Length of every fragment of a `total`-byte source, in order
pub fn fragment_lengths(
    total: u64,
    fragment_size: u64,
) -> Result<impl Iterator<Item = u64>> {
    let count = fragment_count(total, fragment_size)?;
    Ok((0..count).map(move |i| fragment_size.min(total - i * fragment_size)))
}

/// Split `src` into `part_<i>.bin` files inside `out_dir`.
///
/// Fragment lengths are planned from the source length, so no buffer is
/// ever larger than the source itself. A source that shrinks while it is
/// being read is an error. An empty source yields no fragments.
pub async fn split_file(src: &Path, fragment_size: u64, out_dir: &Path) -> Result<Vec<Fragment>> {
    if fragment_size == 0 {
        return Err(FragError::InvalidFragmentSize(fragment_size));
    }

    let mut file = File::open(src)
        .await
        .map_err(|e| FragError::file(src, e))?;
    let source_len = file
        .metadata()
        .await
        .map_err(|e| FragError::file(src, e))?
        .len();

    let mut fragments = Vec::new();
    let mut offset = 0u64;

    for (index, len) in fragment_lengths(source_len, fragment_size)?.enumerate() {
        let mut buffer = Vec::with_capacity(len as usize);
        (&mut file)
            .take(len)
            .read_to_end(&mut buffer)
            .await
            .map_err(|e| FragError::file(src, e))?;

        if buffer.len() as u64 != len {
            let short = std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("fragment {} expected {} bytes, read {}", index, len, buffer.len()),
            );
            return Err(FragError::file(src, short));
        }

        let path = out_dir.join(part_file_name(index));
        tokio::fs::write(&path, &buffer)
            .await
            .map_err(|e| FragError::file(&path, e))?;

        debug!(index, offset, len, path = %path.display(), "Wrote fragment");

        fragments.push(Fragment {
            index,
            offset,
            len,
            path,
        });
        offset += len;
    }

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn pattern(size: usize) -> Vec<u8> {
        (0..size).map(|i| (i % 251) as u8).collect()
    }

    async fn write_source(dir: &TempDir, size: usize) -> PathBuf {
        let path = dir.path().join("source.bin");
        tokio::fs::write(&path, pattern(size)).await.unwrap();
        path
    }

    #[test]
    fn test_fragment_lengths_exact_multiple() {
        let lengths: Vec<u64> = fragment_lengths(1024, 256).unwrap().collect();
        assert_eq!(lengths, vec![256, 256, 256, 256]);
    }

    #[test]
    fn test_fragment_lengths_with_remainder() {
        let lengths: Vec<u64> = fragment_lengths(1000, 256).unwrap().collect();
        assert_eq!(lengths, vec![256, 256, 256, 232]);
    }

    #[test]
    fn test_zero_fragment_size_rejected() {
        assert!(matches!(
            fragment_count(10, 0),
            Err(FragError::InvalidFragmentSize(0))
        ));
    }

    #[tokio::test]
    async fn test_split_exact_multiple() {
        let dir = TempDir::new().unwrap();
        let src = write_source(&dir, 1024).await;

        let fragments = split_file(&src, 256, dir.path()).await.unwrap();
        assert_eq!(fragments.len(), 4);

        let original = pattern(1024);
        for (i, fragment) in fragments.iter().enumerate() {
            assert_eq!(fragment.index, i);
            assert_eq!(fragment.offset, i as u64 * 256);
            assert_eq!(fragment.len, 256);
            assert!(fragment.path.ends_with(format!("part_{}.bin", i)));

            let bytes = tokio::fs::read(&fragment.path).await.unwrap();
            assert_eq!(bytes, &original[i * 256..(i + 1) * 256]);
        }
    }

    #[tokio::test]
    async fn test_split_keeps_trailing_partial() {
        let dir = TempDir::new().unwrap();
        let src = write_source(&dir, 1000).await;

        let fragments = split_file(&src, 256, dir.path()).await.unwrap();
        let lengths: Vec<u64> = fragments.iter().map(|f| f.len).collect();
        assert_eq!(lengths, vec![256, 256, 256, 232]);

        let last = tokio::fs::read(&fragments[3].path).await.unwrap();
        assert_eq!(last, &pattern(1000)[768..]);
    }

    #[tokio::test]
    async fn test_split_empty_source() {
        let dir = TempDir::new().unwrap();
        let src = write_source(&dir, 0).await;

        let fragments = split_file(&src, 256, dir.path()).await.unwrap();
        assert!(fragments.is_empty());
        assert!(!dir.path().join("part_0.bin").exists());
    }

    #[tokio::test]
    async fn test_split_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = split_file(&dir.path().join("nope.bin"), 256, dir.path()).await;
        assert!(matches!(result, Err(FragError::File { .. })));
    }

    #[tokio::test]
    async fn test_fragment_size_larger_than_source() {
        let dir = TempDir::new().unwrap();
        let src = write_source(&dir, 1024).await;

        for size in [1u64 << 40, u64::MAX] {
            let fragments = split_file(&src, size, dir.path()).await.unwrap();
            assert_eq!(fragments.len(), 1);
            assert_eq!(fragments[0].len, 1024);

            let bytes = tokio::fs::read(&fragments[0].path).await.unwrap();
            assert_eq!(bytes, pattern(1024));
        }
    }

    proptest! {
        #[test]
        fn prop_fragment_lengths_cover_source(total in 0u64..200_000, size in 1u64..10_000) {
            let lengths: Vec<u64> = fragment_lengths(total, size).unwrap().collect();

            prop_assert_eq!(lengths.len() as u64, total.div_ceil(size));
            prop_assert_eq!(lengths.iter().sum::<u64>(), total);

            if let Some((last, init)) = lengths.split_last() {
                prop_assert!(init.iter().all(|&len| len == size));
                prop_assert!(*last > 0 && *last <= size);
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_split_file_reproduces_source(
            data in proptest::collection::vec(any::<u8>(), 0..4096),
            size in 1u64..1500,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let dir = TempDir::new().unwrap();
            let src = dir.path().join("source.bin");
            std::fs::write(&src, &data).unwrap();

            let fragments = rt.block_on(split_file(&src, size, dir.path())).unwrap();
            let total = data.len() as u64;
            prop_assert_eq!(fragments.len() as u64, total.div_ceil(size));

            let mut joined = Vec::with_capacity(data.len());
            for (i, fragment) in fragments.iter().enumerate() {
                let bytes = std::fs::read(&fragment.path).unwrap();
                prop_assert_eq!(fragment.index, i);
                prop_assert_eq!(fragment.offset, i as u64 * size);
                prop_assert_eq!(bytes.len() as u64, fragment.len);

                if i + 1 < fragments.len() {
                    prop_assert_eq!(fragment.len, size);
                } else {
                    prop_assert!(fragment.len > 0 && fragment.len <= size);
                }
                joined.extend_from_slice(&bytes);
            }
            prop_assert_eq!(joined, data);
        }
    }
}
