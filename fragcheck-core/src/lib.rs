//! fragcheck Core Library
//!
//! The reusable part of the fragcheck demo client.
//! This crate provides:
//! - Random test file generation
//! - Fixed-size fragmenting of a file into `part_<i>.bin` files
//! - Exact byte comparison of files (per fragment and whole file)
//! - Ordered reassembly of fragments
//! - Content handles (32-byte fingerprints) returned by storage backends
//! - A work directory guard that removes every temporary file on drop

pub mod error;
pub mod fragment;
pub mod generate;
pub mod handle;
pub mod merge;
pub mod verify;
pub mod workdir;

pub use error::{FragError, Result};
pub use fragment::{fragment_count, fragment_lengths, split_file, Fragment};
pub use generate::generate_random_file;
pub use handle::ContentHandle;
pub use merge::merge_files;
pub use verify::{compare_files, files_equal};
pub use workdir::{size_label, WorkDir};

/// Default size of the generated test file (1 KiB)
pub const DEFAULT_TOTAL_SIZE: u64 = 1024;

/// Default fragment size (1 KiB = 4 x 256 B)
pub const DEFAULT_FRAGMENT_SIZE: u64 = 256;

/// Buffer size used when streaming files (32 KiB)
pub const IO_BUFFER_SIZE: usize = 32 * 1024;
