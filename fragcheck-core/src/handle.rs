//! Content handles
//!
//! A content handle is the opaque 32-byte fingerprint a storage backend
//! returns for an uploaded fragment. It is rendered as `0x`-prefixed hex,
//! the same way ledger root hashes are written.
//!
//! Handles say nothing about where a fragment sits in the original file;
//! the caller keeps that mapping.

use crate::error::{FragError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Handle length in bytes
pub const HANDLE_SIZE: usize = 32;

/// Content-addressed fragment identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHandle([u8; HANDLE_SIZE]);

impl ContentHandle {
    /// Create a handle from raw bytes
    pub fn from_bytes(bytes: [u8; HANDLE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Compute the Blake3 fingerprint of data
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Check that data has this fingerprint
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::compute(data) == *self
    }

    /// Get the raw handle bytes
    pub fn as_bytes(&self) -> &[u8; HANDLE_SIZE] {
        &self.0
    }

    /// Convert to `0x`-prefixed lowercase hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without the `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let bytes = hex::decode(digits).map_err(|e| FragError::InvalidHandle(e.to_string()))?;

        if bytes.len() != HANDLE_SIZE {
            return Err(FragError::InvalidHandle(format!(
                "Invalid length: expected {}, got {}",
                HANDLE_SIZE,
                bytes.len()
            )));
        }

        let mut arr = [0u8; HANDLE_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl FromStr for ContentHandle {
    type Err = FragError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHandle({})", &self.to_hex()[..18])
    }
}

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ContentHandle {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHandle {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
