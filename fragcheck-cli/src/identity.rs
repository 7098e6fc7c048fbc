//! Wallet address check
//!
//! Derives the Ethereum-style address of the configured secp256k1 private
//! key and compares it with the address the user expects. The result is
//! informational: a mismatch or an unparsable key only produces a warning.

use ethers::types::H160;
use secp256k1::{PublicKey, SecretKey, SECP256K1};
use sha3::{Digest, Keccak256};
use std::fmt;
use thiserror::Error;

/// Address length in bytes
pub const ADDRESS_SIZE: usize = 20;

/// Identity errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub fn from_bytes(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// Parse a hex address, with or without `0x`, in any letter case
    pub fn parse(s: &str) -> Result<Self, IdentityError> {
        let digits = strip_hex_prefix(s.trim());
        let bytes =
            hex::decode(digits).map_err(|e| IdentityError::InvalidAddress(e.to_string()))?;

        if bytes.len() != ADDRESS_SIZE {
            return Err(IdentityError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_SIZE,
                bytes.len()
            )));
        }

        let mut arr = [0u8; ADDRESS_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Lowercase `0x` hex
    pub fn to_lower_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case checksum form
    pub fn to_checksum(&self) -> String {
        ethers::utils::to_checksum(&H160::from(self.0), None)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Parse a hex private key, with or without `0x`
pub fn parse_private_key(private_key: &str) -> Result<SecretKey, IdentityError> {
    let bytes = hex::decode(strip_hex_prefix(private_key.trim()))
        .map_err(|e| IdentityError::InvalidPrivateKey(e.to_string()))?;

    SecretKey::from_slice(&bytes).map_err(|e| IdentityError::InvalidPrivateKey(e.to_string()))
}

/// Keccak-256 of the uncompressed public key without its tag byte, last 20 bytes
pub fn public_key_to_address(public: &PublicKey) -> Address {
    let hash = Keccak256::digest(&public.serialize_uncompressed()[1..]);

    let mut arr = [0u8; ADDRESS_SIZE];
    arr.copy_from_slice(&hash[12..]);
    Address(arr)
}

/// Derive the address controlled by a private key
pub fn derive_address(private_key: &str) -> Result<Address, IdentityError> {
    let secret = parse_private_key(private_key)?;
    let public = PublicKey::from_secret_key(SECP256K1, &secret);
    Ok(public_key_to_address(&public))
}

/// Outcome of checking a private key against the expected address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressCheck {
    /// No expected address to compare with
    Unchecked { derived: Address },
    Match { derived: Address },
    Mismatch { derived: Address, expected: String },
    InvalidKey(IdentityError),
}

impl AddressCheck {
    pub fn is_match(&self) -> bool {
        matches!(self, AddressCheck::Match { .. })
    }

    pub fn derived(&self) -> Option<&Address> {
        match self {
            AddressCheck::Unchecked { derived }
            | AddressCheck::Match { derived }
            | AddressCheck::Mismatch { derived, .. } => Some(derived),
            AddressCheck::InvalidKey(_) => None,
        }
    }
}

/// Derive the address of `private_key` and compare it with `expected` when
/// one is given.
///
/// The comparison ignores letter case. An `expected` value that is not a
/// valid address counts as a mismatch.
pub fn check_key(private_key: &str, expected: Option<&str>) -> AddressCheck {
    let derived = match derive_address(private_key) {
        Ok(address) => address,
        Err(e) => return AddressCheck::InvalidKey(e),
    };

    let Some(expected) = expected else {
        return AddressCheck::Unchecked { derived };
    };

    match Address::parse(expected) {
        Ok(parsed) if parsed == derived => AddressCheck::Match { derived },
        _ => AddressCheck::Mismatch {
            derived,
            expected: expected.to_string(),
        },
    }
}

/// Compare the address derived from `private_key` with `expected`
pub fn check_address(private_key: &str, expected: &str) -> AddressCheck {
    check_key(private_key, Some(expected))
}
