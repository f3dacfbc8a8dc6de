use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ADDRESS_PREFIX: &str = "0x";

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 32;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address format: {0}")]
    InvalidFormat(String),

    #[error("Invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),
}

/// A 32-byte principal identifier.
///
/// Used for owners, depositors, the vault's own custody account and the
/// handles of external assets alike. Displayed as `0x` followed by lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Create an address from raw bytes
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a random address
    pub fn generate() -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derive a deterministic address from a human-readable label.
    ///
    /// The same label always maps to the same address, which lets the CLI and
    /// tests refer to accounts as "alice" or "usdc".
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"address:");
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Parse a `0x`-prefixed hex address
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let hex_part = s
            .strip_prefix(ADDRESS_PREFIX)
            .ok_or_else(|| AddressError::InvalidFormat(format!("missing '{}' prefix", ADDRESS_PREFIX)))?;

        let decoded = hex::decode(hex_part).map_err(|e| AddressError::InvalidHex(e.to_string()))?;

        let bytes: [u8; ADDRESS_LEN] = decoded.as_slice().try_into().map_err(|_| {
            AddressError::InvalidLength {
                expected: ADDRESS_LEN,
                got: decoded.len(),
            }
        })?;

        Ok(Self(bytes))
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Short form used in log lines: first four bytes of hex
    pub fn short(&self) -> String {
        format!("{}{}", ADDRESS_PREFIX, hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ADDRESS_PREFIX, hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
