use crate::identity::{Address, AddressError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Quantity of an asset in its smallest unit
pub type Amount = u64;

const NATIVE_LABEL: &str = "native";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssetParseError {
    #[error("Invalid asset identifier '{input}': {source}")]
    InvalidAddress {
        input: String,
        #[source]
        source: AddressError,
    },
}

/// Identifies an asset held in custody.
///
/// `Native` is the base value unit whose balance the vault tracks itself.
/// `External` assets live on the asset ledger and are named by their token address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetId {
    Native,
    External(Address),
}

impl AssetId {
    /// Shorthand for an external asset
    pub fn external(token: Address) -> Self {
        Self::External(token)
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    /// Token address of an external asset, `None` for native
    pub fn token(&self) -> Option<&Address> {
        match self {
            Self::Native => None,
            Self::External(token) => Some(token),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str(NATIVE_LABEL),
            Self::External(token) => write!(f, "{}", token),
        }
    }
}

impl FromStr for AssetId {
    type Err = AssetParseError;

    /// Accepts `native` or a `0x` token address
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(NATIVE_LABEL) {
            return Ok(Self::Native);
        }
        Address::parse(s)
            .map(Self::External)
            .map_err(|source| AssetParseError::InvalidAddress {
                input: s.to_string(),
                source,
            })
    }
}

impl From<Address> for AssetId {
    fn from(token: Address) -> Self {
        Self::External(token)
    }
}
