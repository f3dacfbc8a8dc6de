use crate::error::{CustodyError, CustodyResult};
use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Immutable committee of owners and the confirmation threshold.
///
/// Built once; there are no add or remove operations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OwnerRegistry {
    /// Owners in construction order
    owners: Vec<Address>,
    /// Membership index
    members: BTreeSet<Address>,
    /// Confirmations required to execute (M)
    threshold: usize,
}

impl OwnerRegistry {
    /// Build a registry from distinct owners and a threshold in `[1, owners.len()]`
    pub fn new(owners: Vec<Address>, threshold: usize) -> CustodyResult<Self> {
        if owners.is_empty() {
            return Err(CustodyError::InvalidConfiguration(
                "owner list cannot be empty".to_string(),
            ));
        }

        let mut members = BTreeSet::new();
        for owner in &owners {
            if !members.insert(*owner) {
                return Err(CustodyError::InvalidConfiguration(format!(
                    "duplicate owner {}",
                    owner
                )));
            }
        }

        if threshold == 0 || threshold > owners.len() {
            return Err(CustodyError::InvalidConfiguration(format!(
                "threshold {} outside [1, {}]",
                threshold,
                owners.len()
            )));
        }

        Ok(Self {
            owners,
            members,
            threshold,
        })
    }

    pub fn is_owner(&self, principal: &Address) -> bool {
        self.members.contains(principal)
    }

    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Owner at a construction-order position
    pub fn owner_at(&self, index: usize) -> Option<&Address> {
        self.owners.get(index)
    }

    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Fail with `Unauthorized` unless `caller` is an owner
    pub fn ensure_owner(&self, caller: &Address) -> CustodyResult<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(CustodyError::Unauthorized { caller: *caller })
        }
    }
}
