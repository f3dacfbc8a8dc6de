// Custody configuration - construction parameters of a vault

use crate::error::{CustodyError, CustodyResult};
use crate::identity::Address;
use crate::registry::OwnerRegistry;
use serde::{Deserialize, Serialize};

/// Label from which the default custody account is derived
pub const DEFAULT_CUSTODY_LABEL: &str = "quorum-vault";

/// Who may trigger execution of a proposal that reached quorum.
///
/// Released funds always go to the caller of `execute`, so this decides who
/// can receive them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionPolicy {
    /// Anyone may execute once quorum is reached
    #[default]
    AnyCaller,
    /// Only owners may execute
    OwnersOnly,
}

/// Configuration for a custody vault
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyConfig {
    /// Ordered, distinct owners
    pub owners: Vec<Address>,
    /// Confirmations required before execution
    pub threshold: usize,
    /// The vault's own account on the asset ledger
    pub custody_account: Address,
    /// Who may execute
    pub execution_policy: ExecutionPolicy,
}

impl CustodyConfig {
    /// M-of-N configuration with default custody account and policy
    pub fn new(owners: Vec<Address>, threshold: usize) -> Self {
        Self {
            owners,
            threshold,
            custody_account: Address::from_label(DEFAULT_CUSTODY_LABEL),
            execution_policy: ExecutionPolicy::default(),
        }
    }

    /// N-of-N configuration: every owner must confirm
    pub fn unanimous(owners: Vec<Address>) -> Self {
        let threshold = owners.len();
        Self::new(owners, threshold)
    }

    /// Set the custody account
    pub fn with_custody_account(mut self, account: Address) -> Self {
        self.custody_account = account;
        self
    }

    /// Set the execution policy
    pub fn with_execution_policy(mut self, policy: ExecutionPolicy) -> Self {
        self.execution_policy = policy;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> CustodyResult<()> {
        self.owner_registry().map(|_| ())
    }

    /// Build the owner registry described by this configuration
    pub(crate) fn owner_registry(&self) -> CustodyResult<OwnerRegistry> {
        let registry = OwnerRegistry::new(self.owners.clone(), self.threshold)?;
        if registry.is_owner(&self.custody_account) {
            return Err(CustodyError::InvalidConfiguration(format!(
                "custody account {} cannot be an owner",
                self.custody_account
            )));
        }
        Ok(registry)
    }
}
