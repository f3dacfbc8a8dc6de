// Custody state - the authorization state machine
//
// Every method here runs with exclusive access to the state and either
// commits completely or returns an error having changed nothing. Calls to
// the asset ledger happen outside, in `Vault`.

use crate::assets::{Amount, AssetId, BalanceSheet};
use crate::custody::{CustodyConfig, CustodyEvent, ExecutionPolicy};
use crate::error::{CustodyError, CustodyResult};
use crate::identity::Address;
use crate::queue::{Transaction, TransactionQueue};
use crate::registry::OwnerRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Funds committed for release by an execution in progress
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Release {
    pub index: usize,
    pub asset: AssetId,
    pub amount: Amount,
    /// The caller of `execute`
    pub recipient: Address,
}

/// Summary counters for a vault
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustodyStats {
    pub owner_count: usize,
    pub threshold: usize,
    pub registered_assets: usize,
    pub proposals: usize,
    pub executed: usize,
    pub pending: usize,
    pub native_balance: Amount,
}

/// Owner registry, balance sheet and transaction queue of one vault
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustodyState {
    config: CustodyConfig,
    owners: OwnerRegistry,
    balance_sheet: BalanceSheet,
    queue: TransactionQueue,
    /// Events not yet polled
    #[serde(skip)]
    events: Vec<CustodyEvent>,
}

impl CustodyState {
    /// Create an empty state for a validated configuration
    pub fn new(config: CustodyConfig) -> CustodyResult<Self> {
        let owners = config.owner_registry()?;
        Ok(Self {
            config,
            owners,
            balance_sheet: BalanceSheet::new(),
            queue: TransactionQueue::new(),
            events: Vec::new(),
        })
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn config(&self) -> &CustodyConfig {
        &self.config
    }

    pub fn owners(&self) -> &OwnerRegistry {
        &self.owners
    }

    pub fn balance_sheet(&self) -> &BalanceSheet {
        &self.balance_sheet
    }

    pub fn queue(&self) -> &TransactionQueue {
        &self.queue
    }

    pub fn transaction(&self, index: usize) -> CustodyResult<&Transaction> {
        self.queue.get(index)
    }

    pub fn stats(&self) -> CustodyStats {
        CustodyStats {
            owner_count: self.owners.owner_count(),
            threshold: self.owners.threshold(),
            registered_assets: self.balance_sheet.registered_count(),
            proposals: self.queue.len(),
            executed: self.queue.executed_count(),
            pending: self.queue.len() - self.queue.executed_count(),
            native_balance: self.balance_sheet.native_balance(),
        }
    }

    // ========================================================================
    // ASSET REGISTRATION
    // ========================================================================

    pub fn register_asset(&mut self, caller: &Address, asset: AssetId) -> CustodyResult<()> {
        self.owners.ensure_owner(caller)?;
        self.balance_sheet.register(asset)?;

        info!(caller = %caller.short(), %asset, "asset registered");
        self.events.push(CustodyEvent::AssetRegistered { asset });
        Ok(())
    }

    // ========================================================================
    // DEPOSITS
    // ========================================================================

    /// Check a deposit without applying it
    pub fn validate_deposit(&self, asset: &AssetId, amount: Amount, attached: Amount) -> CustodyResult<()> {
        match asset {
            AssetId::Native => {
                if amount == 0 {
                    return Err(CustodyError::InvalidAmount("deposit amount must be > 0".to_string()));
                }
                if attached != amount {
                    return Err(CustodyError::InvalidAmount(format!(
                        "attached native value {} does not match declared amount {}",
                        attached, amount
                    )));
                }
            }
            AssetId::External(_) => {
                if attached != 0 {
                    return Err(CustodyError::MixedAssetDeposit {
                        asset: *asset,
                        attached,
                    });
                }
                self.balance_sheet.ensure_registered(asset)?;
                if amount == 0 {
                    return Err(CustodyError::InvalidAmount("deposit amount must be > 0".to_string()));
                }
            }
        }
        Ok(())
    }

    /// Accept a native deposit, returning the new native balance
    pub fn deposit_native(&mut self, caller: &Address, amount: Amount, attached: Amount) -> CustodyResult<Amount> {
        self.validate_deposit(&AssetId::Native, amount, attached)?;
        let balance = self.balance_sheet.credit_native(amount)?;

        info!(caller = %caller.short(), amount, balance, "native deposited");
        self.events.push(CustodyEvent::NativeDeposited { amount });
        Ok(balance)
    }

    /// Record an external deposit whose ledger pull already succeeded
    pub(crate) fn record_asset_deposit(&mut self, caller: &Address, asset: AssetId, amount: Amount) {
        info!(caller = %caller.short(), %asset, amount, "asset deposited");
        self.events.push(CustodyEvent::AssetDeposited { asset, amount });
    }

    // ========================================================================
    // PROPOSALS AND CONFIRMATIONS
    // ========================================================================

    /// Append a withdrawal proposal. Balance and registration are not checked.
    pub fn propose(
        &mut self,
        caller: &Address,
        asset: AssetId,
        amount: Amount,
        at: DateTime<Utc>,
    ) -> CustodyResult<usize> {
        self.owners.ensure_owner(caller)?;
        let index = self.queue.push(asset, amount, *caller, at);

        info!(index, caller = %caller.short(), %asset, amount, "transaction proposed");
        self.events.push(CustodyEvent::TransactionProposed {
            index,
            asset,
            amount,
        });
        Ok(index)
    }

    /// Confirm a proposal, returning its new confirmation count
    pub fn confirm(&mut self, caller: &Address, index: usize) -> CustodyResult<usize> {
        self.owners.ensure_owner(caller)?;
        let confirmations = self.queue.get_mut(index)?.confirm(*caller)?;

        info!(
            index,
            owner = %caller.short(),
            confirmations,
            threshold = self.owners.threshold(),
            "transaction confirmed"
        );
        self.events.push(CustodyEvent::TransactionConfirmed {
            owner: *caller,
            index,
        });
        Ok(confirmations)
    }

    // ========================================================================
    // EXECUTION
    // ========================================================================

    /// Check quorum and commit the effects of an execution.
    ///
    /// Checked in order: policy, existence, already executed, quorum,
    /// registration of an external asset, non-zero amount, then the native
    /// balance. On success the transaction is marked executed and, for native
    /// releases, the counter is debited. The caller must then move the funds
    /// and call either `complete_execution` or `abort_execution`.
    pub fn begin_execution(
        &mut self,
        caller: &Address,
        index: usize,
        at: DateTime<Utc>,
    ) -> CustodyResult<Release> {
        if self.config.execution_policy == ExecutionPolicy::OwnersOnly {
            self.owners.ensure_owner(caller)?;
        }

        let threshold = self.owners.threshold();
        let tx = self.queue.get(index)?;
        tx.ensure_executable(threshold)?;
        let release = Release {
            index,
            asset: *tx.asset(),
            amount: tx.amount(),
            recipient: *caller,
        };

        self.balance_sheet.ensure_registered(&release.asset)?;
        if release.amount == 0 {
            return Err(CustodyError::InvalidAmount(format!(
                "transaction {} releases nothing",
                index
            )));
        }
        if release.asset.is_native() {
            self.balance_sheet.debit_native(release.amount)?;
        }

        if let Err(e) = self
            .queue
            .get_mut(index)
            .and_then(|tx| tx.mark_executed(threshold, *caller, at))
        {
            if release.asset.is_native() {
                self.balance_sheet.restore_native(release.amount);
            }
            return Err(e);
        }

        Ok(release)
    }

    /// Finish an execution whose funds were delivered
    pub(crate) fn complete_execution(&mut self, release: &Release) {
        if release.asset.is_native() {
            self.balance_sheet.settle_native(release.amount);
        }
        info!(
            index = release.index,
            asset = %release.asset,
            amount = release.amount,
            recipient = %release.recipient.short(),
            "transaction executed"
        );
        self.events.push(CustodyEvent::TransactionExecuted {
            index: release.index,
        });
    }

    /// Roll back an execution whose funds could not be delivered
    pub(crate) fn abort_execution(&mut self, release: &Release, reason: &str) {
        if let Ok(tx) = self.queue.get_mut(release.index) {
            tx.revert_execution();
        }
        if release.asset.is_native() {
            self.balance_sheet.restore_native(release.amount);
        }
        warn!(index = release.index, asset = %release.asset, reason, "execution rolled back");
    }

    // ========================================================================
    // EVENTS AND SERIALIZATION
    // ========================================================================

    /// Drain events emitted since the last poll
    pub fn poll_events(&mut self) -> Vec<CustodyEvent> {
        std::mem::take(&mut self.events)
    }

    /// Serialize the state (pending events are not included)
    pub fn to_bytes(&self) -> CustodyResult<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|e| CustodyError::StateError(e.to_string()))
    }

    /// Deserialize a state, re-checking that it is internally consistent
    pub fn from_bytes(bytes: &[u8]) -> CustodyResult<Self> {
        let state: Self =
            postcard::from_bytes(bytes).map_err(|e| CustodyError::StateError(e.to_string()))?;
        state.check_consistency()?;
        Ok(state)
    }

    fn check_consistency(&self) -> CustodyResult<()> {
        let registry = self
            .config
            .owner_registry()
            .map_err(|e| CustodyError::StateError(e.to_string()))?;
        if registry.owners() != self.owners.owners() || registry.threshold() != self.owners.threshold() {
            return Err(CustodyError::StateError(
                "owner registry does not match configuration".to_string(),
            ));
        }

        for (position, tx) in self.queue.iter().enumerate() {
            if tx.index() != position {
                return Err(CustodyError::StateError(format!(
                    "transaction at position {} carries index {}",
                    position,
                    tx.index()
                )));
            }
            if let Some(stranger) = tx.confirmed_by().find(|o| !self.owners.is_owner(o)) {
                return Err(CustodyError::StateError(format!(
                    "transaction {} confirmed by non-owner {}",
                    position, stranger
                )));
            }
        }
        Ok(())
    }
}
