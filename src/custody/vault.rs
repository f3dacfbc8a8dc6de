// Vault - shared handle over the custody state and the asset ledger
//
// State changes happen under one mutex. Calls to the ledger are made with
// the mutex released and only after the state change they depend on has
// been committed, so a ledger that calls back into the vault sees the
// updated state.

use crate::assets::{Amount, AssetId};
use crate::custody::{CustodyConfig, CustodyEvent, CustodyState, CustodyStats, Release};
use crate::error::{CustodyError, CustodyResult};
use crate::identity::Address;
use crate::ledger::{AssetLedger, LedgerError};
use crate::queue::Transaction;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// A custody vault: M-of-N owners jointly control every release of funds.
///
/// Cloning yields another handle to the same vault.
#[derive(Clone)]
pub struct Vault {
    state: Arc<Mutex<CustodyState>>,
    ledger: Arc<dyn AssetLedger>,
}

impl Vault {
    /// Create a vault with an empty balance sheet and queue
    pub fn new(config: CustodyConfig, ledger: Arc<dyn AssetLedger>) -> CustodyResult<Self> {
        let state = CustodyState::new(config)?;
        debug!(
            owners = state.owners().owner_count(),
            threshold = state.owners().threshold(),
            "vault created"
        );
        Ok(Self::from_state(state, ledger))
    }

    /// Resume a vault from previously exported state
    pub fn from_state(state: CustodyState, ledger: Arc<dyn AssetLedger>) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            ledger,
        }
    }

    /// Operations never panic while holding the lock, so a poisoned lock
    /// still guards consistent state.
    fn state(&self) -> MutexGuard<'_, CustodyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn custody_account(&self) -> Address {
        self.state().config().custody_account
    }

    fn transfer_failed(asset: AssetId, err: LedgerError) -> CustodyError {
        CustodyError::ExternalTransferFailed {
            asset,
            reason: err.to_string(),
        }
    }

    // ========================================================================
    // OWNER REGISTRY QUERIES
    // ========================================================================

    pub fn is_owner(&self, principal: &Address) -> bool {
        self.state().owners().is_owner(principal)
    }

    pub fn owner_count(&self) -> usize {
        self.state().owners().owner_count()
    }

    /// Owner at a construction-order position
    pub fn owner_at(&self, index: usize) -> Option<Address> {
        self.state().owners().owner_at(index).copied()
    }

    pub fn owners(&self) -> Vec<Address> {
        self.state().owners().owners().to_vec()
    }

    pub fn threshold(&self) -> usize {
        self.state().owners().threshold()
    }

    // ========================================================================
    // BALANCE SHEET
    // ========================================================================

    /// Add an external asset to the balance sheet. Owners only.
    pub fn register_asset(&self, caller: &Address, asset: AssetId) -> CustodyResult<()> {
        self.state().register_asset(caller, asset)
    }

    pub fn is_registered(&self, asset: &AssetId) -> bool {
        self.state().balance_sheet().is_registered(asset)
    }

    /// Registered external assets
    pub fn registered_assets(&self) -> Vec<AssetId> {
        self.state().balance_sheet().registered_assets().collect()
    }

    /// The locally tracked native balance
    pub fn native_balance(&self) -> Amount {
        self.state().balance_sheet().native_balance()
    }

    /// What the vault currently holds of `asset`
    pub fn custody_holdings(&self, asset: &AssetId) -> Amount {
        match asset {
            AssetId::Native => self.native_balance(),
            AssetId::External(token) => self.ledger.balance_of(token, &self.custody_account()),
        }
    }

    /// What `account` holds of `asset` on the ledger
    pub fn holdings_of(&self, asset: &AssetId, account: &Address) -> Amount {
        match asset {
            AssetId::Native => self.ledger.native_balance_of(account),
            AssetId::External(token) => self.ledger.balance_of(token, account),
        }
    }

    // ========================================================================
    // DEPOSITS
    // ========================================================================

    /// Deposit into custody.
    ///
    /// For native deposits `attached` is the native value the host moved
    /// along with the call and must equal `amount`. External deposits carry
    /// no native value; the amount is pulled from `caller` through the ledger
    /// and requires a prior allowance to the custody account.
    pub fn deposit(
        &self,
        caller: &Address,
        asset: AssetId,
        amount: Amount,
        attached: Amount,
    ) -> CustodyResult<()> {
        let token = match asset {
            AssetId::Native => {
                self.state().deposit_native(caller, amount, attached)?;
                return Ok(());
            }
            AssetId::External(token) => token,
        };

        // Registrations are permanent, so the check stays valid after the lock is dropped.
        let custody = {
            let state = self.state();
            state.validate_deposit(&asset, amount, attached)?;
            state.config().custody_account
        };

        self.ledger
            .transfer_from(&token, &custody, caller, amount)
            .map_err(|e| {
                warn!(caller = %caller.short(), %asset, amount, error = %e, "deposit pull failed");
                Self::transfer_failed(asset, e)
            })?;

        self.state().record_asset_deposit(caller, asset, amount);
        Ok(())
    }

    // ========================================================================
    // PROPOSALS AND CONFIRMATIONS
    // ========================================================================

    /// Propose releasing `amount` of `asset`. Owners only. Returns the index.
    pub fn propose(&self, caller: &Address, asset: AssetId, amount: Amount) -> CustodyResult<usize> {
        self.state().propose(caller, asset, amount, Utc::now())
    }

    /// Confirm a proposal. Owners only, once per owner.
    pub fn confirm(&self, caller: &Address, index: usize) -> CustodyResult<usize> {
        self.state().confirm(caller, index)
    }

    /// Snapshot of a transaction
    pub fn transaction(&self, index: usize) -> CustodyResult<Transaction> {
        self.state().transaction(index).cloned()
    }

    pub fn transaction_count(&self) -> usize {
        self.state().queue().len()
    }

    pub fn is_confirmed_by(&self, index: usize, owner: &Address) -> CustodyResult<bool> {
        Ok(self.state().transaction(index)?.is_confirmed_by(owner))
    }

    /// Transactions not yet executed
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.state().queue().pending().into_iter().cloned().collect()
    }

    /// Pending transactions that reached quorum
    pub fn executable_transactions(&self) -> Vec<Transaction> {
        let state = self.state();
        let threshold = state.owners().threshold();
        state.queue().executable(threshold).into_iter().cloned().collect()
    }

    // ========================================================================
    // EXECUTION
    // ========================================================================

    /// Execute a proposal that reached quorum, releasing its funds to `caller`.
    ///
    /// The transaction is marked executed (and the native counter debited)
    /// before any value leaves the vault. If the ledger rejects the release,
    /// both are rolled back and `ExternalTransferFailed` is returned.
    pub fn execute(&self, caller: &Address, index: usize) -> CustodyResult<Release> {
        let (release, custody) = {
            let mut state = self.state();
            let release = state.begin_execution(caller, index, Utc::now())?;
            (release, state.config().custody_account)
        };

        let outcome = match release.asset {
            AssetId::Native => self.ledger.send_native(&release.recipient, release.amount),
            AssetId::External(token) => {
                self.ledger
                    .transfer(&token, &custody, &release.recipient, release.amount)
            }
        };

        let mut state = self.state();
        match outcome {
            Ok(()) => {
                state.complete_execution(&release);
                Ok(release)
            }
            Err(e) => {
                state.abort_execution(&release, &e.to_string());
                Err(Self::transfer_failed(release.asset, e))
            }
        }
    }

    // ========================================================================
    // EVENTS, STATS AND EXPORT
    // ========================================================================

    /// Drain events emitted since the last poll
    pub fn poll_events(&self) -> Vec<CustodyEvent> {
        self.state().poll_events()
    }

    pub fn stats(&self) -> CustodyStats {
        self.state().stats()
    }

    pub fn config(&self) -> CustodyConfig {
        self.state().config().clone()
    }

    /// Copy of the full state for persistence
    pub fn export_state(&self) -> CustodyState {
        self.state().clone()
    }
}
