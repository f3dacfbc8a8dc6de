// MemoryLedger - in-process reference implementation of AssetLedger
// Backs the CLI and the test-suite; supports failure injection

use crate::assets::Amount;
use crate::identity::Address;
use crate::ledger::{AssetLedger, LedgerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Plain balances and allowances; the serializable part of a MemoryLedger
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBook {
    /// (token, account) -> balance
    balances: BTreeMap<(Address, Address), Amount>,
    /// (token, owner, spender) -> remaining allowance
    allowances: BTreeMap<(Address, Address, Address), Amount>,
    /// account -> native wallet balance
    native: BTreeMap<Address, Amount>,
}

impl LedgerBook {
    fn balance(&self, token: &Address, account: &Address) -> Amount {
        self.balances.get(&(*token, *account)).copied().unwrap_or(0)
    }

    fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn credit(&mut self, token: &Address, account: &Address, amount: Amount) -> Result<(), LedgerError> {
        let entry = self.balances.entry((*token, *account)).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    fn move_balance(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.balance(token, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        if self.balance(token, to).checked_add(amount).is_none() {
            return Err(LedgerError::Overflow);
        }
        self.balances.insert((*token, *from), available - amount);
        self.credit(token, to, amount)
    }
}

/// Thread-safe in-memory asset ledger.
///
/// Tokens need no deployment: any address can be used as a token handle and
/// is funded with [`MemoryLedger::mint`].
#[derive(Debug, Default)]
pub struct MemoryLedger {
    book: Mutex<LedgerBook>,
    /// When set, every transfer is rejected with this reason
    failure: Mutex<Option<String>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a ledger from a snapshot
    pub fn from_book(book: LedgerBook) -> Self {
        Self {
            book: Mutex::new(book),
            failure: Mutex::new(None),
        }
    }

    /// Copy of the current balances and allowances
    pub fn snapshot(&self) -> LedgerBook {
        self.book().clone()
    }

    fn book(&self) -> MutexGuard<'_, LedgerBook> {
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failure(&self) -> Result<(), LedgerError> {
        match self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(reason) => Err(LedgerError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }

    /// Reject every subsequent transfer with `reason`
    pub fn fail_transfers(&self, reason: &str) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason.to_string());
    }

    /// Stop rejecting transfers
    pub fn resume_transfers(&self) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    // ========================================================================
    // FAUCET AND ALLOWANCES
    // ========================================================================

    /// Create `amount` of `token` in `to`'s account
    pub fn mint(&self, token: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.book().credit(token, to, amount)
    }

    /// Create native value in `to`'s wallet
    pub fn mint_native(&self, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        let mut book = self.book();
        let entry = book.native.entry(*to).or_insert(0);
        *entry = entry.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Take native value out of `from`'s wallet, e.g. to attach it to a deposit
    pub fn withdraw_native(&self, from: &Address, amount: Amount) -> Result<(), LedgerError> {
        let mut book = self.book();
        let available = book.native.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        book.native.insert(*from, available - amount);
        Ok(())
    }

    /// Let `spender` pull up to `amount` of `owner`'s `token`
    pub fn approve(&self, token: &Address, owner: &Address, spender: &Address, amount: Amount) {
        self.book()
            .allowances
            .insert((*token, *owner, *spender), amount);
    }

    /// Remaining allowance `owner` granted `spender`
    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.book().allowance(token, owner, spender)
    }
}

impl AssetLedger for MemoryLedger {
    fn transfer_from(
        &self,
        token: &Address,
        spender: &Address,
        from: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.check_failure()?;
        let mut book = self.book();

        let approved = book.allowance(token, from, spender);
        if approved < amount {
            return Err(LedgerError::InsufficientAllowance {
                approved,
                required: amount,
            });
        }

        book.move_balance(token, from, spender, amount)?;
        book.allowances
            .insert((*token, *from, *spender), approved - amount);

        debug!(token = %token.short(), from = %from.short(), to = %spender.short(), amount, "transfer_from");
        Ok(())
    }

    fn transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.check_failure()?;
        self.book().move_balance(token, from, to, amount)?;
        debug!(token = %token.short(), from = %from.short(), to = %to.short(), amount, "transfer");
        Ok(())
    }

    fn balance_of(&self, token: &Address, account: &Address) -> Amount {
        self.book().balance(token, account)
    }

    fn send_native(&self, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.check_failure()?;
        self.mint_native(to, amount)?;
        debug!(to = %to.short(), amount, "send_native");
        Ok(())
    }

    fn native_balance_of(&self, account: &Address) -> Amount {
        self.book().native.get(account).copied().unwrap_or(0)
    }
}
