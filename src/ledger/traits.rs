// Asset ledger trait - the interface the vault calls to move value

use crate::assets::Amount;
use crate::identity::Address;
use thiserror::Error;

/// Errors reported by an asset ledger
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Amount, required: Amount },

    #[error("Insufficient allowance: approved {approved}, required {required}")]
    InsufficientAllowance { approved: Amount, required: Amount },

    #[error("Balance would overflow")]
    Overflow,

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Ledger holding external assets and native wallets.
///
/// Implementations must be safe to call from several threads. The vault
/// never holds its state lock while calling into the ledger, so an
/// implementation may call back into the vault.
pub trait AssetLedger: Send + Sync {
    /// Pull `amount` of `token` from `from` into `spender`, consuming the
    /// allowance `from` granted to `spender`
    fn transfer_from(
        &self,
        token: &Address,
        spender: &Address,
        from: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Push `amount` of `token` from `from` to `to`
    fn transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Holdings of `token` by `account`
    fn balance_of(&self, token: &Address, account: &Address) -> Amount;

    /// Deliver native value released from custody to `to`
    fn send_native(&self, to: &Address, amount: Amount) -> Result<(), LedgerError>;

    /// Native wallet balance of `account`
    fn native_balance_of(&self, account: &Address) -> Amount;
}
