// Custody errors - every failure the engine can report to a caller

use crate::assets::{Amount, AssetId};
use crate::identity::Address;
use thiserror::Error;

/// Errors returned by custody operations.
///
/// Every error aborts the operation it came from with no state change and
/// no event emitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unauthorized: {caller} is not an owner")]
    Unauthorized { caller: Address },

    #[error("Asset already registered: {0}")]
    AssetAlreadyRegistered(AssetId),

    #[error("Asset not registered: {0}")]
    AssetNotRegistered(AssetId),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Native value {attached} attached to a deposit of {asset}")]
    MixedAssetDeposit { asset: AssetId, attached: Amount },

    #[error("External transfer of {asset} failed: {reason}")]
    ExternalTransferFailed { asset: AssetId, reason: String },

    #[error("Transaction {0} not found")]
    TransactionNotFound(usize),

    #[error("Transaction {index} already confirmed by {owner}")]
    AlreadyConfirmed { index: usize, owner: Address },

    #[error("Transaction {0} already executed")]
    AlreadyExecuted(usize),

    #[error("Transaction {index} has {confirmations} confirmations, {required} required")]
    InsufficientConfirmations {
        index: usize,
        confirmations: usize,
        required: usize,
    },

    #[error("Insufficient native balance: available {available}, required {required}")]
    InsufficientNativeBalance { available: Amount, required: Amount },

    #[error("State export/import error: {0}")]
    StateError(String),
}

/// Result type for custody operations
pub type CustodyResult<T> = Result<T, CustodyError>;
