// Transaction queue - append-only log of proposals indexed by position

use crate::assets::{Amount, AssetId};
use crate::error::{CustodyError, CustodyResult};
use crate::identity::Address;
use crate::queue::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered, append-only sequence of transactions.
///
/// A transaction's index is its position and never changes; nothing is
/// ever removed or reordered.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransactionQueue {
    transactions: Vec<Transaction>,
}

impl TransactionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new proposal and return its index
    pub(crate) fn push(
        &mut self,
        asset: AssetId,
        amount: Amount,
        proposer: Address,
        proposed_at: DateTime<Utc>,
    ) -> usize {
        let index = self.transactions.len();
        self.transactions
            .push(Transaction::new(index, asset, amount, proposer, proposed_at));
        index
    }

    /// Look up a transaction, failing with `TransactionNotFound`
    pub fn get(&self, index: usize) -> CustodyResult<&Transaction> {
        self.transactions
            .get(index)
            .ok_or(CustodyError::TransactionNotFound(index))
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> CustodyResult<&mut Transaction> {
        self.transactions
            .get_mut(index)
            .ok_or(CustodyError::TransactionNotFound(index))
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    /// Transactions not yet executed
    pub fn pending(&self) -> Vec<&Transaction> {
        self.transactions.iter().filter(|t| !t.is_executed()).collect()
    }

    /// Pending transactions that have reached quorum
    pub fn executable(&self, threshold: usize) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|t| !t.is_executed() && t.has_quorum(threshold))
            .collect()
    }

    /// Number of executed transactions
    pub fn executed_count(&self) -> usize {
        self.transactions.iter().filter(|t| t.is_executed()).count()
    }
}
