// Transaction - one withdrawal proposal with its confirmation set

use crate::assets::{Amount, AssetId};
use crate::error::{CustodyError, CustodyResult};
use crate::identity::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A proposal to release `amount` of `asset` from custody.
///
/// The confirmation count is the size of the confirming-owner set, so the
/// two can never disagree. `executed` only ever moves from false to true,
/// except when a failed outbound transfer rolls the whole execution back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    index: usize,
    asset: AssetId,
    amount: Amount,
    proposer: Address,
    proposed_at: DateTime<Utc>,
    confirmed_by: BTreeSet<Address>,
    executed: bool,
    executed_by: Option<Address>,
    executed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub(crate) fn new(
        index: usize,
        asset: AssetId,
        amount: Amount,
        proposer: Address,
        proposed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            asset,
            amount,
            proposer,
            proposed_at,
            confirmed_by: BTreeSet::new(),
            executed: false,
            executed_by: None,
            executed_at: None,
        }
    }

    /// Stable position in the queue
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn proposer(&self) -> &Address {
        &self.proposer
    }

    pub fn proposed_at(&self) -> DateTime<Utc> {
        self.proposed_at
    }

    pub fn confirmations(&self) -> usize {
        self.confirmed_by.len()
    }

    pub fn is_confirmed_by(&self, owner: &Address) -> bool {
        self.confirmed_by.contains(owner)
    }

    /// Owners that confirmed, in address order
    pub fn confirmed_by(&self) -> impl Iterator<Item = &Address> {
        self.confirmed_by.iter()
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    /// Caller that executed this transaction and received the funds
    pub fn executed_by(&self) -> Option<&Address> {
        self.executed_by.as_ref()
    }

    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.executed_at
    }

    /// Quorum reached for the given threshold
    pub fn has_quorum(&self, threshold: usize) -> bool {
        self.confirmations() >= threshold
    }

    /// Record a confirmation from `owner`. Owner membership is checked by the caller.
    pub(crate) fn confirm(&mut self, owner: Address) -> CustodyResult<usize> {
        if self.executed {
            return Err(CustodyError::AlreadyExecuted(self.index));
        }
        if !self.confirmed_by.insert(owner) {
            return Err(CustodyError::AlreadyConfirmed {
                index: self.index,
                owner,
            });
        }
        Ok(self.confirmations())
    }

    /// Fail unless the transaction is pending and has reached quorum
    pub(crate) fn ensure_executable(&self, threshold: usize) -> CustodyResult<()> {
        if self.executed {
            return Err(CustodyError::AlreadyExecuted(self.index));
        }
        if !self.has_quorum(threshold) {
            return Err(CustodyError::InsufficientConfirmations {
                index: self.index,
                confirmations: self.confirmations(),
                required: threshold,
            });
        }
        Ok(())
    }

    /// Flip to executed. Fails if already executed or below quorum.
    pub(crate) fn mark_executed(
        &mut self,
        threshold: usize,
        by: Address,
        at: DateTime<Utc>,
    ) -> CustodyResult<()> {
        self.ensure_executable(threshold)?;
        self.executed = true;
        self.executed_by = Some(by);
        self.executed_at = Some(at);
        Ok(())
    }

    /// Undo `mark_executed` after the release of funds failed
    pub(crate) fn revert_execution(&mut self) {
        self.executed = false;
        self.executed_by = None;
        self.executed_at = None;
    }
}
