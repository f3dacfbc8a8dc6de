// Balance sheet - registered external assets and the native balance counter

use crate::assets::{Amount, AssetId};
use crate::error::{CustodyError, CustodyResult};
use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// The set of assets eligible for deposit and withdrawal.
///
/// External assets must be registered before they can be deposited. The
/// native asset is always eligible and never stored in the set. The native
/// balance is the only balance kept here; external holdings are read from the
/// asset ledger on demand.
///
/// Native value debited for a release that has not settled yet stays
/// reserved, and `native_balance + in-flight` never exceeds `Amount::MAX`, so
/// a rolled-back release always fits back into the counter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BalanceSheet {
    registered: BTreeSet<Address>,
    native_balance: Amount,
    /// Debited by releases still waiting on the ledger
    #[serde(default)]
    native_in_flight: Amount,
}

impl BalanceSheet {
    /// Create an empty balance sheet with zero native balance
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an external asset to the sheet
    pub fn register(&mut self, asset: AssetId) -> CustodyResult<()> {
        let token = match asset {
            AssetId::Native => return Err(CustodyError::AssetAlreadyRegistered(asset)),
            AssetId::External(token) => token,
        };

        if !self.registered.insert(token) {
            return Err(CustodyError::AssetAlreadyRegistered(asset));
        }
        Ok(())
    }

    /// Native is always registered
    pub fn is_registered(&self, asset: &AssetId) -> bool {
        match asset {
            AssetId::Native => true,
            AssetId::External(token) => self.registered.contains(token),
        }
    }

    /// Fail with `AssetNotRegistered` unless the asset is eligible
    pub fn ensure_registered(&self, asset: &AssetId) -> CustodyResult<()> {
        if self.is_registered(asset) {
            Ok(())
        } else {
            Err(CustodyError::AssetNotRegistered(*asset))
        }
    }

    /// Registered external assets in address order
    pub fn registered_assets(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.registered.iter().copied().map(AssetId::External)
    }

    /// Number of registered external assets
    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    pub fn native_balance(&self) -> Amount {
        self.native_balance
    }

    /// Native value debited by releases that have not settled
    pub fn native_in_flight(&self) -> Amount {
        self.native_in_flight
    }

    /// Increase the native counter, returning the new balance
    pub(crate) fn credit_native(&mut self, amount: Amount) -> CustodyResult<Amount> {
        let overflow = || {
            CustodyError::InvalidAmount(format!(
                "native balance {} (+{} in flight) + {} would overflow",
                self.native_balance, self.native_in_flight, amount
            ))
        };
        self.native_balance
            .checked_add(self.native_in_flight)
            .and_then(|total| total.checked_add(amount))
            .ok_or_else(overflow)?;
        self.native_balance += amount;
        Ok(self.native_balance)
    }

    /// Decrease the native counter and hold the amount until the release
    /// settles or is restored. Returns the new balance.
    pub(crate) fn debit_native(&mut self, amount: Amount) -> CustodyResult<Amount> {
        if amount > self.native_balance {
            return Err(CustodyError::InsufficientNativeBalance {
                available: self.native_balance,
                required: amount,
            });
        }
        self.native_balance -= amount;
        self.native_in_flight += amount;
        Ok(self.native_balance)
    }

    /// Drop the hold on a debit whose release was delivered
    pub(crate) fn settle_native(&mut self, amount: Amount) {
        self.native_in_flight = self.native_in_flight.saturating_sub(amount);
    }

    /// Give back a debit whose release failed
    pub(crate) fn restore_native(&mut self, amount: Amount) {
        self.native_in_flight = self.native_in_flight.saturating_sub(amount);
        match self.native_balance.checked_add(amount) {
            Some(balance) => self.native_balance = balance,
            None => warn!(
                balance = self.native_balance,
                amount, "native restore would overflow, counter left unchanged"
            ),
        }
    }
}
