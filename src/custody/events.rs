// Custody events - observable side effects of committed operations

use crate::assets::{Amount, AssetId};
use crate::identity::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Events emitted by the vault, one per successful operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustodyEvent {
    /// An external asset was added to the balance sheet
    AssetRegistered { asset: AssetId },
    /// Native value was deposited
    NativeDeposited { amount: Amount },
    /// An external asset was pulled into custody
    AssetDeposited { asset: AssetId, amount: Amount },
    /// A withdrawal was proposed
    TransactionProposed {
        index: usize,
        asset: AssetId,
        amount: Amount,
    },
    /// An owner confirmed a proposal
    TransactionConfirmed { owner: Address, index: usize },
    /// A proposal was executed and its funds released
    TransactionExecuted { index: usize },
}

impl fmt::Display for CustodyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssetRegistered { asset } => write!(f, "AssetRegistered({})", asset),
            Self::NativeDeposited { amount } => write!(f, "NativeDeposited({})", amount),
            Self::AssetDeposited { asset, amount } => {
                write!(f, "AssetDeposited({}, {})", asset, amount)
            }
            Self::TransactionProposed {
                index,
                asset,
                amount,
            } => write!(f, "TransactionProposed({}, {}, {})", index, asset, amount),
            Self::TransactionConfirmed { owner, index } => {
                write!(f, "TransactionConfirmed({}, {})", owner, index)
            }
            Self::TransactionExecuted { index } => write!(f, "TransactionExecuted({})", index),
        }
    }
}
