// Assets module - what the vault can hold
// Asset identifiers and the balance sheet of eligible assets

mod asset;
mod balance_sheet;

pub use asset::{Amount, AssetId, AssetParseError};
pub use balance_sheet::BalanceSheet;
