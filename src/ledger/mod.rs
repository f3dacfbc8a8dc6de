// Ledger module - THE EXTERNAL ASSET LEDGER
// The collaborator that actually moves external assets and native value

mod memory;
mod traits;

pub use memory::{LedgerBook, MemoryLedger};
pub use traits::{AssetLedger, LedgerError};
