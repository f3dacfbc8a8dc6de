// quorum-vault: M-of-N custody of native and external assets
//
// Owners register eligible assets, depositors fund the vault, any owner
// proposes a withdrawal, owners confirm it, and once confirmations reach the
// threshold anyone allowed by the execution policy may execute it, receiving
// the released funds.

pub mod assets;
pub mod custody;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod queue;
pub mod registry;
pub mod storage;

pub use assets::{Amount, AssetId};
pub use custody::{CustodyConfig, CustodyEvent, ExecutionPolicy, Vault};
pub use error::{CustodyError, CustodyResult};
pub use identity::Address;
