// Custody module - THE AUTHORIZATION ENGINE
// Proposal, confirmation and threshold-gated release of held assets

mod config;
mod events;
mod state;
mod vault;

pub use config::{CustodyConfig, ExecutionPolicy, DEFAULT_CUSTODY_LABEL};
pub use events::CustodyEvent;
pub use state::{CustodyState, CustodyStats, Release};
pub use vault::Vault;
