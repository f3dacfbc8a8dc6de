// Queue module - withdrawal proposals and their confirmations

mod proposals;
mod transaction;

pub use proposals::TransactionQueue;
pub use transaction::Transaction;
