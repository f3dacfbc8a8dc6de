// CustodyStore - Persistent key-value storage using sled
//
// Provides typed access for storing:
// - Custody state (owners, balance sheet, transaction queue)
// - The reference ledger's balances and allowances

use crate::custody::CustodyState;
use crate::ledger::LedgerBook;
use std::path::Path;
use thiserror::Error;

/// Key prefixes for organizing data
mod keys {
    pub const CUSTODY_STATE: &[u8] = b"custody:state";
    pub const LEDGER_BOOK: &[u8] = b"ledger:book";
}

/// Errors from storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    /// Number of keys in the database
    pub key_count: usize,
    /// Approximate disk size in bytes
    pub disk_size_bytes: u64,
}

/// Persistent store for a vault and its reference ledger.
///
/// Uses sled for crash-safe, embedded storage.
/// All writes are atomic and durable after flush.
pub struct CustodyStore {
    db: sled::Db,
}

impl CustodyStore {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.db.is_empty())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            key_count: self.db.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        })
    }

    fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    // ========================================================================
    // CUSTODY STATE PERSISTENCE
    // ========================================================================

    /// Save the custody state
    pub fn save_state(&self, state: &CustodyState) -> Result<(), StoreError> {
        let bytes = state
            .to_bytes()
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        self.put_raw(keys::CUSTODY_STATE, &bytes)
    }

    /// Load the custody state
    pub fn load_state(&self) -> Result<Option<CustodyState>, StoreError> {
        match self.get_raw(keys::CUSTODY_STATE)? {
            Some(bytes) => {
                let state = CustodyState::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // LEDGER PERSISTENCE
    // ========================================================================

    /// Save the reference ledger's book
    pub fn save_ledger(&self, book: &LedgerBook) -> Result<(), StoreError> {
        let bytes = postcard::to_allocvec(book)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        self.put_raw(keys::LEDGER_BOOK, &bytes)
    }

    /// Load the reference ledger's book
    pub fn load_ledger(&self) -> Result<Option<LedgerBook>, StoreError> {
        match self.get_raw(keys::LEDGER_BOOK)? {
            Some(bytes) => {
                let book = postcard::from_bytes(&bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(book))
            }
            None => Ok(None),
        }
    }
}
