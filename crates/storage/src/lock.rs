//! Table write locks.
//!
//! At most one read-write transaction may stage changes for a table at a
//! time. Readers never take locks.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use quarry_core::{Error, Result};

use crate::transaction::TransactionId;

/// Lock manager for table write locks.
#[derive(Debug, Default)]
pub struct LockManager {
    /// Table name to the transaction holding its write lock.
    holders: BTreeMap<String, TransactionId>,
}

impl LockManager {
    /// Creates a new lock manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the write lock on `table` for `tx_id`. Re-acquiring a held
    /// lock is a no-op.
    pub fn acquire(&mut self, table: &str, tx_id: TransactionId) -> Result<()> {
        match self.holders.get(table) {
            Some(holder) if *holder == tx_id => Ok(()),
            Some(holder) => {
                tracing::warn!(table, tx = tx_id, holder = *holder, "write lock conflict");
                Err(Error::invalid_operation(format!(
                    "table {} is locked by transaction {}",
                    table, holder
                )))
            }
            None => {
                self.holders.insert(table.to_string(), tx_id);
                Ok(())
            }
        }
    }

    /// Releases all locks held by a transaction.
    pub fn release_all(&mut self, tx_id: TransactionId) {
        self.holders.retain(|_, holder| *holder != tx_id);
    }

    /// Returns the transaction holding the lock on `table`.
    pub fn holder(&self, table: &str) -> Option<TransactionId> {
        self.holders.get(table).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::ErrorKind;

    #[test]
    fn test_acquire_lock() {
        let mut lm = LockManager::new();
        assert!(lm.acquire("table1", 1).is_ok());
        assert_eq!(lm.holder("table1"), Some(1));
        assert!(lm.acquire("table1", 1).is_ok());
    }

    #[test]
    fn test_conflicting_writer_fails() {
        let mut lm = LockManager::new();
        lm.acquire("table1", 1).unwrap();
        let err = lm.acquire("table1", 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert!(lm.acquire("table2", 2).is_ok());
    }

    #[test]
    fn test_release_all() {
        let mut lm = LockManager::new();
        lm.acquire("table1", 1).unwrap();
        lm.acquire("table2", 1).unwrap();
        lm.acquire("table3", 2).unwrap();
        lm.release_all(1);
        assert_eq!(lm.holder("table1"), None);
        assert_eq!(lm.holder("table2"), None);
        assert_eq!(lm.holder("table3"), Some(2));
        assert!(lm.acquire("table1", 2).is_ok());
    }
}
