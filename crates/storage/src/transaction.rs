//! Transaction state for Quarry.
//!
//! A `Transaction` owns a `Journal` and moves through
//! `Active -> Committed | Aborted`. Committing hands the journal back to the
//! caller, which flushes it to persistent storage before installing it into
//! the cache.

use crate::cache::TableCache;
use crate::journal::{Journal, JournalView};
use alloc::format;
use alloc::rc::Rc;
use quarry_core::{Error, Result, Row, RowId};

/// Transaction ID type.
pub type TransactionId = u64;

/// Whether a transaction may write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Reads only; never blocks and never stages changes.
    ReadOnly,
    /// May stage inserts, updates and deletes.
    ReadWrite,
}

/// Transaction state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can perform operations.
    Active,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been aborted.
    Aborted,
}

/// A database transaction.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    tx_type: TransactionType,
    journal: Journal,
    state: TransactionState,
}

impl Transaction {
    /// Starts a transaction with an id handed out by the owning context.
    pub fn begin(id: TransactionId, tx_type: TransactionType) -> Self {
        Self {
            id,
            tx_type,
            journal: Journal::new(),
            state: TransactionState::Active,
        }
    }

    /// Returns the transaction ID.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the transaction type.
    pub fn tx_type(&self) -> TransactionType {
        self.tx_type
    }

    /// Returns the current state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true if the transaction is active.
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    fn check_active(&self) -> Result<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(Error::invalid_operation(format!(
                "transaction {} is already committed",
                self.id
            ))),
            TransactionState::Aborted => Err(Error::invalid_operation(format!(
                "transaction {} is already aborted",
                self.id
            ))),
        }
    }

    fn check_writable(&self) -> Result<()> {
        self.check_active()?;
        if self.tx_type == TransactionType::ReadOnly {
            return Err(Error::invalid_operation(format!(
                "transaction {} is read-only",
                self.id
            )));
        }
        Ok(())
    }

    /// Stages an insert.
    pub fn insert(&mut self, cache: &TableCache, table: &str, row: Row) -> Result<RowId> {
        self.check_writable()?;
        let row_id = row.id();
        self.journal.insert(cache, table, row)?;
        Ok(row_id)
    }

    /// Stages an update.
    pub fn update(&mut self, cache: &TableCache, table: &str, row: Row) -> Result<Rc<Row>> {
        self.check_writable()?;
        self.journal.update(cache, table, row)
    }

    /// Stages a delete.
    pub fn delete(&mut self, cache: &TableCache, table: &str, row_id: RowId) -> Result<Rc<Row>> {
        self.check_writable()?;
        self.journal.delete(cache, table, row_id)
    }

    /// Returns the view readers inside this transaction see.
    pub fn view<'a>(&'a self, cache: &'a TableCache) -> Result<JournalView<'a>> {
        self.check_active()?;
        Ok(JournalView::new(cache, &self.journal))
    }

    /// Returns the staged changes.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Hands the staged changes over for flushing. The transaction stays
    /// active until `commit` or `abort` settles how the flush went.
    pub fn prepare(&mut self) -> Result<Journal> {
        self.check_active()?;
        Ok(core::mem::take(&mut self.journal))
    }

    /// Marks the transaction committed and hands back its journal.
    pub fn commit(&mut self) -> Result<Journal> {
        self.check_active()?;
        self.state = TransactionState::Committed;
        tracing::debug!(tx = self.id, "transaction committed");
        Ok(core::mem::take(&mut self.journal))
    }

    /// Marks the transaction aborted and discards its journal.
    pub fn abort(&mut self) -> Result<()> {
        self.check_active()?;
        self.state = TransactionState::Aborted;
        self.journal = Journal::new();
        tracing::debug!(tx = self.id, "transaction aborted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use quarry_core::schema::{Table, TableBuilder};
    use quarry_core::{DataType, ErrorKind, Value};

    fn test_schema() -> Table {
        TableBuilder::new("test")
            .unwrap()
            .add_column("id", DataType::Int64)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .add_primary_key("id")
            .unwrap()
            .build()
            .unwrap()
    }

    fn row(id: RowId, name: &str) -> Row {
        Row::new(id, vec![Value::Int64(id as i64), Value::String(name.into())])
    }

    fn cache() -> TableCache {
        let mut cache = TableCache::new();
        cache.create_table(test_schema()).unwrap();
        cache
    }

    #[test]
    fn test_transaction_begin() {
        let tx = Transaction::begin(7, TransactionType::ReadWrite);
        assert!(tx.is_active());
        assert_eq!(tx.id(), 7);
        assert_eq!(tx.tx_type(), TransactionType::ReadWrite);
    }

    #[test]
    fn test_transaction_insert_commit() {
        let mut cache = cache();
        let mut tx = Transaction::begin(1, TransactionType::ReadWrite);
        tx.insert(&cache, "test", row(1, "test")).unwrap();
        assert_eq!(cache.get_table("test").unwrap().len(), 0);
        assert_eq!(tx.view(&cache).unwrap().table("test").unwrap().len(), 1);

        let journal = tx.commit().unwrap();
        journal.install(&mut cache);
        assert_eq!(cache.get_table("test").unwrap().len(), 1);
        assert_eq!(tx.state(), TransactionState::Committed);
    }

    #[test]
    fn test_transaction_abort_leaves_cache() {
        let cache = cache();
        let mut tx = Transaction::begin(1, TransactionType::ReadWrite);
        tx.insert(&cache, "test", row(1, "test")).unwrap();
        tx.abort().unwrap();

        assert_eq!(cache.get_table("test").unwrap().len(), 0);
        assert!(tx.journal().is_empty());
    }

    #[test]
    fn test_transaction_update_and_delete() {
        let mut cache = cache();
        cache.get_table_mut("test").unwrap().insert(row(1, "initial")).unwrap();
        cache.get_table_mut("test").unwrap().insert(row(2, "other")).unwrap();

        let mut tx = Transaction::begin(1, TransactionType::ReadWrite);
        tx.update(&cache, "test", row(1, "updated")).unwrap();
        tx.delete(&cache, "test", 2).unwrap();
        tx.commit().unwrap().install(&mut cache);

        let store = cache.get_table("test").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).unwrap().get(1), Some(&Value::String("updated".into())));
    }

    #[test]
    fn test_terminal_states_fail_fast() {
        let cache = cache();
        let mut tx = Transaction::begin(1, TransactionType::ReadWrite);
        tx.abort().unwrap();
        assert_eq!(tx.commit().unwrap_err().kind(), ErrorKind::InvalidOperation);
        assert_eq!(tx.abort().unwrap_err().kind(), ErrorKind::InvalidOperation);
        assert!(tx.insert(&cache, "test", row(1, "x")).is_err());
        assert!(tx.view(&cache).is_err());

        let mut tx = Transaction::begin(2, TransactionType::ReadWrite);
        tx.commit().unwrap();
        assert_eq!(tx.abort().unwrap_err().kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_prepare_keeps_transaction_active() {
        let cache = cache();
        let mut tx = Transaction::begin(1, TransactionType::ReadWrite);
        tx.insert(&cache, "test", row(1, "test")).unwrap();

        let journal = tx.prepare().unwrap();
        assert!(!journal.is_empty());
        assert!(tx.is_active());
        assert!(tx.journal().is_empty());

        // A failed flush settles as an abort.
        tx.abort().unwrap();
        assert_eq!(tx.state(), TransactionState::Aborted);
        assert!(tx.prepare().is_err());
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let cache = cache();
        let mut tx = Transaction::begin(1, TransactionType::ReadOnly);
        let err = tx.insert(&cache, "test", row(1, "x")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert!(tx.commit().is_ok());
    }
}
