//! Shared state of one scheduling run.

use alloc::vec::Vec;

use crate::error::Error;
use crate::graph::WaitForGraph;
use crate::lock::{LockManager, LockMode, LockOutcome};
use crate::store::RecordStore;
use crate::transaction::types::{RecordId, TransactionId, Value};
use crate::wal::{LogKind, Lsn, WriteAheadLog};

/// Result of a data operation attempted by a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// The operation ran and was logged at `lsn`.
    Done { lsn: Lsn },
    /// The lock was refused; the operation had no effect.
    Denied { blockers: Vec<TransactionId> },
}

/// Record store, lock table, log and wait-for graph of a single run.
///
/// Every run owns its own engine, so independent runs share nothing.
#[derive(Debug, Clone)]
pub struct Engine {
    store: RecordStore,
    locks: LockManager,
    log: WriteAheadLog,
    wait_for: WaitForGraph,
}

impl Engine {
    #[must_use]
    pub fn new(store: RecordStore) -> Self {
        Self {
            locks: LockManager::new(store.len()),
            store,
            log: WriteAheadLog::new(),
            wait_for: WaitForGraph::default(),
        }
    }

    /// Requests a lock and records wait-for edges on denial.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] for a record outside the store.
    pub fn request_lock(
        &mut self,
        transaction: TransactionId,
        mode: LockMode,
        record: RecordId,
    ) -> Result<LockOutcome, Error> {
        let outcome = self.locks.request(transaction, mode, record)?;
        if let LockOutcome::Denied { blockers } = &outcome {
            self.wait_for.add_edges(&transaction, blockers);
        }
        Ok(outcome)
    }

    /// Reads `record` under a shared lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] for a record outside the store.
    pub fn read(&mut self, transaction: TransactionId, record: RecordId) -> Result<Access, Error> {
        match self.request_lock(transaction, LockMode::Shared, record)? {
            LockOutcome::Granted => {
                let value = self.store.get(record)?;
                let lsn = self.log.log_read(transaction, record, value);
                Ok(Access::Done { lsn })
            }
            LockOutcome::Denied { blockers } => Ok(Access::Denied { blockers }),
        }
    }

    /// Installs `value` into `record` under an exclusive lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] for a record outside the store.
    pub fn write(
        &mut self,
        transaction: TransactionId,
        record: RecordId,
        value: Value,
    ) -> Result<Access, Error> {
        match self.request_lock(transaction, LockMode::Exclusive, record)? {
            LockOutcome::Granted => {
                let old_value = self.store.set(record, value)?;
                let lsn = self.log.log_write(transaction, record, old_value, value);
                Ok(Access::Done { lsn })
            }
            LockOutcome::Denied { blockers } => Ok(Access::Denied { blockers }),
        }
    }

    /// Logs the commit and releases every lock of `transaction`.
    pub fn commit(&mut self, transaction: TransactionId) -> Lsn {
        let lsn = self.log.log_commit(transaction);
        self.finish(transaction);
        lsn
    }

    /// Undoes the writes of `transaction`, logs the abort and releases its
    /// locks.
    ///
    /// The undo chain is walked newest-first, so a record written several
    /// times ends up with the value it had before the first write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] if a logged write addresses a
    /// record outside the store.
    pub fn abort(&mut self, transaction: TransactionId) -> Result<Lsn, Error> {
        let undo: Vec<(RecordId, Value)> = self
            .log
            .undo_chain(transaction)
            .filter(|entry| entry.kind == LogKind::Write)
            .filter_map(|entry| entry.record.zip(entry.old_value))
            .collect();
        for (record, old_value) in undo {
            self.store.set(record, old_value)?;
        }
        let lsn = self.log.log_abort(transaction);
        self.finish(transaction);
        tracing::debug!(%transaction, lsn, "aborted");
        Ok(lsn)
    }

    /// Bookkeeping shared by commit and abort.
    ///
    /// A finished transaction waits on nothing, so its outgoing wait-for
    /// edges go too; a cycle can then never run through it.
    fn finish(&mut self, transaction: TransactionId) {
        self.locks.release(transaction);
        self.wait_for.clear_outgoing(&transaction);
    }

    #[must_use]
    pub const fn store(&self) -> &RecordStore {
        &self.store
    }

    #[must_use]
    pub const fn locks(&self) -> &LockManager {
        &self.locks
    }

    #[must_use]
    pub const fn log(&self) -> &WriteAheadLog {
        &self.log
    }

    #[must_use]
    pub const fn wait_for(&self) -> &WaitForGraph {
        &self.wait_for
    }

    pub(crate) fn into_parts(self) -> (RecordStore, WriteAheadLog) {
        (self.store, self.log)
    }
}
