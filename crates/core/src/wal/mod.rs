//! Append-only write-ahead log.
//!
//! A single log is shared by every transaction of a run. Entries are
//! numbered by a global sequence that doubles as their position, and each
//! transaction's entries are chained backward through `prev_lsn` so an abort
//! can walk its own writes newest-first without scanning the whole log.
//!
//! Entries are never removed: undoing a transaction that wrote the same
//! record several times needs every one of its write entries.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

pub use self::display::format_trace;
pub use self::entry::{LogEntry, LogKind, Lsn};
use crate::error::Error;
use crate::transaction::types::{RecordId, TransactionId, Value};

pub mod display;
pub mod entry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteAheadLog {
    entries: Vec<LogEntry>,
    /// Newest entry of each transaction, the head of its undo chain.
    tails: BTreeMap<TransactionId, Lsn>,
}

impl WriteAheadLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn append(
        &mut self,
        kind: LogKind,
        transaction: TransactionId,
        record: Option<RecordId>,
        old_value: Option<Value>,
        new_value: Option<Value>,
    ) -> Lsn {
        let lsn = self.entries.len() as Lsn;
        let prev_lsn = self.tails.insert(transaction, lsn);
        self.entries.push(LogEntry {
            kind,
            lsn,
            transaction,
            record,
            old_value,
            new_value,
            prev_lsn,
        });
        lsn
    }

    /// Logs a read of `value` from `record`.
    pub fn log_read(&mut self, transaction: TransactionId, record: RecordId, value: Value) -> Lsn {
        self.append(LogKind::Read, transaction, Some(record), None, Some(value))
    }

    /// Logs that `record` went from `old_value` to `new_value`.
    pub fn log_write(
        &mut self,
        transaction: TransactionId,
        record: RecordId,
        old_value: Value,
        new_value: Value,
    ) -> Lsn {
        self.append(
            LogKind::Write,
            transaction,
            Some(record),
            Some(old_value),
            Some(new_value),
        )
    }

    pub fn log_commit(&mut self, transaction: TransactionId) -> Lsn {
        self.append(LogKind::Commit, transaction, None, None, None)
    }

    pub fn log_abort(&mut self, transaction: TransactionId) -> Lsn {
        self.append(LogKind::Abort, transaction, None, None, None)
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn get(&self, lsn: Lsn) -> Option<&LogEntry> {
        self.entries.get(lsn as usize)
    }

    /// Latest entry written by `transaction`.
    #[must_use]
    pub fn last_lsn(&self, transaction: TransactionId) -> Option<Lsn> {
        self.tails.get(&transaction).copied()
    }

    /// Walks the entries of `transaction` from newest to oldest.
    pub fn undo_chain(&self, transaction: TransactionId) -> UndoChain<'_> {
        UndoChain {
            log: self,
            next: self.last_lsn(transaction),
        }
    }

    /// Applies every write entry, in sequence order, to a copy of `initial`.
    ///
    /// Writes of aborted transactions are included, so the result shows the
    /// store as it would be without any undo.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] if a write addresses a record
    /// outside `initial`.
    pub fn replay(&self, initial: &[Value]) -> Result<Vec<Value>, Error> {
        self.replay_filtered(initial, |_| true)
    }

    /// Like [`replay`](Self::replay), but only for transactions whose chain
    /// ends in a commit.
    ///
    /// Because locks are held until commit or abort, this reproduces the
    /// final store of the run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] if a write addresses a record
    /// outside `initial`.
    pub fn committed_replay(&self, initial: &[Value]) -> Result<Vec<Value>, Error> {
        self.replay_filtered(initial, |txn| {
            self.last_lsn(txn)
                .and_then(|lsn| self.get(lsn))
                .is_some_and(|entry| entry.kind == LogKind::Commit)
        })
    }

    fn replay_filtered(
        &self,
        initial: &[Value],
        include: impl Fn(TransactionId) -> bool,
    ) -> Result<Vec<Value>, Error> {
        let mut store = initial.to_vec();
        for entry in &self.entries {
            if entry.kind != LogKind::Write || !include(entry.transaction) {
                continue;
            }
            if let (Some(record), Some(value)) = (entry.record, entry.new_value) {
                let len = store.len();
                let slot = store
                    .get_mut(record)
                    .ok_or(Error::RecordOutOfBounds { record, len })?;
                *slot = value;
            }
        }
        Ok(store)
    }
}

/// Iterator over one transaction's undo chain, newest entry first.
#[derive(Debug, Clone)]
pub struct UndoChain<'a> {
    log: &'a WriteAheadLog,
    next: Option<Lsn>,
}

impl<'a> Iterator for UndoChain<'a> {
    type Item = &'a LogEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.log.get(self.next?)?;
        self.next = entry.prev_lsn;
        Some(entry)
    }
}
