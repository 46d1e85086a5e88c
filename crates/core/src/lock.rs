//! Record-level shared/exclusive locking.
//!
//! The lock manager only decides; it never waits. A request is either
//! granted on the spot or denied together with the transactions that stand
//! in its way, and the caller retries on a later turn.

use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::error::Error;
use crate::transaction::types::{RecordId, TransactionId};

/// Lock modes for read/write access.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Shared lock for reads (multiple readers allowed).
    Shared,
    /// Exclusive lock for writes (single writer, no readers).
    Exclusive,
}

/// Result of a lock request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
    Granted,
    /// The request conflicts with the listed holders, in ascending id order.
    Denied { blockers: Vec<TransactionId> },
}

impl LockOutcome {
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Lock state of one record.
///
/// At most one of `exclusive` and `shared` is non-empty at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockEntry {
    pub exclusive: Option<TransactionId>,
    pub shared: HashSet<TransactionId>,
}

impl LockEntry {
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.exclusive.is_none() && self.shared.is_empty()
    }

    /// Shared holders other than `requester`, sorted.
    fn other_sharers(&self, requester: TransactionId) -> Vec<TransactionId> {
        let mut others: Vec<TransactionId> = self
            .shared
            .iter()
            .copied()
            .filter(|&holder| holder != requester)
            .collect();
        others.sort_unstable();
        others
    }
}

/// One [`LockEntry`] per record of the store.
#[derive(Debug, Clone, Default)]
pub struct LockManager {
    table: Vec<LockEntry>,
}

impl LockManager {
    /// A lock table for a store of `records` records, all unlocked.
    #[must_use]
    pub fn new(records: usize) -> Self {
        Self {
            table: (0..records).map(|_| LockEntry::default()).collect(),
        }
    }

    /// Decides a lock request.
    ///
    /// Holding the exclusive lock already covers any request on that
    /// record. A shared request conflicts only with another transaction's
    /// exclusive lock. An exclusive request conflicts with any other holder;
    /// when the requester is the sole shared holder the lock is upgraded in
    /// place and the requester leaves the shared set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] if `record` has no lock entry.
    pub fn request(
        &mut self,
        requester: TransactionId,
        mode: LockMode,
        record: RecordId,
    ) -> Result<LockOutcome, Error> {
        let len = self.table.len();
        let entry = self
            .table
            .get_mut(record)
            .ok_or(Error::RecordOutOfBounds { record, len })?;

        let outcome = match entry.exclusive {
            Some(holder) if holder == requester => LockOutcome::Granted,
            Some(holder) => LockOutcome::Denied {
                blockers: alloc::vec![holder],
            },
            None => match mode {
                LockMode::Shared => {
                    entry.shared.insert(requester);
                    LockOutcome::Granted
                }
                LockMode::Exclusive => {
                    let others = entry.other_sharers(requester);
                    if others.is_empty() {
                        entry.shared.remove(&requester);
                        entry.exclusive = Some(requester);
                        LockOutcome::Granted
                    } else {
                        LockOutcome::Denied { blockers: others }
                    }
                }
            },
        };

        tracing::trace!(%requester, ?mode, record, ?outcome, "lock request");
        Ok(outcome)
    }

    /// Drops every lock `holder` owns. Idempotent.
    pub fn release(&mut self, holder: TransactionId) {
        for entry in &mut self.table {
            if entry.exclusive == Some(holder) {
                entry.exclusive = None;
            }
            entry.shared.remove(&holder);
        }
        tracing::trace!(%holder, "released all locks");
    }

    #[must_use]
    pub fn entry(&self, record: RecordId) -> Option<&LockEntry> {
        self.table.get(record)
    }

    pub fn entries(&self) -> impl Iterator<Item = (RecordId, &LockEntry)> {
        self.table.iter().enumerate()
    }

    /// Records on which `holder` has any lock.
    pub fn held_by(&self, holder: TransactionId) -> impl Iterator<Item = RecordId> + '_ {
        self.entries()
            .filter(move |(_, entry)| {
                entry.exclusive == Some(holder) || entry.shared.contains(&holder)
            })
            .map(|(record, _)| record)
    }
}
