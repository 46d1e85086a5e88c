use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::transaction::types::{RecordId, TransactionId};

/// Error raised when a run is set up or driven with input that violates
/// its contract.
///
/// Lock conflicts and deadlocks are never reported through this type: a
/// denied lock is retried and a deadlock is repaired by aborting a victim.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A record id does not address a record of the store.
    RecordOutOfBounds { record: RecordId, len: usize },
    /// A program does not end with a commit. `operations` is its length.
    MissingCommit { operations: usize },
    /// A commit appears before the last position of a program.
    OperationAfterCommit { position: usize },
    /// A transaction id that was never submitted to this run.
    UnknownTransaction(TransactionId),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::RecordOutOfBounds { record, len } => {
                write!(f, "record {record} is out of bounds for a store of {len} records")
            }
            Self::MissingCommit { operations } => {
                write!(f, "program of {operations} operations does not end with a commit")
            }
            Self::OperationAfterCommit { position } => {
                write!(f, "commit at position {position} is followed by more operations")
            }
            Self::UnknownTransaction(id) => write!(f, "unknown transaction {id}"),
        }
    }
}

impl core::error::Error for Error {}
