use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::transaction::types::{RecordId, TransactionId, Value};

/// Position of an entry in the log. Equal to its sequence number.
pub type Lsn = u64;

#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Read,
    Write,
    Commit,
    Abort,
}

impl LogKind {
    /// Single-letter tag used in the trace.
    #[must_use]
    pub const fn tag(self) -> char {
        match self {
            Self::Read => 'R',
            Self::Write => 'W',
            Self::Commit => 'C',
            Self::Abort => 'A',
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Commit | Self::Abort)
    }
}

/// One immutable log record.
///
/// `prev_lsn` links to the previous entry of the same transaction and forms
/// its undo chain. Read entries carry the value read in `new_value` and no
/// `old_value`; Commit and Abort entries carry neither value nor record.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogEntry {
    pub kind: LogKind,
    pub lsn: Lsn,
    pub transaction: TransactionId,
    pub record: Option<RecordId>,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub prev_lsn: Option<Lsn>,
}

/// Trace line: `<Kind>:<seq>,T<id>[,<record>][,<old>][,<new>],<prev>`,
/// with `-1` standing for a missing `prev`.
impl Display for LogEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{},{}", self.kind.tag(), self.lsn, self.transaction)?;
        if let Some(record) = self.record {
            write!(f, ",{record}")?;
        }
        for value in [self.old_value, self.new_value].into_iter().flatten() {
            write!(f, ",{value}")?;
        }
        match self.prev_lsn {
            Some(prev) => write!(f, ",{prev}"),
            None => write!(f, ",-1"),
        }
    }
}
