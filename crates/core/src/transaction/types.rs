use alloc::vec::Vec;
use core::fmt::{Display, Formatter, Result as FmtResult};

use derive_more::From;

use crate::error::Error;

/// Index of a record in the [`RecordStore`](crate::store::RecordStore).
pub type RecordId = usize;

/// Value held by a record.
pub type Value = i64;

/// Identifies a transaction within one scheduling run.
///
/// Ids are assigned in submission order starting at `1`. Ordering is
/// numeric, which the deadlock detector relies on for its search order and
/// its victim choice.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Id of the transaction submitted at 0-based position `index`.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u64 + 1)
    }

    /// 0-based submission position of this transaction.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn index(self) -> usize {
        self.0.saturating_sub(1) as usize
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "T{}", self.0)
    }
}

/// A single step of a transaction program.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read { record: RecordId },
    Write { record: RecordId, value: Value },
    Commit,
}

impl Operation {
    pub const fn read(record: RecordId) -> Self {
        Self::Read { record }
    }

    pub const fn write(record: RecordId, value: Value) -> Self {
        Self::Write { record, value }
    }

    /// Record touched by this operation, `None` for [`Operation::Commit`].
    #[must_use]
    pub const fn record(&self) -> Option<RecordId> {
        match self {
            Self::Read { record } | Self::Write { record, .. } => Some(*record),
            Self::Commit => None,
        }
    }
}

/// Renders the textual token form: `R(1)`, `W(1,5)`, `C`.
impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Read { record } => write!(f, "R({record})"),
            Self::Write { record, value } => write!(f, "W({record},{value})"),
            Self::Commit => write!(f, "C"),
        }
    }
}

/// A validated transaction program.
///
/// A program is a non-empty sequence of operations whose last and only
/// [`Operation::Commit`] terminates it. Construct through
/// [`Program::new`] (or `TryFrom<Vec<Operation>>`), which rejects anything
/// else.
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(try_from = "Vec<Operation>", into = "Vec<Operation>")
)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Program {
    operations: Vec<Operation>,
}

impl Program {
    /// Validates `operations` as a program.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCommit`] if the last operation is not a
    /// commit (including the empty program) and
    /// [`Error::OperationAfterCommit`] if a commit appears before the end.
    pub fn new(operations: Vec<Operation>) -> Result<Self, Error> {
        if operations.last() != Some(&Operation::Commit) {
            return Err(Error::MissingCommit {
                operations: operations.len(),
            });
        }
        if let Some(position) = operations
            .iter()
            .position(|op| *op == Operation::Commit)
            .filter(|&pos| pos + 1 != operations.len())
        {
            return Err(Error::OperationAfterCommit { position });
        }
        Ok(Self { operations })
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Always `false` for a validated program; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Largest record id the program touches.
    #[must_use]
    pub fn max_record(&self) -> Option<RecordId> {
        self.operations.iter().filter_map(Operation::record).max()
    }
}

impl TryFrom<Vec<Operation>> for Program {
    type Error = Error;

    fn try_from(operations: Vec<Operation>) -> Result<Self, Self::Error> {
        Self::new(operations)
    }
}

impl From<Program> for Vec<Operation> {
    fn from(program: Program) -> Self {
        program.operations
    }
}

/// Renders the `;`-separated text form accepted by the parser.
impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (i, op) in self.operations.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, "{op}")?;
        }
        Ok(())
    }
}
