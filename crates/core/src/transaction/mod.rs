pub mod types;

use alloc::vec::Vec;

use self::types::{Operation, Program, TransactionId};
use crate::engine::{Access, Engine};
use crate::error::Error;
use crate::wal::Lsn;

/// Terminal state of a transaction.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Committed,
    Aborted,
}

/// What one call to [`Transaction::advance`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The transaction had already finished; nothing happened.
    Idle,
    /// The pending operation ran and was logged at `lsn`.
    Progressed { lsn: Lsn },
    /// The pending operation was refused a lock. `denials` counts the
    /// consecutive refusals of this operation so far.
    Denied {
        denials: u32,
        blockers: Vec<TransactionId>,
    },
}

/// A program together with its execution cursor.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: TransactionId,
    program: Program,
    cursor: usize,
    denials: u32,
    outcome: Option<Outcome>,
}

impl Transaction {
    #[must_use]
    pub const fn new(id: TransactionId, program: Program) -> Self {
        Self {
            id,
            program,
            cursor: 0,
            denials: 0,
            outcome: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> TransactionId {
        self.id
    }

    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Index of the next operation to run.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub const fn denials(&self) -> u32 {
        self.denials
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.outcome.is_some()
    }

    /// Operation the transaction will attempt on its next turn.
    #[must_use]
    pub fn pending(&self) -> Option<&Operation> {
        if self.is_completed() {
            return None;
        }
        self.program.operations().get(self.cursor)
    }

    /// Attempts the pending operation against `engine`.
    ///
    /// Success moves the cursor past the operation and clears the denial
    /// counter; a denial leaves the cursor in place so the same operation is
    /// retried on the next turn.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] if the operation addresses a
    /// record outside the store.
    pub fn advance(&mut self, engine: &mut Engine) -> Result<Step, Error> {
        let Some(&operation) = self.pending() else {
            return Ok(Step::Idle);
        };

        let access = match operation {
            Operation::Read { record } => engine.read(self.id, record)?,
            Operation::Write { record, value } => engine.write(self.id, record, value)?,
            Operation::Commit => {
                let lsn = engine.commit(self.id);
                self.outcome = Some(Outcome::Committed);
                Access::Done { lsn }
            }
        };

        match access {
            Access::Done { lsn } => {
                self.cursor += 1;
                self.denials = 0;
                Ok(Step::Progressed { lsn })
            }
            Access::Denied { blockers } => {
                self.denials += 1;
                Ok(Step::Denied {
                    denials: self.denials,
                    blockers,
                })
            }
        }
    }

    /// Aborts through `engine` unless the transaction already finished.
    ///
    /// Returns the abort's log position, or `None` if nothing was done.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Engine::abort`].
    pub fn abort(&mut self, engine: &mut Engine) -> Result<Option<Lsn>, Error> {
        if self.is_completed() {
            return Ok(None);
        }
        let lsn = engine.abort(self.id)?;
        self.outcome = Some(Outcome::Aborted);
        self.denials = 0;
        Ok(Some(lsn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordStore;

    fn program(ops: Vec<Operation>) -> Program {
        Program::new(ops).unwrap()
    }

    #[test]
    fn test_advance_runs_program_in_order() {
        let mut engine = Engine::new(RecordStore::identity(3));
        let mut txn = Transaction::new(
            TransactionId(1),
            program(vec![Operation::write(1, 7), Operation::read(1), Operation::Commit]),
        );

        assert_eq!(txn.advance(&mut engine), Ok(Step::Progressed { lsn: 0 }));
        assert_eq!(txn.pending(), Some(&Operation::read(1)));
        assert_eq!(txn.advance(&mut engine), Ok(Step::Progressed { lsn: 1 }));
        assert_eq!(txn.advance(&mut engine), Ok(Step::Progressed { lsn: 2 }));
        assert_eq!(txn.outcome(), Some(Outcome::Committed));
        assert_eq!(txn.pending(), None);
        assert_eq!(txn.advance(&mut engine), Ok(Step::Idle));
        assert_eq!(engine.log().len(), 3);
    }

    #[test]
    fn test_denial_counter_resets_on_success() {
        let mut engine = Engine::new(RecordStore::identity(2));
        let mut holder = Transaction::new(
            TransactionId(1),
            program(vec![Operation::write(0, 1), Operation::Commit]),
        );
        let mut waiter = Transaction::new(
            TransactionId(2),
            program(vec![Operation::read(0), Operation::Commit]),
        );

        holder.advance(&mut engine).unwrap();
        for expected in 1..=3 {
            assert_eq!(
                waiter.advance(&mut engine),
                Ok(Step::Denied {
                    denials: expected,
                    blockers: vec![TransactionId(1)],
                })
            );
        }
        assert_eq!(waiter.cursor(), 0);

        holder.advance(&mut engine).unwrap();
        assert!(matches!(waiter.advance(&mut engine), Ok(Step::Progressed { .. })));
        assert_eq!(waiter.denials(), 0);
        assert_eq!(waiter.cursor(), 1);
    }

    #[test]
    fn test_abort_is_terminal_and_once() {
        let mut engine = Engine::new(RecordStore::identity(2));
        let mut txn = Transaction::new(
            TransactionId(1),
            program(vec![Operation::write(0, 9), Operation::Commit]),
        );
        txn.advance(&mut engine).unwrap();

        assert_eq!(txn.abort(&mut engine), Ok(Some(1)));
        assert_eq!(txn.outcome(), Some(Outcome::Aborted));
        assert_eq!(txn.abort(&mut engine), Ok(None));
        assert_eq!(txn.advance(&mut engine), Ok(Step::Idle));
        assert_eq!(engine.store().values(), &[0, 1]);
    }
}
