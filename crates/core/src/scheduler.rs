//! Round-robin scheduling of transaction programs.
//!
//! The scheduler visits transactions in a fixed ring in submission order and
//! lets each attempt one operation per turn. A denied operation is not
//! parked anywhere: its transaction simply retries on its next turn. Once a
//! transaction has been denied the same operation
//! [`deadlock_threshold`](SchedulerConfig::deadlock_threshold) times in a
//! row, the wait-for graph is searched for a cycle and, if one is found, its
//! highest-numbered member is aborted.
//!
//! A run ends when every transaction has committed or aborted.

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::SchedulerConfig;
use crate::deadlock::{find_deadlock, Deadlock};
use crate::engine::Engine;
use crate::error::Error;
use crate::store::RecordStore;
use crate::transaction::types::{Program, TransactionId, Value};
use crate::transaction::{Outcome, Step, Transaction};
use crate::wal::{format_trace, LogEntry, Lsn};

/// What happened during one scheduler turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub transaction: TransactionId,
    pub step: Step,
    /// Set when the turn triggered detection and a victim was aborted.
    pub deadlock: Option<Deadlock>,
}

/// Everything a finished run produced.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub initial_store: Vec<Value>,
    pub final_store: Vec<Value>,
    pub log: Vec<LogEntry>,
    /// Terminal state of every transaction, in submission order.
    pub outcomes: Vec<(TransactionId, Outcome)>,
    /// Deadlocks broken during the run, in detection order.
    pub deadlocks: Vec<Deadlock>,
    pub turns: u64,
}

impl RunReport {
    /// The log as trace text, one entry per line.
    #[must_use]
    pub fn trace(&self) -> String {
        format_trace(&self.log)
    }

    #[must_use]
    pub fn outcome(&self, transaction: TransactionId) -> Option<Outcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| *id == transaction)
            .map(|(_, outcome)| *outcome)
    }

    #[must_use]
    pub fn committed(&self) -> usize {
        self.count(Outcome::Committed)
    }

    #[must_use]
    pub fn aborted(&self) -> usize {
        self.count(Outcome::Aborted)
    }

    fn count(&self, wanted: Outcome) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == wanted)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    engine: Engine,
    transactions: Vec<Transaction>,
    config: SchedulerConfig,
    initial_store: Vec<Value>,
    next: usize,
    completed: usize,
    turns: u64,
    deadlocks: Vec<Deadlock>,
}

impl Scheduler {
    /// Sets up a run of `programs` over `store`.
    ///
    /// Transaction ids are assigned in the order of `programs`, starting at
    /// `T1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] if any program touches a record
    /// outside `store`.
    pub fn new(
        store: impl Into<RecordStore>,
        programs: impl IntoIterator<Item = Program>,
        config: SchedulerConfig,
    ) -> Result<Self, Error> {
        let store = store.into();
        let transactions = programs
            .into_iter()
            .enumerate()
            .map(|(index, program)| {
                if let Some(record) = program.max_record() {
                    store.check(record)?;
                }
                Ok(Transaction::new(TransactionId::from_index(index), program))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        tracing::debug!(
            transactions = transactions.len(),
            records = store.len(),
            threshold = config.deadlock_threshold,
            "scheduler ready"
        );

        Ok(Self {
            initial_store: store.values().to_vec(),
            engine: Engine::new(store),
            transactions,
            config,
            next: 0,
            completed: 0,
            turns: 0,
            deadlocks: Vec::new(),
        })
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.completed == self.transactions.len()
    }

    /// Number of transactions that committed or aborted so far.
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.completed
    }

    #[must_use]
    pub const fn turns(&self) -> u64 {
        self.turns
    }

    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    #[must_use]
    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(id.index())
    }

    #[must_use]
    pub fn deadlocks(&self) -> &[Deadlock] {
        &self.deadlocks
    }

    /// Gives the next transaction in the ring its turn.
    ///
    /// Returns `None` once the run is finished.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] if an operation addresses a
    /// record outside the store.
    pub fn step(&mut self) -> Result<Option<Turn>, Error> {
        if self.is_finished() {
            return Ok(None);
        }
        let index = self.next;
        self.next = (self.next + 1) % self.transactions.len();
        self.turns += 1;

        let txn = &mut self.transactions[index];
        let transaction = txn.id();
        let was_completed = txn.is_completed();
        let step = txn.advance(&mut self.engine)?;
        if !was_completed && txn.is_completed() {
            self.completed += 1;
        }

        let deadlock = match step {
            Step::Denied { denials, .. } if denials >= self.config.deadlock_threshold.max(1) => {
                tracing::debug!(%transaction, denials, "denial threshold reached");
                self.detect_deadlocks()?
            }
            _ => None,
        };

        Ok(Some(Turn {
            transaction,
            step,
            deadlock,
        }))
    }

    /// Searches the wait-for graph and aborts the victim of the first cycle.
    ///
    /// # Errors
    ///
    /// Propagates errors from aborting the victim.
    pub fn detect_deadlocks(&mut self) -> Result<Option<Deadlock>, Error> {
        let Some(deadlock) = find_deadlock(self.engine.wait_for()) else {
            return Ok(None);
        };
        self.abort(deadlock.victim)?;
        self.deadlocks.push(deadlock.clone());
        Ok(Some(deadlock))
    }

    /// Aborts `id`, undoing its writes. Does nothing if it already finished.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTransaction`] if `id` was never submitted.
    pub fn abort(&mut self, id: TransactionId) -> Result<Option<Lsn>, Error> {
        let txn = self
            .transactions
            .get_mut(id.index())
            .filter(|txn| txn.id() == id)
            .ok_or(Error::UnknownTransaction(id))?;
        let lsn = txn.abort(&mut self.engine)?;
        if lsn.is_some() {
            self.completed += 1;
        }
        Ok(lsn)
    }

    /// Drives the ring until every transaction has finished.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordOutOfBounds`] if an operation addresses a
    /// record outside the store.
    pub fn run(mut self) -> Result<RunReport, Error> {
        while self.step()?.is_some() {}

        tracing::debug!(
            turns = self.turns,
            deadlocks = self.deadlocks.len(),
            "run finished"
        );

        let outcomes = self
            .transactions
            .iter()
            .filter_map(|txn| txn.outcome().map(|outcome| (txn.id(), outcome)))
            .collect();
        let (store, log) = self.engine.into_parts();
        Ok(RunReport {
            initial_store: self.initial_store,
            final_store: store.into_values(),
            log: log.entries().to_vec(),
            outcomes,
            deadlocks: self.deadlocks,
            turns: self.turns,
        })
    }
}

/// Runs `programs` over `store` with the default configuration.
///
/// # Errors
///
/// See [`Scheduler::new`] and [`Scheduler::run`].
pub fn execute_schedule(
    store: impl Into<RecordStore>,
    programs: impl IntoIterator<Item = Program>,
) -> Result<RunReport, Error> {
    Scheduler::new(store, programs, SchedulerConfig::default())?.run()
}
