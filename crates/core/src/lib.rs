//! Deterministic simulation of lock-based concurrency control.
//!
//! `lockstep_core` runs a set of transaction programs against a small
//! in-memory record store. Transactions take turns in a fixed round-robin
//! ring; each turn attempts one operation under two-phase-style locking:
//!
//! - **Read** takes a shared lock on the record and logs the value it saw.
//! - **Write** takes an exclusive lock (upgrading the transaction's own
//!   shared lock in place) and logs the old and new value.
//! - **Commit** logs the commit and releases every lock of the transaction.
//!
//! Locks are held until commit or abort. A refused lock does not block:
//! the transaction retries the same operation on its next turn, and every
//! refusal adds `waiter -> holder` edges to a wait-for graph. After ten
//! consecutive refusals of one operation the graph is searched for a cycle,
//! and the highest-numbered member of the first cycle found is aborted. An
//! abort walks the transaction's chain of log entries backward and restores
//! the old value of each write.
//!
//! # Entry point
//!
//! [`execute_schedule`] runs programs to completion and returns a
//! [`RunReport`] with the final store and the log.
//!
//! ```rust
//! use lockstep_core::execute_schedule;
//! use lockstep_core::transaction::types::{Operation, Program};
//!
//! let t1 = Program::new(vec![Operation::write(1, 5), Operation::Commit])?;
//! let t2 = Program::new(vec![Operation::read(1), Operation::Commit])?;
//!
//! let report = execute_schedule(vec![0_i64, 1, 2], [t1, t2])?;
//! assert_eq!(report.final_store, vec![0, 5, 2]);
//! assert_eq!(report.trace().lines().next(), Some("W:0,T1,1,1,5,-1"));
//! # Ok::<(), lockstep_core::error::Error>(())
//! ```
//!
//! [`Scheduler`] exposes the same run one turn at a time.
//!
//! # Crate features
//!
//! - **`serde`** -- enables `Serialize`/`Deserialize` derives on programs,
//!   log entries, configuration and run reports.
//!
//! This crate is `no_std` compatible (requires `alloc`). The text format
//! for programs is parsed by the separate `lockstep_parser` crate.

#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod config;
pub mod deadlock;
pub mod engine;
pub mod error;
pub mod graph;
pub mod lock;
pub mod scheduler;
pub mod store;
pub mod transaction;
pub mod wal;

pub use config::SchedulerConfig;
pub use scheduler::{execute_schedule, RunReport, Scheduler};
