#![allow(dead_code, unused_macros)]

/// DSL macros for building test programs.
///
/// # Syntax
///
/// ```ignore
/// programs! {
///     [w(1, 5), r(2), w(2, 3), r(1), c],   // T1
///     [r(1), w(1, 2), c],                  // T2
/// }
/// ```
///
/// - `r(rec)`      → `Operation::read(rec)`
/// - `w(rec, val)` → `Operation::write(rec, val)`
/// - `c`           → `Operation::Commit`
///
/// Build a single Operation.
#[macro_export]
macro_rules! op {
    (r($rec:expr)) => {
        lockstep_core::transaction::types::Operation::read($rec)
    };
    (w($rec:expr, $val:expr)) => {
        lockstep_core::transaction::types::Operation::write($rec, $val)
    };
    (c) => {
        lockstep_core::transaction::types::Operation::Commit
    };
}

/// Build one validated Program.
#[macro_export]
macro_rules! program {
    ($($name:ident $(($($args:tt)*))?),* $(,)?) => {
        lockstep_core::transaction::types::Program::new(
            vec![$($crate::op!($name $(($($args)*))?)),*]
        )
        .expect("test program must be well-formed")
    };
}

/// Build the programs of a run: one `[ ... ]` block per transaction.
#[macro_export]
macro_rules! programs {
    ($( [ $($ops:tt)* ] ),* $(,)?) => {
        vec![
            $($crate::program!($($ops)*)),*
        ]
    };
}

use lockstep_core::scheduler::Scheduler;

/// Checks that no record is locked exclusively and shared at once.
pub fn assert_lock_exclusivity(scheduler: &Scheduler) {
    for (record, entry) in scheduler.engine().locks().entries() {
        assert!(
            entry.exclusive.is_none() || entry.shared.is_empty(),
            "record {record} is locked exclusively by {:?} and shared by {:?}",
            entry.exclusive,
            entry.shared,
        );
    }
}

/// Store used by the reference scenarios: record `i` holds `i`.
pub fn new_db() -> Vec<i64> {
    (0..10).collect()
}
