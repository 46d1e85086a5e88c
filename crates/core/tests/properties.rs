mod common;

use common::{assert_lock_exclusivity, new_db};
use lockstep_core::config::SchedulerConfig;
use lockstep_core::scheduler::Scheduler;
use lockstep_core::transaction::types::{Program, TransactionId};
use lockstep_core::transaction::{Outcome, Step};
use lockstep_core::wal::LogKind;

const T1: TransactionId = TransactionId(1);
const T2: TransactionId = TransactionId(2);

fn scheduler(programs: Vec<Program>) -> Scheduler {
    Scheduler::new(new_db(), programs, SchedulerConfig::default()).unwrap()
}

fn workloads() -> Vec<Vec<Program>> {
    vec![
        programs! {
            [w(1, 5), r(2), w(2, 3), r(1), c],
            [r(1), w(1, 2), c],
        },
        programs! {
            [w(4, 1), r(1), w(1, 2), c],
            [w(5, 2), r(1), r(2), w(2, 3), c],
            [w(6, 3), r(2), w(2, 4), c],
        },
        programs! {
            [r(1), w(2, 1), c],
            [r(2), r(3), w(1, 2), c],
            [r(1), w(3, 3), c],
        },
        programs! {
            [r(1), w(2, 1), c],
            [r(2), w(3, 2), c],
            [r(3), w(4, 3), c],
            [r(4), w(1, 4), c],
        },
        programs! {
            [w(0, 1), w(0, 2), r(9), w(9, 0), c],
            [r(0), r(9), c],
            [w(9, 4), w(0, 3), c],
            [c],
        },
    ]
}

#[test]
fn lock_exclusivity_holds_every_turn() {
    for programs in workloads() {
        let mut scheduler = scheduler(programs);
        assert_lock_exclusivity(&scheduler);
        while scheduler.step().unwrap().is_some() {
            assert_lock_exclusivity(&scheduler);
        }
    }
}

#[test]
fn log_sequence_is_strictly_increasing() {
    for programs in workloads() {
        let report = scheduler(programs).run().unwrap();
        assert!(report.log.windows(2).all(|w| w[0].lsn < w[1].lsn));
        assert!(report
            .log
            .iter()
            .all(|e| e.prev_lsn.is_none_or(|prev| prev < e.lsn)));
    }
}

#[test]
fn committed_replay_reproduces_final_store() {
    for programs in workloads() {
        let mut scheduler = scheduler(programs);
        while scheduler.step().unwrap().is_some() {}
        let log = scheduler.engine().log();
        let store = scheduler.engine().store().values().to_vec();
        assert_eq!(log.committed_replay(&new_db()).unwrap(), store);
    }
}

#[test]
fn replay_without_aborts_matches_final_store() {
    let report = scheduler(workloads().swap_remove(0)).run().unwrap();
    assert_eq!(report.aborted(), 0);
    let mut store = report.initial_store.clone();
    for entry in report.log.iter().filter(|e| e.kind == LogKind::Write) {
        store[entry.record.unwrap()] = entry.new_value.unwrap();
    }
    assert_eq!(store, report.final_store);
}

#[test]
fn every_transaction_terminates_exactly_once() {
    for programs in workloads() {
        let total = programs.len();
        let report = scheduler(programs).run().unwrap();
        assert_eq!(report.outcomes.len(), total);

        for (id, outcome) in &report.outcomes {
            let terminals: Vec<LogKind> = report
                .log
                .iter()
                .filter(|e| e.transaction == *id && e.kind.is_terminal())
                .map(|e| e.kind)
                .collect();
            let expected = match outcome {
                Outcome::Committed => LogKind::Commit,
                Outcome::Aborted => LogKind::Abort,
            };
            assert_eq!(terminals, vec![expected], "{id}");
            // nothing after the terminal entry
            let last = report.log.iter().rfind(|e| e.transaction == *id).unwrap();
            assert_eq!(last.kind, expected);
        }
    }
}

#[test]
fn abort_restores_value_before_first_write() {
    let mut scheduler = scheduler(programs! {
        [w(1, 1), w(2, 1), c],
        [w(2, 7), w(2, 8), w(2, 9), w(1, 2), c],
    });

    loop {
        let turn = scheduler.step().unwrap().expect("deadlock expected before the end");
        if let Some(deadlock) = turn.deadlock {
            assert_eq!(deadlock.victim, T2);
            break;
        }
    }

    assert_eq!(scheduler.engine().store().values()[2], 2);
    assert_eq!(scheduler.transaction(T2).unwrap().outcome(), Some(Outcome::Aborted));
    let undone = scheduler
        .engine()
        .log()
        .undo_chain(T2)
        .filter(|e| e.kind == LogKind::Write)
        .count();
    assert_eq!(undone, 3);
}

#[test]
fn victim_abort_lets_a_waiter_progress() {
    let mut scheduler = scheduler(programs! {
        [w(1, 1), w(2, 1), c],
        [w(2, 2), w(1, 2), c],
    });

    let mut detected = false;
    let mut progressed_after = false;
    while let Some(turn) = scheduler.step().unwrap() {
        if turn.deadlock.is_some() {
            assert!(!scheduler.engine().wait_for().has_cycle());
            detected = true;
        } else if detected && turn.transaction == T1 {
            progressed_after |= matches!(turn.step, Step::Progressed { .. });
        }
    }

    assert!(detected);
    assert!(progressed_after);
    assert!(scheduler.is_finished());
    assert_eq!(scheduler.completed(), 2);
}

#[test]
fn denied_operation_is_retried_unchanged() {
    let mut scheduler = scheduler(programs! {
        [w(3, 1), r(4), r(5), c],
        [r(3), c],
    });

    scheduler.step().unwrap();
    let turn = scheduler.step().unwrap().unwrap();
    assert_eq!(turn.transaction, T2);
    assert_eq!(
        turn.step,
        Step::Denied {
            denials: 1,
            blockers: vec![T1],
        }
    );
    scheduler.step().unwrap();
    let again = scheduler.step().unwrap().unwrap();
    assert!(matches!(again.step, Step::Denied { denials: 2, .. }));
    assert_eq!(scheduler.transaction(T2).unwrap().cursor(), 0);
}

#[test]
fn lower_threshold_detects_sooner() {
    let programs = programs! {
        [w(1, 1), w(2, 1), c],
        [w(2, 2), w(1, 2), c],
    };
    let eager = Scheduler::new(
        new_db(),
        programs.clone(),
        SchedulerConfig::builder().deadlock_threshold(1).build(),
    )
    .unwrap()
    .run()
    .unwrap();
    let patient = scheduler(programs).run().unwrap();

    assert!(eager.turns < patient.turns);
    assert_eq!(eager.final_store, patient.final_store);
    assert_eq!(eager.deadlocks, patient.deadlocks);
}
