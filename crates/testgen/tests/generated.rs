use lockstep_core::config::SchedulerConfig;
use lockstep_core::scheduler::Scheduler;
use lockstep_core::transaction::Outcome;
use lockstep_core::wal::LogKind;
use lockstep_testgen::{generate_mult_workloads, Workload};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

fn check_workload(workload: &Workload, threshold: u32) {
    let config = SchedulerConfig::builder()
        .deadlock_threshold(threshold)
        .build();
    let mut scheduler = Scheduler::new(
        workload.initial_store(),
        workload.get_data().clone(),
        config,
    )
    .unwrap();

    while let Some(_turn) = scheduler.step().unwrap() {
        for (record, entry) in scheduler.engine().locks().entries() {
            assert!(
                entry.exclusive.is_none() || entry.shared.is_empty(),
                "workload {}: record {record} locked both ways",
                workload.get_id()
            );
        }
    }

    assert!(scheduler.is_finished());
    assert!(scheduler
        .transactions()
        .iter()
        .all(|txn| txn.outcome().is_some()));

    let engine = scheduler.engine();
    let initial = workload.initial_store();
    assert_eq!(
        engine.log().committed_replay(initial.values()).unwrap(),
        engine.store().values()
    );

    let aborted = scheduler
        .transactions()
        .iter()
        .filter(|txn| txn.outcome() == Some(Outcome::Aborted))
        .count();
    let abort_entries = engine
        .log()
        .entries()
        .iter()
        .filter(|e| e.kind == LogKind::Abort)
        .count();
    assert_eq!(aborted, abort_entries);
    assert_eq!(aborted, scheduler.deadlocks().len());
}

#[test]
fn generated_workloads_terminate_consistently() {
    let workloads = generate_mult_workloads(32, 6, 5, 4, 9).unwrap();
    workloads.par_iter().for_each(|w| check_workload(w, 10));
}

#[test]
fn contended_workloads_with_eager_detection() {
    // two records and many writers: deadlocks are frequent
    let workloads = generate_mult_workloads(32, 2, 6, 4, 3).unwrap();
    workloads.par_iter().for_each(|w| check_workload(w, 1));
}

#[test]
fn workload_serializes_to_json() {
    let workloads = generate_mult_workloads(1, 3, 2, 2, 5).unwrap();
    let json = serde_json::to_string(&workloads[0]).unwrap();
    let back: Workload = serde_json::from_str(&json).unwrap();
    assert_eq!(back.get_data(), workloads[0].get_data());
    assert_eq!(back.get_params(), workloads[0].get_params());
}
