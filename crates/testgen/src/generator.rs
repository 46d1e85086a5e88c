use chrono::{DateTime, Duration, Local};
use lockstep_core::error::Error;
use lockstep_core::store::RecordStore;
use lockstep_core::transaction::types::{Operation, Program, Value};
use rand::distr::{Distribution, Uniform};
use rand::RngExt;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Shape of a generated workload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, TypedBuilder)]
pub struct WorkloadParams {
    #[builder(default)]
    pub id: u64,
    /// Size of the record store the programs address.
    pub n_record: usize,
    pub n_transaction: usize,
    /// Data operations per program, not counting the final commit.
    pub n_operation: usize,
    /// Written values are drawn from `0..=max_value`.
    #[builder(default = 9)]
    pub max_value: Value,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Workload {
    params: WorkloadParams,
    info: String,
    start: DateTime<Local>,
    end: DateTime<Local>,
    data: Vec<Program>,
}

impl Workload {
    #[must_use]
    pub const fn new(
        params: WorkloadParams,
        info: String,
        start: DateTime<Local>,
        end: DateTime<Local>,
        data: Vec<Program>,
    ) -> Self {
        Self {
            params,
            info,
            start,
            end,
            data,
        }
    }

    #[must_use]
    pub const fn get_id(&self) -> u64 {
        self.params.id
    }

    #[must_use]
    pub const fn get_data(&self) -> &Vec<Program> {
        &self.data
    }

    #[must_use]
    pub const fn get_params(&self) -> &WorkloadParams {
        &self.params
    }

    #[must_use]
    pub fn get_duration(&self) -> Duration {
        self.end - self.start
    }

    /// Store the programs were generated for: record `i` holds `i`.
    #[must_use]
    pub fn initial_store(&self) -> RecordStore {
        RecordStore::identity(self.params.n_record)
    }
}

/// Generate `n_transaction` programs of `n_operation` random reads and writes
/// over records `0..n_record`, each closed by a commit.
///
/// A write's value is drawn from `0..=max_value`. With `n_record == 0` there
/// is nothing to address and every program is a bare commit.
///
/// # Errors
///
/// Propagates program validation errors; generated programs always end in a
/// single commit, so none are expected.
pub fn generate_single_workload(
    n_record: usize,
    n_transaction: usize,
    n_operation: usize,
    max_value: Value,
) -> Result<Vec<Program>, Error> {
    let mut random_generator = rand::rng();
    let records = Uniform::new(0, n_record).ok();
    let values = Uniform::new_inclusive(0, max_value.max(0)).ok();

    (0..n_transaction)
        .map(|_| {
            let mut operations: Vec<Operation> = match &records {
                Some(records) => (0..n_operation)
                    .map(|_| {
                        let record = records.sample(&mut random_generator);
                        if random_generator.random::<bool>() {
                            Operation::read(record)
                        } else {
                            let value = values
                                .as_ref()
                                .map_or(0, |values| values.sample(&mut random_generator));
                            Operation::write(record, value)
                        }
                    })
                    .collect(),
                None => Vec::new(),
            };
            operations.push(Operation::Commit);
            Program::new(operations)
        })
        .collect()
}

/// Generate `n_workload` independent workloads in parallel.
///
/// # Errors
///
/// See [`generate_single_workload`].
pub fn generate_mult_workloads(
    n_workload: u64,
    n_record: usize,
    n_transaction: usize,
    n_operation: usize,
    max_value: Value,
) -> Result<Vec<Workload>, Error> {
    (0..n_workload)
        .into_par_iter()
        .map(|i_workload| {
            let start_time = Local::now();
            let data = generate_single_workload(n_record, n_transaction, n_operation, max_value)?;
            let end_time = Local::now();
            Ok(Workload {
                params: WorkloadParams {
                    id: i_workload,
                    n_record,
                    n_transaction,
                    n_operation,
                    max_value,
                },
                info: "generated".to_string(),
                start: start_time,
                end: end_time,
                data,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_of_single_workload() {
        let programs = generate_single_workload(4, 5, 3, 9).unwrap();
        assert_eq!(programs.len(), 5);
        for program in &programs {
            assert_eq!(program.len(), 4);
            assert_eq!(program.operations().last(), Some(&Operation::Commit));
            assert!(program.max_record().is_none_or(|r| r < 4));
            for op in program.operations() {
                if let Operation::Write { value, .. } = op {
                    assert!((0..=9).contains(value));
                }
            }
        }
    }

    #[test]
    fn test_empty_store_gives_commit_only_programs() {
        let programs = generate_single_workload(0, 3, 5, 9).unwrap();
        assert!(programs
            .iter()
            .all(|p| p.operations() == [Operation::Commit]));
    }

    #[test]
    fn test_mult_workloads_ids() {
        let workloads = generate_mult_workloads(6, 3, 2, 2, 5).unwrap();
        let mut ids: Vec<u64> = workloads.iter().map(Workload::get_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..6).collect::<Vec<_>>());
        assert!(workloads.iter().all(|w| w.get_data().len() == 2));
        assert!(workloads
            .iter()
            .all(|w| w.get_duration() >= Duration::zero()));
    }

    #[test]
    fn test_params_builder_defaults() {
        let params = WorkloadParams::builder()
            .n_record(10)
            .n_transaction(3)
            .n_operation(4)
            .build();
        assert_eq!(params.id, 0);
        assert_eq!(params.max_value, 9);
    }
}
