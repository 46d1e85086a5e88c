//! Random workload generation for exercising the scheduler.

pub mod generator;

pub use generator::{generate_mult_workloads, generate_single_workload, Workload, WorkloadParams};
