//! lockstep CLI -- run, generate and format transaction workloads.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lockstep_core::config::DEFAULT_DEADLOCK_THRESHOLD;
use lockstep_core::store::RecordStore;
use lockstep_core::transaction::types::Value;

#[derive(Debug, Parser)]
#[command(
    name = "lockstep",
    about = "Deterministic lock-based concurrency control simulator"
)]
pub struct App {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a workload file and print its log trace and final store
    Run(RunArgs),
    /// Run the built-in reference scenarios
    Demo(DemoArgs),
    /// Generate random workloads as JSON files
    Generate(GenerateArgs),
    /// Format workload files into canonical program text (drops comments)
    Fmt(FmtArgs),
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Workload file: one program per line, e.g. `W(1,5);R(2);C`
    pub input: PathBuf,
    /// Initial store values, comma separated (record ids start at 0)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, conflicts_with = "records")]
    pub store: Option<Vec<Value>>,
    /// Number of records; record `i` starts with value `i`
    #[arg(long, default_value_t = 10)]
    pub records: usize,
    #[command(flatten)]
    pub run: RunOptions,
}

#[derive(Debug, Parser)]
pub struct DemoArgs {
    /// Scenario to run (all of them when omitted)
    #[arg(long)]
    pub scenario: Option<Scenario>,
    #[command(flatten)]
    pub run: RunOptions,
}

/// Flags shared by every command that executes a schedule.
#[derive(Debug, Clone, Copy, clap::Args)]
pub struct RunOptions {
    /// Consecutive denials of one operation before deadlock detection runs
    #[arg(long, default_value_t = DEFAULT_DEADLOCK_THRESHOLD)]
    pub threshold: u32,
    /// Print the full run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Number of workloads to generate
    #[arg(long)]
    pub n_workload: u64,
    /// Number of records in the store
    #[arg(long)]
    pub n_record: usize,
    /// Number of transactions per workload
    #[arg(long)]
    pub n_txn: usize,
    /// Number of reads and writes per transaction, before its commit
    #[arg(long)]
    pub n_op: usize,
    /// Largest value a write may install
    #[arg(long, default_value_t = 9)]
    pub max_value: Value,
    /// Output directory for generated workload files
    #[arg(long)]
    pub output_dir: PathBuf,
}

#[derive(Debug, Parser)]
pub struct FmtArgs {
    /// Workload files to format
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Check formatting without modifying files (exit 1 if unformatted)
    #[arg(long)]
    pub check: bool,
}

impl RunArgs {
    /// Initial store selected by `--store` or `--records`.
    #[must_use]
    pub fn initial_store(&self) -> RecordStore {
        self.store.as_ref().map_or_else(
            || RecordStore::identity(self.records),
            |values| RecordStore::new(values.clone()),
        )
    }
}

/// Reference workloads, all run over the store `[0, 1, ..., 9]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Two transactions that serialize without waiting for long
    Handout,
    ThreeTransactions,
    /// T2 and T3 deadlock while T1 waits behind them
    Deadlocks,
    NoConflicts,
    /// Several overlapping waits, one real cycle
    MultipleDeadlocks,
    /// A four-transaction cycle
    LargerCycle,
}

impl Scenario {
    pub const ALL: [Self; 6] = [
        Self::Handout,
        Self::ThreeTransactions,
        Self::Deadlocks,
        Self::NoConflicts,
        Self::MultipleDeadlocks,
        Self::LargerCycle,
    ];

    /// Number of records of the scenario store.
    pub const RECORDS: usize = 10;

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Handout => "handout",
            Self::ThreeTransactions => "three-transactions",
            Self::Deadlocks => "deadlocks",
            Self::NoConflicts => "no-conflicts",
            Self::MultipleDeadlocks => "multiple-deadlocks",
            Self::LargerCycle => "larger-cycle",
        }
    }

    /// Workload text, one program per line.
    #[must_use]
    pub const fn workload(self) -> &'static str {
        match self {
            Self::Handout => "W(1,5);R(2);W(2,3);R(1);C\nR(1);W(1,2);C\n",
            Self::ThreeTransactions => {
                "R(6);W(7,2);W(5,8);W(6,2);C\nR(4);W(2,4);R(5);W(7,3);C\nR(9);R(6);W(1,9);C\n"
            }
            Self::Deadlocks => {
                "W(4,1);R(1);W(1,2);C\nW(5,2);R(1);R(2);W(2,3);C\nW(6,3);R(2);W(2,4);C\n"
            }
            Self::NoConflicts => "R(1);R(2);R(3);W(4,1);C\nR(1);R(2);R(3);W(5,2);C\n",
            Self::MultipleDeadlocks => "R(1);W(2,1);C\nR(2);R(3);W(1,2);C\nR(1);W(3,3);C\n",
            Self::LargerCycle => {
                "R(1);W(2,1);C\nR(2);W(3,2);C\nR(3);W(4,3);C\nR(4);W(1,4);C\n"
            }
        }
    }
}
