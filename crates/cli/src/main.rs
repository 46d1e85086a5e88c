use std::{fs, process};

use clap::Parser;
use lockstep_cli::{App, Command, RunOptions, Scenario};
use lockstep_core::config::SchedulerConfig;
use lockstep_core::store::RecordStore;
use lockstep_core::transaction::types::Program;
use lockstep_core::{RunReport, Scheduler};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app = App::parse();
    match &app.command {
        Command::Run(args) => run(args),
        Command::Demo(args) => demo(args),
        Command::Generate(args) => generate(args),
        Command::Fmt(args) => fmt(args),
    }
}

fn execute(store: RecordStore, programs: Vec<Program>, options: RunOptions) -> RunReport {
    let config = SchedulerConfig::builder()
        .deadlock_threshold(options.threshold)
        .build();
    Scheduler::new(store, programs, config)
        .and_then(Scheduler::run)
        .unwrap_or_else(|e| {
            eprintln!("Run failed: {e}");
            process::exit(1);
        })
}

fn print_report(report: &RunReport) {
    print!("{}", report.trace());
    for deadlock in &report.deadlocks {
        let cycle: Vec<String> = deadlock.cycle.iter().map(ToString::to_string).collect();
        println!(
            "deadlock: {} -> aborted {}",
            cycle.join(" -> "),
            deadlock.victim
        );
    }
    let store: Vec<String> = report.final_store.iter().map(ToString::to_string).collect();
    println!("final store: [{}]", store.join(", "));
}

#[derive(Serialize)]
struct ScenarioReport {
    scenario: &'static str,
    report: RunReport,
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Failed to serialize report: {e}");
            process::exit(1);
        }
    }
}

fn run(args: &lockstep_cli::RunArgs) {
    let text = fs::read_to_string(&args.input).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {e}", args.input.display());
        process::exit(1);
    });
    let programs = lockstep_parser::parse_workload(&text).unwrap_or_else(|e| {
        eprintln!("{}: {e}", args.input.display());
        process::exit(1);
    });

    let report = execute(args.initial_store(), programs, args.run);
    if args.run.json {
        print_json(&report);
    } else {
        print_report(&report);
    }
}

fn demo(args: &lockstep_cli::DemoArgs) {
    let scenarios = args
        .scenario
        .map_or_else(|| Scenario::ALL.to_vec(), |scenario| vec![scenario]);

    let mut results = Vec::new();
    for scenario in scenarios {
        let programs = lockstep_parser::parse_workload(scenario.workload()).unwrap_or_else(|e| {
            eprintln!("Scenario {}: {e}", scenario.name());
            process::exit(1);
        });
        let report = execute(
            RecordStore::identity(Scenario::RECORDS),
            programs,
            args.run,
        );

        if args.run.json {
            results.push(ScenarioReport {
                scenario: scenario.name(),
                report,
            });
        } else {
            println!("== {} ==", scenario.name());
            print_report(&report);
            println!();
        }
    }

    if args.run.json {
        print_json(&results);
    }
}

fn generate(args: &lockstep_cli::GenerateArgs) {
    fs::create_dir_all(&args.output_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create output directory: {e}");
        process::exit(1);
    });

    let workloads = lockstep_testgen::generator::generate_mult_workloads(
        args.n_workload,
        args.n_record,
        args.n_txn,
        args.n_op,
        args.max_value,
    )
    .unwrap_or_else(|e| {
        eprintln!("Failed to generate workloads: {e}");
        process::exit(1);
    });

    for workload in &workloads {
        let path = args.output_dir.join(format!("{}.json", workload.get_id()));
        let file = fs::File::create(&path).unwrap_or_else(|e| {
            eprintln!("Failed to create {}: {e}", path.display());
            process::exit(1);
        });
        serde_json::to_writer_pretty(file, workload).unwrap_or_else(|e| {
            eprintln!("Failed to write {}: {e}", path.display());
            process::exit(1);
        });
    }

    println!(
        "Generated {} workloads to {}",
        workloads.len(),
        args.output_dir.display()
    );
}

fn fmt(args: &lockstep_cli::FmtArgs) {
    let mut unformatted = false;

    for path in &args.paths {
        let text = fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Failed to read {}: {e}", path.display());
            process::exit(1);
        });
        let programs = lockstep_parser::parse_workload(&text).unwrap_or_else(|e| {
            eprintln!("{}: {e}", path.display());
            process::exit(1);
        });
        let formatted = lockstep_parser::format_workload(&programs);
        if formatted == text {
            continue;
        }

        if args.check {
            println!("{}: not formatted", path.display());
            unformatted = true;
        } else {
            fs::write(path, formatted).unwrap_or_else(|e| {
                eprintln!("Failed to write {}: {e}", path.display());
                process::exit(1);
            });
            println!("{}: formatted", path.display());
        }
    }

    if unformatted {
        process::exit(1);
    }
}
