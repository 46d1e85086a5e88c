//! Text format for transaction programs.
//!
//! A program is a `;`-separated list of `R(record)`, `W(record,value)` and a
//! final `C`. A workload file holds one program per line; lines starting
//! with `//` and blank lines are ignored.
//!
//! ```rust
//! use lockstep_parser::{format_workload, parse_workload};
//!
//! let programs = parse_workload("// T1\nW(1,5);R(2);C\nR(1); W(1,2); C\n")?;
//! assert_eq!(programs.len(), 2);
//! assert_eq!(format_workload(&programs), "W(1,5);R(2);C\nR(1);W(1,2);C\n");
//! # Ok::<(), lockstep_parser::ParseError>(())
//! ```

pub mod parser;

pub use parser::{format_workload, parse_program, parse_workload, ParseError};
