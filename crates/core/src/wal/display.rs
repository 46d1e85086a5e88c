use alloc::string::String;
use core::fmt::Write;

use crate::wal::entry::LogEntry;

/// Format log entries as the textual trace, one entry per line.
///
/// The output ends with a trailing newline unless `entries` is empty.
#[must_use]
pub fn format_trace(entries: &[LogEntry]) -> String {
    let mut output = String::new();
    for entry in entries {
        let _ = writeln!(output, "{entry}");
    }
    output
}
