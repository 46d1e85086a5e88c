use lockstep_core::transaction::types::{Operation, Program, RecordId, Value};
/// Winnow-based parser for the transaction program text format.
///
/// Grammar:
/// ```text
/// workload  = (comment | blank | program)*
/// comment   = WS* "//" REST_OF_LINE (NEWLINE | EOF)
/// blank     = WS* NEWLINE
/// program   = WS* operation (WS* ";" WS* operation)* WS* (NEWLINE | EOF)
/// operation = "R" "(" record ")"            -- read
///           | "W" "(" record "," value ")"  -- write
///           | "C"                           -- commit
/// record    = UNSIGNED INTEGER
/// value     = INTEGER
/// ```
///
/// Whitespace (spaces and tabs) is allowed between any two tokens. Each
/// program must end with its only `C`; this is checked after parsing and
/// reported at the start of the offending program.
use winnow::ascii::{dec_int, dec_uint, line_ending, till_line_ending};
use winnow::combinator::{alt, cut_err, eof, separated};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{literal, take_while};
use winnow::ModalResult;

// ---------------------------------------------------------------------------
// Public error type
// ---------------------------------------------------------------------------

/// A parse error with human-readable location information.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "parse error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    fn at(input: &str, offset: usize, message: String) -> Self {
        let (line, column) = offset_to_line_col(input, offset);
        Self {
            message,
            line,
            column,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Parse a single program such as `W(1,5);R(2);C`.
///
/// A trailing newline is accepted; anything else after the program is not.
///
/// # Errors
///
/// Returns a [`ParseError`] when the text does not match the grammar or the
/// program does not end with its only commit.
pub fn parse_program(input: &str) -> Result<Program, ParseError> {
    let mut stream: &str = input;
    let parsed = (program_line, eof)
        .map(|(line, _)| line)
        .parse_next(&mut stream);
    match parsed {
        Ok(line) => validate(input, line),
        Err(e) => Err(ParseError::at(input, consumed(input, stream), message(e))),
    }
}

/// Parse a workload: one program per line, with `//` comment lines and
/// blank lines ignored.
///
/// Programs are returned in file order, which is also their submission order
/// (the first program becomes `T1`).
///
/// # Errors
///
/// Returns a [`ParseError`] with line/column information for the first
/// malformed line or invalid program.
pub fn parse_workload(input: &str) -> Result<Vec<Program>, ParseError> {
    let mut stream: &str = input;
    match workload_parser.parse_next(&mut stream) {
        Ok(lines) => lines
            .into_iter()
            .map(|line| validate(input, line))
            .collect(),
        Err(e) => Err(ParseError::at(input, consumed(input, stream), message(e))),
    }
}

/// Render programs back into workload text, one canonical program per line.
#[must_use]
pub fn format_workload(programs: &[Program]) -> String {
    programs
        .iter()
        .map(|program| format!("{program}\n"))
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Operations of one program line, with the byte length of the input that
/// remained when the line's first operation started.
struct ProgramLine {
    remaining: usize,
    operations: Vec<Operation>,
}

fn validate(input: &str, line: ProgramLine) -> Result<Program, ParseError> {
    Program::new(line.operations).map_err(|e| {
        let offset = input.len().saturating_sub(line.remaining);
        ParseError::at(input, offset, e.to_string())
    })
}

fn consumed(original: &str, remaining: &str) -> usize {
    original.len().saturating_sub(remaining.len())
}

fn message(e: ErrMode<ContextError>) -> String {
    match e {
        ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => {
            let text = ctx.to_string();
            if text.is_empty() {
                "unexpected input".to_string()
            } else {
                text.replace('\n', "; ")
            }
        }
        ErrMode::Incomplete(_) => "incomplete input".to_string(),
    }
}

/// Convert a byte offset into the original input to 1-based (line, column).
fn offset_to_line_col(input: &str, offset: usize) -> (usize, usize) {
    let safe_offset = offset.min(input.len());
    let prefix = &input[..safe_offset];
    let line = prefix.bytes().filter(|&b| b == b'\n').count() + 1;
    let column = prefix
        .rfind('\n')
        .map_or_else(|| prefix.len() + 1, |pos| prefix.len() - pos);
    (line, column)
}

const fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

// ---------------------------------------------------------------------------
// Leaf parsers
// ---------------------------------------------------------------------------

/// Optional inline whitespace: spaces and tabs only (no newlines).
fn opt_ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c == ' ' || c == '\t')
        .void()
        .parse_next(input)
}

/// Newline or end of input.
fn line_end(input: &mut &str) -> ModalResult<()> {
    alt((line_ending.void(), eof.void())).parse_next(input)
}

fn record(input: &mut &str) -> ModalResult<RecordId> {
    dec_uint.context(expected("record id")).parse_next(input)
}

fn value(input: &mut &str) -> ModalResult<Value> {
    dec_int.context(expected("integer value")).parse_next(input)
}

fn token<'i>(tag: &'static str) -> impl Parser<&'i str, &'i str, ErrMode<ContextError>> {
    move |input: &mut &'i str| -> ModalResult<&'i str> {
        opt_ws.parse_next(input)?;
        literal(tag).context(expected(tag)).parse_next(input)
    }
}

// ---------------------------------------------------------------------------
// Operation parsers
// ---------------------------------------------------------------------------

/// `"R" "(" record ")"`
fn read_op(input: &mut &str) -> ModalResult<Operation> {
    literal("R").parse_next(input)?;
    let id = cut_err(|input: &mut &str| -> ModalResult<RecordId> {
        token("(").parse_next(input)?;
        opt_ws.parse_next(input)?;
        let id = record.parse_next(input)?;
        token(")").parse_next(input)?;
        Ok(id)
    })
    .parse_next(input)?;
    Ok(Operation::read(id))
}

/// `"W" "(" record "," value ")"`
fn write_op(input: &mut &str) -> ModalResult<Operation> {
    literal("W").parse_next(input)?;
    let (id, new_value) = cut_err(|input: &mut &str| -> ModalResult<(RecordId, Value)> {
        token("(").parse_next(input)?;
        opt_ws.parse_next(input)?;
        let id = record.parse_next(input)?;
        token(",").parse_next(input)?;
        opt_ws.parse_next(input)?;
        let new_value = value.parse_next(input)?;
        token(")").parse_next(input)?;
        Ok((id, new_value))
    })
    .parse_next(input)?;
    Ok(Operation::write(id, new_value))
}

/// `"C"`
fn commit_op(input: &mut &str) -> ModalResult<Operation> {
    literal("C").value(Operation::Commit).parse_next(input)
}

fn operation(input: &mut &str) -> ModalResult<Operation> {
    alt((read_op, write_op, commit_op))
        .context(expected("R(record), W(record,value) or C"))
        .parse_next(input)
}

// ---------------------------------------------------------------------------
// Line parsers
// ---------------------------------------------------------------------------

/// A program on one line, operations separated by `;`.
fn program_line(input: &mut &str) -> ModalResult<ProgramLine> {
    opt_ws.parse_next(input)?;
    let remaining = input.len();
    let operations: Vec<Operation> =
        separated(1.., operation, (opt_ws, literal(";"), opt_ws)).parse_next(input)?;
    opt_ws.parse_next(input)?;
    line_end
        .context(expected("`;` or end of line"))
        .parse_next(input)?;
    Ok(ProgramLine {
        remaining,
        operations,
    })
}

/// A comment line: `"//" <rest-of-line>`. Produces nothing.
fn comment_line(input: &mut &str) -> ModalResult<Option<ProgramLine>> {
    opt_ws.parse_next(input)?;
    literal("//").parse_next(input)?;
    till_line_ending.parse_next(input)?;
    line_end.parse_next(input)?;
    Ok(None)
}

/// A blank line (only whitespace + newline). Produces nothing.
fn blank_line(input: &mut &str) -> ModalResult<Option<ProgramLine>> {
    opt_ws.parse_next(input)?;
    line_ending.parse_next(input)?;
    Ok(None)
}

/// Any line that is neither a comment nor blank must be a program.
fn workload_item(input: &mut &str) -> ModalResult<Option<ProgramLine>> {
    alt((comment_line, blank_line, cut_err(program_line).map(Some))).parse_next(input)
}

fn workload_parser(input: &mut &str) -> ModalResult<Vec<ProgramLine>> {
    let mut lines = Vec::new();
    // Trailing inline whitespace with no newline is all that may be left.
    while !input.trim_start_matches([' ', '\t']).is_empty() {
        if let Some(line) = workload_item.parse_next(input)? {
            lines.push(line);
        }
    }
    opt_ws.parse_next(input)?;
    Ok(lines)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
