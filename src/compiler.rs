//! Line-oriented compiler for the rule language.
//!
//! Each non-blank line is a rule of the form
//! `<currentState> <currentSymbol> <newSymbol> <direction> <newState> [!]`,
//! with `;` starting a comment. Compilation never fails as a whole: bad
//! lines are skipped and reported through diagnostics, and whatever table
//! the good lines produce is returned.

use lazy_static::lazy_static;
use regex::Regex;

use crate::program::ProgramTable;
use crate::types::{
    Diagnostic, Direction, Instruction, Severity, Variant, WILDCARD, WILDCARD_STATE,
};

lazy_static! {
    /// `; ... $DEBUG: <n>` anywhere in the source sets the verbosity level.
    static ref DEBUG_DIRECTIVE: Regex = Regex::new(r";.*\$DEBUG: *(\d+)").unwrap();
}

/// Result of compiling a source text.
///
/// A table is always produced, possibly empty. Rebuilt wholesale on every
/// compile; the previous table is discarded by the caller.
#[derive(Debug, Default, Clone)]
pub struct Compilation {
    pub table: ProgramTable,
    /// Per-line syntax errors and semantic warnings, in source order.
    pub diagnostics: Vec<Diagnostic>,
    /// Verbosity level requested by a `$DEBUG:` directive, 0 when absent.
    /// A host-visible knob only; execution semantics ignore it.
    pub debug_level: u32,
}

impl Compilation {
    /// True if any line was rejected outright.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    /// Sorted, deduplicated 0-based source lines a host should highlight.
    /// Both lines of a duplicate-definition conflict are included.
    pub fn error_lines(&self) -> Vec<usize> {
        let mut lines: Vec<usize> = self
            .diagnostics
            .iter()
            .flat_map(|diagnostic| {
                std::iter::once(diagnostic.line).chain(diagnostic.related_line)
            })
            .collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }
}

/// Compiles `source` into a program table for the given variant.
///
/// The variant matters at compile time: nondeterministic programs may define
/// several rules for one (state, symbol) key, while the other variants treat
/// a second definition as a conflict where the last one wins.
pub fn compile(source: &str, variant: Variant) -> Compilation {
    let mut table = ProgramTable::new();
    let mut diagnostics = Vec::new();
    let append = variant == Variant::Nondeterministic;

    for (line_number, line) in source.lines().enumerate() {
        match parse_line(line, line_number) {
            Ok(Some(rule)) => {
                let instruction = Instruction {
                    write: rule.write,
                    movement: rule.movement,
                    next_state: rule.next_state,
                    source_line: line_number,
                    breakpoint: rule.breakpoint,
                };
                if let Some(first_line) =
                    table.define(&rule.state, rule.symbol, instruction, append)
                {
                    diagnostics.push(Diagnostic::duplicate(
                        &rule.state,
                        rule.symbol,
                        first_line,
                        line_number,
                    ));
                }
            }
            Ok(None) => {} // blank or comment-only line
            Err(diagnostic) => diagnostics.push(diagnostic),
        }
    }

    let debug_level = DEBUG_DIRECTIVE
        .captures(source)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(0);

    Compilation {
        table,
        diagnostics,
        debug_level,
    }
}

/// A validated rule line, before table insertion.
struct ParsedRule {
    state: String,
    symbol: char,
    write: Option<char>,
    movement: Direction,
    next_state: Option<String>,
    breakpoint: bool,
}

/// Parses one source line. `Ok(None)` for blank or comment-only lines.
fn parse_line(line: &str, line_number: usize) -> Result<Option<ParsedRule>, Diagnostic> {
    // Everything from the first ';' onward is a comment.
    let code = line.split(';').next().unwrap_or("");
    let tokens: Vec<&str> = code.split_whitespace().collect();

    if tokens.is_empty() {
        return Ok(None);
    }

    let state = tokens[0].to_string();

    let symbol = match tokens.get(1) {
        None => return Err(Diagnostic::syntax(line_number, "missing <current symbol>")),
        Some(token) => single_char(token).ok_or_else(|| {
            Diagnostic::syntax(line_number, "<current symbol> should be a single character")
        })?,
    };

    let write = match tokens.get(2) {
        None => return Err(Diagnostic::syntax(line_number, "missing <new symbol>")),
        Some(token) => single_char(token).ok_or_else(|| {
            Diagnostic::syntax(line_number, "<new symbol> should be a single character")
        })?,
    };

    let movement = match tokens.get(3) {
        None => return Err(Diagnostic::syntax(line_number, "missing <direction>")),
        Some(token) => parse_direction(token).ok_or_else(|| {
            Diagnostic::syntax(line_number, "<direction> should be 'l', 'r' or '*'")
        })?,
    };

    let next_state = match tokens.get(4) {
        None => return Err(Diagnostic::syntax(line_number, "missing <new state>")),
        Some(token) => token.to_string(),
    };

    // A 6th token must be exactly '!'; anything else there, or any 7th
    // token, is rejected by the same check.
    let breakpoint = match tokens.len() {
        5 => false,
        6 if tokens[5] == "!" => true,
        _ => return Err(Diagnostic::syntax(line_number, "too many entries")),
    };

    Ok(Some(ParsedRule {
        state,
        symbol,
        write: wildcard_to_keep(write),
        movement,
        next_state: if next_state == WILDCARD_STATE {
            None
        } else {
            Some(next_state)
        },
        breakpoint,
    }))
}

/// Wildcard new-symbols compile to "keep whatever was read".
fn wildcard_to_keep(symbol: char) -> Option<char> {
    if symbol == WILDCARD {
        None
    } else {
        Some(symbol)
    }
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn parse_direction(token: &str) -> Option<Direction> {
    match token.to_lowercase().as_str() {
        "l" => Some(Direction::Left),
        "r" => Some(Direction::Right),
        "*" => Some(Direction::Stay),
        _ => None,
    }
}
