//! Core data types shared across the interpreter: symbols, directions,
//! machine variants, compiled instructions, compile diagnostics, step
//! outcomes, and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The blank tape symbol. A space in any input is normalized to this.
pub const BLANK: char = '_';
/// The wildcard token. As a table key it matches any state or symbol; as a
/// new-symbol or new-state value it means "keep the current one".
pub const WILDCARD: char = '*';
/// Wildcard state key, the string form of [`WILDCARD`].
pub const WILDCARD_STATE: &str = "*";
/// State entered when no rule applies to the current configuration.
pub const IMPLICIT_HALT_STATE: &str = "halt";
/// Initial state used when the host supplies an empty state text.
pub const DEFAULT_STATE: &str = "0";
/// Number of undo entries a machine retains unless configured otherwise.
pub const DEFAULT_UNDO_CAPACITY: usize = 10;

/// Normalizes a raw input symbol: spaces become [`BLANK`], everything else
/// passes through.
pub fn normalize_symbol(symbol: char) -> char {
    if symbol == ' ' {
        BLANK
    } else {
        symbol
    }
}

/// Returns true if `name` denotes a terminal state.
///
/// Any state whose first four characters spell "halt" case-insensitively is
/// terminal: `halt`, `HALT-accept` and `Halting` all qualify, `hal` does not.
/// The prefix match is part of the language semantics, not a shortcut.
pub fn is_halt_state(name: &str) -> bool {
    name.chars()
        .take(4)
        .flat_map(char::to_lowercase)
        .eq(IMPLICIT_HALT_STATE.chars())
}

/// Head movement performed by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    /// The offset applied to the head position by this movement.
    pub fn delta(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Stay => 0,
        }
    }
}

/// Execution variant of the machine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Tape infinite in both directions, deterministic.
    #[default]
    Standard,
    /// Tape bounded on the left: the head never moves below position 0.
    LeftBounded,
    /// Multiple rules may share a (state, symbol) key; one is chosen at
    /// random on each step.
    Nondeterministic,
}

impl Variant {
    /// Numeric code used by the snapshot format.
    pub fn code(self) -> u8 {
        match self {
            Variant::Standard => 0,
            Variant::LeftBounded => 1,
            Variant::Nondeterministic => 2,
        }
    }

    /// Decodes a snapshot variant code.
    pub fn from_code(code: u8) -> Option<Variant> {
        match code {
            0 => Some(Variant::Standard),
            1 => Some(Variant::LeftBounded),
            2 => Some(Variant::Nondeterministic),
            _ => None,
        }
    }
}

/// A single compiled transition rule.
///
/// Instructions are owned by the program table and immutable after
/// compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Symbol written under the head; `None` keeps the symbol that was read.
    pub write: Option<char>,
    /// Head movement applied after the write.
    pub movement: Direction,
    /// State entered after the transition; `None` stays in the current state.
    pub next_state: Option<String>,
    /// 0-based source line this instruction was compiled from.
    pub source_line: usize,
    /// Pauses automatic stepping after this instruction fires.
    pub breakpoint: bool,
}

/// Severity of a compile diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The offending line was rejected and skipped.
    Error,
    /// The line compiled, but something about it is suspect.
    Warning,
}

/// A compile diagnostic tied to a source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// 0-based source line the diagnostic is anchored to.
    pub line: usize,
    /// Earlier line involved in a duplicate-definition conflict.
    pub related_line: Option<usize>,
    /// Human-readable message. Line numbers inside it are 1-based.
    pub message: String,
}

impl Diagnostic {
    pub(crate) fn syntax(line: usize, detail: &str) -> Self {
        Self {
            severity: Severity::Error,
            line,
            related_line: None,
            message: format!("Syntax error on line {}: {}!", line + 1, detail),
        }
    }

    pub(crate) fn duplicate(state: &str, symbol: char, first_line: usize, line: usize) -> Self {
        Self {
            severity: Severity::Warning,
            line,
            related_line: Some(first_line),
            message: format!(
                "Multiple definitions for state '{}' symbol '{}' on lines {} and {}",
                state,
                symbol,
                first_line + 1,
                line + 1
            ),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of a single [`Machine::step`](crate::Machine::step) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// A transition fired and the machine can keep going.
    Continue,
    /// A transition fired and its instruction carries a breakpoint mark.
    /// The caller should suspend automatic stepping; execution is resumable.
    Breakpoint {
        /// 0-based source line of the instruction that fired.
        line: usize,
    },
    /// The machine reached a terminal state. No further steps will execute.
    Halted(HaltCause),
    /// `step` was called while already halted; nothing changed.
    AlreadyHalted,
}

/// Why the machine halted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltCause {
    /// The executed instruction moved the machine into a halt state.
    HaltState,
    /// No rule applied to the configuration; an implicit halt was
    /// synthesized. This is a normal termination, not an error.
    NoRule { state: String, symbol: char },
}

impl fmt::Display for HaltCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltCause::HaltState => write!(f, "Halted."),
            HaltCause::NoRule { state, symbol } => {
                write!(
                    f,
                    "Halted. No rule for state '{}' and symbol '{}'.",
                    state, symbol
                )
            }
        }
    }
}

/// Errors surfaced by engine operations.
///
/// Runtime halts are not errors; these cover operational misuse and host
/// plumbing failures only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// `undo` was called with an empty undo log.
    #[error("nothing to undo")]
    EmptyUndoLog,
    /// A snapshot could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(String),
    /// A program file could not be read.
    #[error("file error: {0}")]
    File(String),
    /// No embedded demo program matches the requested name or index.
    #[error("unknown program: {0}")]
    UnknownProgram(String),
}
