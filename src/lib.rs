//! Interpreter for a line-oriented Turing machine rule language.
//!
//! Source text compiles into a transition table with wildcard fallback; a
//! [`Machine`] executes it one step at a time over an unbounded tape, with
//! three execution variants and bounded single-step undo. Hosts drive the
//! machine cooperatively and render its observable state between steps.

pub mod compiler;
pub mod loader;
pub mod machine;
pub mod program;
pub mod programs;
pub mod snapshot;
pub mod tape;
pub mod types;
pub mod undo;

/// Re-exports the compile entry point and its result type.
pub use compiler::{compile, Compilation};
/// Re-exports the file/string program loader.
pub use loader::{LoadedProgram, ProgramLoader};
/// Re-exports the machine aggregate.
pub use machine::Machine;
/// Re-exports the compiled transition table.
pub use program::ProgramTable;
/// Re-exports the embedded demo program registry.
pub use programs::{Demo, DemoLibrary, DEMOS};
/// Re-exports the snapshot record used for save/load.
pub use snapshot::{Restored, Snapshot, SNAPSHOT_VERSION};
/// Re-exports the tape abstraction.
pub use tape::Tape;
/// Re-exports core types shared across the interpreter.
pub use types::{
    is_halt_state, Diagnostic, Direction, EngineError, HaltCause, Instruction, Severity,
    StepResult, Variant, BLANK, DEFAULT_UNDO_CAPACITY, WILDCARD,
};
/// Re-exports the bounded undo log.
pub use undo::{UndoEntry, UndoLog};
