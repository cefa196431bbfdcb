//! The machine aggregate: compiled program, tape, head, state, step counter,
//! and undo log, with the single-step execution algorithm.
//!
//! The machine has no internal scheduling. "Running" is a caller repeatedly
//! invoking [`Machine::step`]; each step is an atomic unit of work, fully
//! committed before the next one begins.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::program::ProgramTable;
use crate::tape::Tape;
use crate::types::{
    is_halt_state, normalize_symbol, EngineError, HaltCause, Instruction, StepResult, Variant,
    BLANK, DEFAULT_STATE, DEFAULT_UNDO_CAPACITY, IMPLICIT_HALT_STATE,
};
use crate::undo::{UndoEntry, UndoLog};

/// A Turing machine instance: owns its tape, program table, undo log, and
/// control state exclusively. Multiple independent machines may coexist;
/// sharing one across threads requires external synchronization.
pub struct Machine {
    program: ProgramTable,
    variant: Variant,
    tape: Tape,
    state: String,
    head: i64,
    steps: usize,
    undo: UndoLog,
    last_line: Option<usize>,
    rng: StdRng,
}

impl Machine {
    /// Creates a machine over a compiled program, with a blank tape, the
    /// default initial state, and the default undo capacity.
    pub fn new(program: ProgramTable, variant: Variant) -> Self {
        Self {
            program,
            variant,
            tape: Tape::new(),
            state: DEFAULT_STATE.to_string(),
            head: 0,
            steps: 0,
            undo: UndoLog::new(DEFAULT_UNDO_CAPACITY),
            last_line: None,
            rng: StdRng::from_entropy(),
        }
    }

    pub(crate) fn from_parts(
        program: ProgramTable,
        variant: Variant,
        tape: Tape,
        state: String,
        head: i64,
        steps: usize,
    ) -> Self {
        let mut machine = Self::new(program, variant);
        machine.tape = tape;
        machine.state = state;
        machine.head = head;
        machine.steps = steps;
        machine
    }

    /// Replaces the random source used for nondeterministic instruction
    /// selection with a seeded generator, making runs reproducible.
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Reconfigures how many undo entries are retained. 0 disables undo.
    pub fn set_undo_capacity(&mut self, capacity: usize) {
        self.undo.set_capacity(capacity);
    }

    /// Reinitializes tape, head, state, and step counter from host-supplied
    /// initial texts, clearing the undo log.
    ///
    /// In the tape text a single `*` marks the head position and is stripped
    /// from the content; without one the head starts at 0. Spaces become
    /// blanks, and an effectively empty tape becomes one blank cell. The
    /// initial state is the first whitespace-delimited token of
    /// `initial_state`, defaulting to `0`.
    pub fn reset(&mut self, initial_tape: &str, initial_state: &str) {
        let (content, head) = parse_initial_tape(initial_tape);
        self.tape = Tape::from_content(&content, 0);
        self.head = head;
        self.state = parse_initial_state(initial_state);
        self.steps = 0;
        self.undo.clear();
        self.last_line = None;
    }

    /// Installs a freshly compiled table. Undo entries reference instruction
    /// lines of the previous source, so the log is cleared unconditionally.
    pub fn load_program(&mut self, program: ProgramTable) {
        self.program = program;
        self.undo.clear();
        self.last_line = None;
    }

    /// Executes one transition.
    ///
    /// Resolves the applicable instruction for the current (state, symbol);
    /// when none exists, synthesizes an implicit halt that writes the same
    /// symbol back without moving. The pre-step configuration is recorded in
    /// the undo log before the tape is touched.
    pub fn step(&mut self) -> StepResult {
        if is_halt_state(&self.state) {
            return StepResult::AlreadyHalted;
        }

        let symbol = self.tape.read(self.head);
        let chosen = self.choose_instruction(symbol);

        let (write, next_state, mut delta, no_rule) = match &chosen {
            Some(instruction) => (
                instruction.write.unwrap_or(symbol),
                instruction
                    .next_state
                    .clone()
                    .unwrap_or_else(|| self.state.clone()),
                instruction.movement.delta(),
                None,
            ),
            None => (
                symbol,
                IMPLICIT_HALT_STATE.to_string(),
                0,
                Some(HaltCause::NoRule {
                    state: self.state.clone(),
                    symbol,
                }),
            ),
        };

        // Left-bounded tape: a left move at the origin becomes a stay.
        if self.variant == Variant::LeftBounded && self.head == 0 && delta < 0 {
            delta = 0;
        }

        self.undo.record(UndoEntry {
            state: self.state.clone(),
            head: self.head,
            symbol,
        });

        self.tape.write(self.head, write);
        self.state = next_state;
        self.head += delta;
        self.steps += 1;
        self.last_line = chosen.as_ref().map(|instruction| instruction.source_line);

        if let Some(cause) = no_rule {
            return StepResult::Halted(cause);
        }
        if is_halt_state(&self.state) {
            return StepResult::Halted(HaltCause::HaltState);
        }
        match &chosen {
            Some(instruction) if instruction.breakpoint => StepResult::Breakpoint {
                line: instruction.source_line,
            },
            _ => StepResult::Continue,
        }
    }

    fn choose_instruction(&mut self, symbol: char) -> Option<Instruction> {
        let candidates = self.program.resolve(&self.state, symbol);
        match candidates.len() {
            0 => None,
            1 => Some(candidates[0].clone()),
            count => {
                let pick = if self.variant == Variant::Nondeterministic {
                    self.rng.gen_range(0..count)
                } else {
                    0
                };
                Some(candidates[pick].clone())
            }
        }
    }

    /// Reverts the most recent step: restores state and head, writes the
    /// overwritten symbol back, and decrements the step counter.
    ///
    /// Repeatable up to the number of entries currently in the undo log.
    pub fn undo(&mut self) -> Result<(), EngineError> {
        let entry = self.undo.pop().ok_or(EngineError::EmptyUndoLog)?;
        self.steps -= 1;
        self.state = entry.state;
        self.head = entry.head;
        self.tape.write(self.head, entry.symbol);
        self.last_line = None;
        Ok(())
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn head_position(&self) -> i64 {
        self.head
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn program(&self) -> &ProgramTable {
        &self.program
    }

    /// True once the machine has entered a halt state.
    pub fn is_halted(&self) -> bool {
        is_halt_state(&self.state)
    }

    /// The symbol currently under the head.
    pub fn current_symbol(&self) -> char {
        self.tape.read(self.head)
    }

    /// Number of steps that can currently be undone.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Source line of the instruction that fired last, if any. Cleared by
    /// reset, undo, and program reload.
    pub fn last_source_line(&self) -> Option<usize> {
        self.last_line
    }

    /// Source lines of the instructions applicable to the current
    /// configuration. More than one only under nondeterministic programs.
    pub fn next_source_lines(&self) -> Vec<usize> {
        self.program
            .applicable_lines(&self.state, self.tape.read(self.head))
    }
}

/// Splits host-supplied initial tape text into normalized content and the
/// head position marked by `*`.
fn parse_initial_tape(text: &str) -> (String, i64) {
    let head = text.chars().position(|c| c == '*').unwrap_or(0) as i64;
    let mut content: String = text
        .chars()
        .filter(|&c| c != '*')
        .map(normalize_symbol)
        .collect();
    if content.is_empty() {
        content.push(BLANK);
    }
    (content, head)
}

fn parse_initial_state(text: &str) -> String {
    text.split_whitespace()
        .next()
        .unwrap_or(DEFAULT_STATE)
        .to_string()
}
