//! Versioned snapshot record for saving and restoring a whole machine.
//!
//! The field names are part of the wire format; hosts ship the JSON to
//! whatever storage they like. Loading is best-effort: every field is
//! optional, absent ones fall back to defaults, and an unknown version is
//! accepted with a warning rather than rejected.

use serde::{Deserialize, Serialize};

use crate::compiler::compile;
use crate::machine::Machine;
use crate::tape::Tape;
use crate::types::{Diagnostic, EngineError, Variant, DEFAULT_STATE};

/// Version written into every captured snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable record of a machine plus the host inputs that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Full program source text.
    pub program: Option<String>,
    /// Current state name.
    pub state: Option<String>,
    /// Raw tape buffer contents.
    pub tape: Option<String>,
    /// Tape position of the first buffered cell.
    #[serde(rename = "tapeoffset")]
    pub tape_offset: Option<i64>,
    #[serde(rename = "headposition")]
    pub head_position: Option<i64>,
    pub steps: Option<usize>,
    /// Host-supplied initial tape text, as typed (head marker included).
    #[serde(rename = "initialtape")]
    pub initial_tape: Option<String>,
    #[serde(rename = "initialstate")]
    pub initial_state: Option<String>,
    /// Host UI preference carried through save/load untouched.
    #[serde(rename = "fullspeed")]
    pub full_speed: Option<bool>,
    /// Variant code, see [`Variant::code`].
    pub variant: Option<u8>,
    pub version: Option<u32>,
}

/// Everything a host gets back from [`Snapshot::restore`].
pub struct Restored {
    pub machine: Machine,
    /// Diagnostics from recompiling the embedded program.
    pub diagnostics: Vec<Diagnostic>,
    /// Non-fatal oddities found in the record itself.
    pub warnings: Vec<String>,
    pub program: String,
    pub initial_tape: String,
    pub initial_state: String,
    pub full_speed: bool,
}

impl Snapshot {
    /// Captures the machine and its host inputs into a complete record.
    pub fn capture(
        machine: &Machine,
        program: &str,
        initial_tape: &str,
        initial_state: &str,
        full_speed: bool,
    ) -> Self {
        Self {
            program: Some(program.to_string()),
            state: Some(machine.state().to_string()),
            tape: Some(machine.tape().contents()),
            tape_offset: Some(machine.tape().offset()),
            head_position: Some(machine.head_position()),
            steps: Some(machine.steps()),
            initial_tape: Some(initial_tape.to_string()),
            initial_state: Some(initial_state.to_string()),
            full_speed: Some(full_speed),
            variant: Some(machine.variant().code()),
            version: Some(SNAPSHOT_VERSION),
        }
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string(self).map_err(|e| EngineError::Snapshot(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::Snapshot(e.to_string()))
    }

    /// Rebuilds a machine from this record.
    ///
    /// The embedded program is recompiled from scratch, and the undo log
    /// starts empty: deltas from before the save would reference stale
    /// instruction lines.
    pub fn restore(&self) -> Restored {
        let mut warnings = Vec::new();

        if let Some(version) = self.version {
            if version != SNAPSHOT_VERSION {
                warnings.push(format!("saved machine has unknown version number {version}"));
            }
        }

        let variant = match self.variant {
            None => Variant::default(),
            Some(code) => Variant::from_code(code).unwrap_or_else(|| {
                warnings.push(format!("unknown variant code {code}, assuming standard"));
                Variant::default()
            }),
        };

        let program = self.program.clone().unwrap_or_default();
        let compilation = compile(&program, variant);

        let tape = Tape::from_content(
            self.tape.as_deref().unwrap_or("_"),
            self.tape_offset.unwrap_or(0),
        );
        let state = self
            .state
            .clone()
            .unwrap_or_else(|| DEFAULT_STATE.to_string());

        let machine = Machine::from_parts(
            compilation.table,
            variant,
            tape,
            state,
            self.head_position.unwrap_or(0),
            self.steps.unwrap_or(0),
        );

        Restored {
            machine,
            diagnostics: compilation.diagnostics,
            warnings,
            program,
            initial_tape: self.initial_tape.clone().unwrap_or_default(),
            initial_state: self.initial_state.clone().unwrap_or_default(),
            full_speed: self.full_speed.unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HaltCause, StepResult};

    const PROGRAM: &str = "0 1 0 r 0\n0 _ _ * halt";

    fn running_machine() -> Machine {
        let compilation = compile(PROGRAM, Variant::Standard);
        let mut machine = Machine::new(compilation.table, Variant::Standard);
        machine.reset("111", "0");
        machine.step();
        machine.step();
        machine
    }

    #[test]
    fn test_capture_fills_every_field() {
        let machine = running_machine();
        let snapshot = Snapshot::capture(&machine, PROGRAM, "111", "0", true);

        assert_eq!(snapshot.program.as_deref(), Some(PROGRAM));
        assert_eq!(snapshot.state.as_deref(), Some("0"));
        assert_eq!(snapshot.tape.as_deref(), Some("001"));
        assert_eq!(snapshot.tape_offset, Some(0));
        assert_eq!(snapshot.head_position, Some(2));
        assert_eq!(snapshot.steps, Some(2));
        assert_eq!(snapshot.initial_tape.as_deref(), Some("111"));
        assert_eq!(snapshot.initial_state.as_deref(), Some("0"));
        assert_eq!(snapshot.full_speed, Some(true));
        assert_eq!(snapshot.variant, Some(0));
        assert_eq!(snapshot.version, Some(SNAPSHOT_VERSION));
    }

    #[test]
    fn test_json_field_names_are_stable() {
        let machine = running_machine();
        let json = Snapshot::capture(&machine, PROGRAM, "111", "0", false)
            .to_json()
            .unwrap();
        for key in [
            "\"program\"",
            "\"state\"",
            "\"tape\"",
            "\"tapeoffset\"",
            "\"headposition\"",
            "\"steps\"",
            "\"initialtape\"",
            "\"initialstate\"",
            "\"fullspeed\"",
            "\"variant\"",
            "\"version\"",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }

    #[test]
    fn test_restore_round_trip_continues_execution() {
        let machine = running_machine();
        let snapshot = Snapshot::capture(&machine, PROGRAM, "111", "0", false);

        let json = snapshot.to_json().unwrap();
        let restored = Snapshot::from_json(&json).unwrap().restore();
        assert!(restored.warnings.is_empty());
        assert!(restored.diagnostics.is_empty());
        assert_eq!(restored.program, PROGRAM);
        assert_eq!(restored.initial_tape, "111");

        let mut machine = restored.machine;
        assert_eq!(machine.state(), "0");
        assert_eq!(machine.head_position(), 2);
        assert_eq!(machine.steps(), 2);
        // The restored machine picks up where the original left off.
        assert_eq!(machine.step(), StepResult::Continue);
        assert_eq!(machine.step(), StepResult::Halted(HaltCause::HaltState));
        assert_eq!(machine.tape().contents(), "000_");
    }

    #[test]
    fn test_restore_starts_with_empty_undo_log() {
        let machine = running_machine();
        let restored = Snapshot::capture(&machine, PROGRAM, "111", "0", false).restore();
        assert_eq!(restored.machine.undo_depth(), 0);
    }

    #[test]
    fn test_partial_load_falls_back_to_defaults() {
        let snapshot = Snapshot::from_json(r#"{"tape":"abc","state":"q"}"#).unwrap();
        let restored = snapshot.restore();

        assert!(restored.warnings.is_empty());
        assert_eq!(restored.machine.state(), "q");
        assert_eq!(restored.machine.head_position(), 0);
        assert_eq!(restored.machine.steps(), 0);
        assert_eq!(restored.machine.variant(), Variant::Standard);
        assert_eq!(restored.machine.tape().contents(), "abc");
        assert_eq!(restored.program, "");
        assert!(!restored.full_speed);
    }

    #[test]
    fn test_unknown_version_is_flagged_not_rejected() {
        let snapshot = Snapshot::from_json(r#"{"version":7}"#).unwrap();
        let restored = snapshot.restore();
        assert_eq!(restored.warnings.len(), 1);
        assert!(restored.warnings[0].contains("unknown version number 7"));
    }

    #[test]
    fn test_unknown_variant_code_is_flagged() {
        let snapshot = Snapshot::from_json(r#"{"variant":9}"#).unwrap();
        let restored = snapshot.restore();
        assert_eq!(restored.machine.variant(), Variant::Standard);
        assert!(restored.warnings[0].contains("unknown variant code 9"));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            Snapshot::from_json("not json"),
            Err(EngineError::Snapshot(_))
        ));
    }

    #[test]
    fn test_negative_tape_offset_survives() {
        let compilation = compile("0 * * l 0", Variant::Standard);
        let mut machine = Machine::new(compilation.table, Variant::Standard);
        machine.reset("abc", "0");
        machine.step();
        machine.step();
        assert_eq!(machine.tape().offset(), -1);

        let restored = Snapshot::capture(&machine, "0 * * l 0", "abc", "0", false).restore();
        assert_eq!(restored.machine.tape().offset(), -1);
        assert_eq!(restored.machine.head_position(), -2);
    }
}
