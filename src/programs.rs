//! Embedded demo programs, compiled once into a shared registry.

use std::sync::RwLock;

use crate::loader::ProgramLoader;
use crate::types::{EngineError, Variant};

// Default embedded programs
const DEMO_SOURCES: [(&str, &str); 4] = [
    (
        "binary-increment",
        include_str!("../demos/binary-increment.tm"),
    ),
    ("bit-flipper", include_str!("../demos/bit-flipper.tm")),
    ("busy-beaver-3", include_str!("../demos/busy-beaver-3.tm")),
    ("unary-addition", include_str!("../demos/unary-addition.tm")),
];

/// A named demo program ready to hand to a host.
#[derive(Debug, Clone)]
pub struct Demo {
    pub name: &'static str,
    pub source: &'static str,
    /// Initial tape text suggested by the program's directive, or empty.
    pub initial_tape: String,
}

lazy_static::lazy_static! {
    pub static ref DEMOS: RwLock<Vec<Demo>> = RwLock::new(Vec::new());
}

pub struct DemoLibrary;

impl DemoLibrary {
    /// Fills the registry from the embedded sources. Demos with syntax
    /// errors are skipped.
    pub fn load() -> Result<(), EngineError> {
        let mut demos = Vec::new();

        for (name, source) in DEMO_SOURCES {
            let loaded = ProgramLoader::from_source(source.to_string(), Variant::Standard);
            if loaded.compilation.has_errors() {
                eprintln!("failed to compile demo program '{name}'");
                continue;
            }
            demos.push(Demo {
                name,
                source,
                initial_tape: loaded.initial_tape.unwrap_or_default(),
            });
        }

        if let Ok(mut write_guard) = DEMOS.write() {
            *write_guard = demos;
        } else {
            return Err(EngineError::File(
                "failed to acquire write lock".to_string(),
            ));
        }

        Ok(())
    }

    /// Number of available demo programs.
    pub fn count() -> usize {
        let _ = Self::load();

        DEMOS.read().map(|demos| demos.len()).unwrap_or(0)
    }

    /// Fetches a demo by its index.
    pub fn get(index: usize) -> Result<Demo, EngineError> {
        let _ = Self::load();

        DEMOS
            .read()
            .map_err(|_| EngineError::File("failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| EngineError::UnknownProgram(format!("index {index} out of range")))
    }

    /// Fetches a demo by its exact name.
    pub fn find(name: &str) -> Result<Demo, EngineError> {
        let _ = Self::load();

        DEMOS
            .read()
            .map_err(|_| EngineError::File("failed to acquire read lock".to_string()))?
            .iter()
            .find(|demo| demo.name == name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownProgram(name.to_string()))
    }

    /// Names of all demo programs.
    pub fn names() -> Vec<String> {
        let _ = Self::load();

        DEMOS
            .read()
            .map(|demos| demos.iter().map(|demo| demo.name.to_string()).collect())
            .unwrap_or_default()
    }
}
