//! Loading rule programs from files and strings.

use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::compiler::{compile, Compilation};
use crate::types::{EngineError, Variant};

lazy_static! {
    /// `; ... $INITIAL_TAPE: <text>` carries a program's suggested input.
    static ref INITIAL_TAPE_DIRECTIVE: Regex =
        Regex::new(r";.*\$INITIAL_TAPE:? *(.+)").unwrap();
}

/// A program source together with its compilation and any metadata pulled
/// from directives in the source.
#[derive(Debug, Clone)]
pub struct LoadedProgram {
    pub source: String,
    /// Initial tape text suggested by a `$INITIAL_TAPE:` directive, if any.
    /// May contain a `*` head marker like any host-supplied tape text.
    pub initial_tape: Option<String>,
    pub compilation: Compilation,
}

/// Utility for turning files and strings into [`LoadedProgram`]s.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Reads and compiles a program file.
    ///
    /// Only IO failures are errors; a source full of bad lines still loads,
    /// with the problems reported in `compilation.diagnostics`.
    pub fn load(path: &Path, variant: Variant) -> Result<LoadedProgram, EngineError> {
        let source = fs::read_to_string(path).map_err(|e| {
            EngineError::File(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::from_source(source, variant))
    }

    /// Compiles program text supplied directly by the host.
    pub fn from_source(source: String, variant: Variant) -> LoadedProgram {
        let initial_tape = INITIAL_TAPE_DIRECTIVE
            .captures(&source)
            .map(|captures| captures[1].to_string());
        let compilation = compile(&source, variant);
        LoadedProgram {
            source,
            initial_tape,
            compilation,
        }
    }

    /// Loads every `.tm` file in a directory.
    ///
    /// Directories and files with other extensions are skipped. Each file
    /// gets its own result, so one unreadable file does not hide the rest.
    pub fn load_all(
        directory: &Path,
        variant: Variant,
    ) -> Vec<Result<(PathBuf, LoadedProgram), EngineError>> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(EngineError::File(format!(
                    "failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(EngineError::File(format!(
                            "failed to read directory entry: {e}"
                        ))))
                    }
                };

                let path = entry.path();
                if path.is_dir() || path.extension().map_or(true, |ext| ext != "tm") {
                    return None;
                }

                match Self::load(&path, variant) {
                    Ok(loaded) => Some(Ok((path, loaded))),
                    Err(e) => Some(Err(e)),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_valid_program_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.tm");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"0 1 1 r 0\n0 _ _ * halt\n").unwrap();

        let loaded = ProgramLoader::load(&path, Variant::Standard).unwrap();
        assert!(loaded.compilation.diagnostics.is_empty());
        assert_eq!(loaded.compilation.table.len(), 2);
        assert_eq!(loaded.initial_tape, None);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = ProgramLoader::load(&dir.path().join("absent.tm"), Variant::Standard);
        assert!(matches!(result, Err(EngineError::File(_))));
    }

    #[test]
    fn test_bad_lines_load_with_diagnostics() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.tm");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"not a rule line at all extra\n0 a b r halt\n")
            .unwrap();

        let loaded = ProgramLoader::load(&path, Variant::Standard).unwrap();
        assert_eq!(loaded.compilation.diagnostics.len(), 1);
        assert_eq!(loaded.compilation.table.len(), 1);
    }

    #[test]
    fn test_load_all_skips_other_extensions() {
        let dir = tempdir().unwrap();

        let mut program = File::create(dir.path().join("flip.tm")).unwrap();
        program.write_all(b"0 1 0 r 0\n0 _ _ * halt\n").unwrap();

        let mut ignored = File::create(dir.path().join("notes.txt")).unwrap();
        ignored.write_all(b"not a program").unwrap();

        let results = ProgramLoader::load_all(dir.path(), Variant::Standard);
        assert_eq!(results.len(), 1);
        let (path, loaded) = results[0].as_ref().unwrap();
        assert_eq!(path.file_name().unwrap(), "flip.tm");
        assert_eq!(loaded.compilation.table.len(), 2);
    }

    #[test]
    fn test_load_all_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let results = ProgramLoader::load_all(&dir.path().join("absent"), Variant::Standard);
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(EngineError::File(_))));
    }

    #[test]
    fn test_initial_tape_directive_extracted() {
        let source = "; example\n; $INITIAL_TAPE: 10*11\n0 1 1 r halt\n".to_string();
        let loaded = ProgramLoader::from_source(source, Variant::Standard);
        assert_eq!(loaded.initial_tape.as_deref(), Some("10*11"));
    }

    #[test]
    fn test_initial_tape_directive_without_colon() {
        let source = "; $INITIAL_TAPE 111\n".to_string();
        let loaded = ProgramLoader::from_source(source, Variant::Standard);
        assert_eq!(loaded.initial_tape.as_deref(), Some("111"));
    }
}
