//! This module provides the `DefinitionLoader` struct, responsible for loading machine
//! definitions from various sources, including files, readers and strings.

use crate::machine::Machine;
use crate::parser::parse_with_limits;
use crate::types::{Limits, MachineError, MAX_DEFINITION_SIZE};
use std::fs;
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

/// `DefinitionLoader` is a utility struct for loading machine definitions.
/// It provides methods to load definitions from individual files, from any line-oriented
/// reader, and from string content.
pub struct DefinitionLoader;

impl DefinitionLoader {
    /// Loads a single machine from the specified file path using the default limits.
    ///
    /// # Returns
    ///
    /// * `Ok(Machine)` if the file is successfully read and parsed.
    /// * `Err(MachineError::FileError)` if the file cannot be read or is too large.
    /// * `Err(MachineError::ParseError)` if the file content is not a valid definition.
    pub fn load_definition(path: &Path) -> Result<Machine, MachineError> {
        Self::load_definition_with_limits(path, Limits::default())
    }

    /// Loads a single machine from the specified file path, enforcing `limits`.
    pub fn load_definition_with_limits(
        path: &Path,
        limits: Limits,
    ) -> Result<Machine, MachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            MachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), bytes = content.len(), "loading definition");
        Self::load_from_string(&content, limits)
    }

    /// Loads a machine from any line-oriented source, such as a locked stdin.
    pub fn load_from_reader<R: BufRead>(reader: R, limits: Limits) -> Result<Machine, MachineError> {
        let mut content = String::new();

        for line in reader.lines() {
            let line = line
                .map_err(|e| MachineError::FileError(format!("Failed to read definition: {e}")))?;
            content.push_str(&line);
            content.push('\n');
            check_size(content.len())?;
        }

        parse_with_limits(&content, limits)
    }

    /// Loads a machine from the provided string content.
    ///
    /// This is useful for parsing definitions that are not stored in files, e.g., from user input.
    pub fn load_from_string(content: &str, limits: Limits) -> Result<Machine, MachineError> {
        check_size(content.len())?;
        parse_with_limits(content, limits)
    }
}

fn check_size(len: usize) -> Result<(), MachineError> {
    if len > MAX_DEFINITION_SIZE {
        return Err(MachineError::FileError(format!(
            "Definition is larger than {MAX_DEFINITION_SIZE} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;

    const VALID: &str = "# test\n1\nq0\nq0 0 -> accept 1 R\n";

    #[test]
    fn test_load_valid_definition() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.tm");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let machine = DefinitionLoader::load_definition(&file_path).unwrap();
        assert_eq!(machine.current_name(), Some("q0"));
        assert_eq!(machine.transition_count(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = DefinitionLoader::load_definition(&dir.path().join("nope.tm"));
        assert!(matches!(result, Err(MachineError::FileError(_))));
    }

    #[test]
    fn test_load_invalid_definition() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.tm");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"This is not a valid definition").unwrap();

        let result = DefinitionLoader::load_definition(&file_path);
        assert!(matches!(result, Err(MachineError::ParseError(_))));
    }

    #[test]
    fn test_load_from_reader() {
        let reader = Cursor::new(VALID.as_bytes());
        let machine = DefinitionLoader::load_from_reader(reader, Limits::default()).unwrap();
        assert_eq!(machine.user_states().len(), 1);
    }

    #[test]
    fn test_load_oversized_definition() {
        let content = format!("1\nq0\n{}", "# padding\n".repeat(MAX_DEFINITION_SIZE / 10 + 1));
        let result = DefinitionLoader::load_from_string(&content, Limits::default());
        assert!(matches!(result, Err(MachineError::FileError(_))));
    }

    #[test]
    fn test_load_definition_with_limits() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("two.tm");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"2\nq0\nq1\nq0 0 -> q1 0 R\n").unwrap();

        let limits = Limits {
            max_states: Some(3),
            ..Limits::default()
        };
        let result = DefinitionLoader::load_definition_with_limits(&file_path, limits);
        assert!(matches!(result, Err(MachineError::ResourceLimit(_))));
    }
}
