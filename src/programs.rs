//! Built-in machine definitions, embedded at compile time and parsed on first use.

use crate::machine::Machine;
use crate::parser::parse;
use crate::types::MachineError;

use std::sync::RwLock;
use tracing::warn;

// Default embedded definitions
const PROGRAM_TEXTS: [(&str, &str); 3] = [
    (
        "binary-increment",
        include_str!("../machines/binary-increment.tm"),
    ),
    ("even-zeros", include_str!("../machines/even-zeros.tm")),
    ("unary-parity", include_str!("../machines/unary-parity.tm")),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: RwLock<Vec<ProgramInfo>> = RwLock::new(Vec::new());
}

/// A built-in machine together with the text it was parsed from.
#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub name: String,
    /// First comment line of the definition.
    pub description: String,
    pub source: &'static str,
    pub machine: Machine,
}

pub struct Catalog;

impl Catalog {
    /// Parses the embedded definitions into the registry, once.
    pub fn load() -> Result<(), MachineError> {
        let mut write_guard = PROGRAMS
            .write()
            .map_err(|_| MachineError::FileError("Failed to acquire write lock".to_string()))?;

        if !write_guard.is_empty() {
            return Ok(());
        }

        for (name, source) in PROGRAM_TEXTS {
            match parse(source) {
                Ok(machine) => write_guard.push(ProgramInfo {
                    name: name.to_string(),
                    description: describe(source),
                    source,
                    machine,
                }),
                Err(e) => warn!(program = name, error = %e, "failed to parse built-in program"),
            }
        }

        Ok(())
    }

    /// Get the number of available programs
    pub fn count() -> usize {
        let _ = Self::load();

        PROGRAMS.read().map(|programs| programs.len()).unwrap_or(0)
    }

    /// Names of all available programs, in catalog order.
    pub fn names() -> Vec<String> {
        let _ = Self::load();

        PROGRAMS
            .read()
            .map(|programs| programs.iter().map(|p| p.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Get a program by its index
    pub fn get_by_index(index: usize) -> Result<ProgramInfo, MachineError> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| MachineError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| MachineError::FileError(format!("Program index {} out of range", index)))
    }

    /// Get a program by its name
    pub fn get_by_name(name: &str) -> Result<ProgramInfo, MachineError> {
        Self::load()?;

        PROGRAMS
            .read()
            .map_err(|_| MachineError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| MachineError::FileError(format!("Program '{}' not found", name)))
    }
}

/// Extracts the first comment line of a definition.
fn describe(source: &str) -> String {
    source
        .lines()
        .find_map(|line| line.strip_prefix('#'))
        .map(|line| line.trim().to_string())
        .unwrap_or_default()
}
