//! This crate provides the core logic for a deterministic single-tape Turing machine simulator.
//! It includes modules for parsing machine definitions, executing machines step by step over a
//! fixed-length tape, reporting their progress, linting definitions, and a small catalog of
//! built-in machines.

pub mod analyzer;
pub mod encoder;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod report;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `Finding` enum from the analyzer module.
pub use analyzer::{analyze, Finding};
/// Re-exports the `encode` function from the encoder module.
pub use encoder::encode;
/// Re-exports the `DefinitionLoader` struct from the loader module.
pub use loader::DefinitionLoader;
/// Re-exports the `Machine` struct and tape helper from the machine module.
pub use machine::{tape_from, Machine};
/// Re-exports the parse functions from the parser module.
pub use parser::{parse, parse_with_limits};
/// Re-exports `ProgramInfo`, `Catalog`, and `PROGRAMS` from the programs module.
pub use programs::{Catalog, ProgramInfo, PROGRAMS};
/// Re-exports the reporting sinks.
pub use report::{Reporter, RunReport, Silent, TraceReporter};
/// Re-exports the core types from the types module.
pub use types::{
    Direction, Halt, Limits, MachineError, State, StateId, StateKind, Step, Transition, Write,
    MAX_DEFINITION_SIZE, NO_WRITE_SYMBOL,
};
