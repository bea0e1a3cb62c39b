//! This module defines the core data structures and types used throughout the simulator,
//! including states, transitions, execution results, capacity limits and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// Write symbol meaning "leave the cell under the head unchanged".
pub const NO_WRITE_SYMBOL: char = '\\';
/// Symbol used to pad an initial tape that is shorter than the requested length.
pub const DEFAULT_BLANK_SYMBOL: char = '_';
/// State names longer than this many characters are truncated.
pub const MAX_STATE_NAME_LEN: usize = 14;
/// State capacity of the classic fixed-size machine, including `accept` and `reject`.
pub const CLASSIC_MAX_STATES: usize = 25;
/// Per-state transition capacity of the classic fixed-size machine.
pub const CLASSIC_MAX_TRANSITIONS: usize = 5;
/// The maximum allowed size for a machine definition in bytes.
pub const MAX_DEFINITION_SIZE: usize = 65536; // 64KB
/// Name of the distinguished accepting state.
pub const ACCEPT_STATE: &str = "accept";
/// Name of the distinguished rejecting state.
pub const REJECT_STATE: &str = "reject";

/// Stable index of a [`State`] inside its owning machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

impl StateId {
    /// Returns the insertion position of the state.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether a state halts the machine, and how.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateKind {
    /// Ordinary state, execution continues.
    #[default]
    Plain,
    /// Reaching this state accepts the input.
    Accepting,
    /// Reaching this state rejects the input.
    Rejecting,
}

/// A named node of the control graph. Owns its outgoing transitions in definition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    pub kind: StateKind,
    pub transitions: Vec<Transition>,
}

impl State {
    pub fn new(name: impl Into<String>, kind: StateKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transitions: Vec::new(),
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.kind == StateKind::Accepting
    }

    pub fn is_rejecting(&self) -> bool {
        self.kind == StateKind::Rejecting
    }

    /// Accepting or rejecting.
    pub fn is_terminal(&self) -> bool {
        self.kind != StateKind::Plain
    }
}

/// A single deterministic rule `(from, input) -> (to, write, direction)`.
///
/// Both ends are keys into the owning machine's state arena; the transition
/// never owns the states it connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
    pub input: char,
    pub write: Write,
    pub direction: Direction,
}

/// What a transition does to the cell under the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Write {
    /// Replace the cell with this symbol.
    Symbol(char),
    /// Leave the cell as it is.
    Keep,
}

impl Write {
    /// Maps a definition symbol to a write, treating [`NO_WRITE_SYMBOL`] as [`Write::Keep`].
    pub fn from_symbol(symbol: char) -> Self {
        if symbol == NO_WRITE_SYMBOL {
            Write::Keep
        } else {
            Write::Symbol(symbol)
        }
    }

    /// The symbol used for this write in definition text.
    pub fn symbol(self) -> char {
        match self {
            Write::Symbol(c) => c,
            Write::Keep => NO_WRITE_SYMBOL,
        }
    }
}

/// Represents the possible directions the head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left, stopping at cell 0.
    Left,
    /// Move the head one position to the right. Walking off the tape is fatal.
    Right,
}

impl Direction {
    pub fn symbol(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The machine moved into a plain state and continues execution.
    Continue,
    /// The machine stopped.
    Halt(Halt),
}

/// Why the machine stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    /// Reached an accepting state with the given name.
    Accept(String),
    /// Reached a rejecting state with the given name, possibly through an undefined transition.
    Reject(String),
    /// Fatal halt.
    Err(MachineError),
}

impl Halt {
    /// `true` for accept and reject, `false` for a fatal halt.
    pub fn is_normal(&self) -> bool {
        !matches!(self, Halt::Err(_))
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::Accept(state) => write!(f, "Input accepted in state: {state}"),
            Halt::Reject(state) => write!(f, "Input rejected in state: {state}"),
            Halt::Err(e) => write!(f, "Machine error: {e}"),
        }
    }
}

/// Capacity limits applied while building a machine and running it.
///
/// `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum number of states, counting `accept` and `reject`.
    pub max_states: Option<usize>,
    /// Maximum number of transitions per state.
    pub max_transitions: Option<usize>,
    /// Names longer than this are truncated.
    pub max_name_len: Option<usize>,
    /// Maximum number of steps `run` executes before giving up.
    pub max_steps: Option<usize>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_states: None,
            max_transitions: None,
            max_name_len: Some(MAX_STATE_NAME_LEN),
            max_steps: None,
        }
    }
}

impl Limits {
    /// The fixed-capacity machine: 25 states, 5 transitions per state, 14 character names.
    pub fn classic() -> Self {
        Self {
            max_states: Some(CLASSIC_MAX_STATES),
            max_transitions: Some(CLASSIC_MAX_TRANSITIONS),
            ..Self::default()
        }
    }

    /// Shortens `name` to `max_name_len` characters.
    pub fn truncate<'a>(&self, name: &'a str) -> &'a str {
        match self.max_name_len {
            Some(max) => match name.char_indices().nth(max) {
                Some((idx, _)) => &name[..idx],
                None => name,
            },
            None => name,
        }
    }
}

/// Represents various errors that can occur while building or running a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    /// Malformed definition text: bad line shape, unknown state reference, bad mode or direction.
    #[error("Definition parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// A state or transition count exceeded its configured capacity.
    #[error("Resource limit exceeded: {0}")]
    ResourceLimit(String),
    /// The definition cannot produce a runnable machine.
    #[error("Machine construction error: {0}")]
    ConstructionError(String),
    /// Memory for states or transitions could not be reserved.
    #[error("Allocation error: {0}")]
    AllocationError(String),
    /// The head attempted to move past the right edge of the tape.
    #[error("Machine walked off tape on right side at position {0}")]
    TapeBoundary(usize),
    /// `run` or `step` was called before a current state was set.
    #[error("Machine has no current state")]
    NotStarted,
    /// The configured step limit was reached before the machine halted.
    #[error("Machine did not halt within {0} steps")]
    StepLimit(usize),
    /// A state id that does not belong to this machine.
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// Indicates an error related to file system operations, such as reading definition files.
    #[error("File error: {0}")]
    FileError(String),
}
