//! This module renders a `Machine` back into definition text.
//!
//! The output is canonical: no comments, one state per line in declaration order, then every
//! transition grouped by source state in definition order. Parsing the output yields a machine
//! with the same states, transitions and start state.

use crate::machine::Machine;
use crate::types::{State, StateKind, Transition};
use std::fmt::Write as _;

/// Encodes a machine as definition text.
///
/// # Arguments
///
/// * `machine` - The machine to encode.
///
/// # Returns
///
/// * `String` - The definition, ending with a newline.
pub fn encode(machine: &Machine) -> String {
    let mut out = String::new();
    let user_states = machine.user_states();

    let _ = writeln!(out, "{}", user_states.len());
    for state in user_states {
        out.push_str(&encode_state(state));
        out.push('\n');
    }

    for state in machine.states() {
        for transition in &state.transitions {
            out.push_str(&encode_transition(machine, transition));
            out.push('\n');
        }
    }

    out
}

/// Encodes a state declaration: `<name> [A|R]`.
fn encode_state(state: &State) -> String {
    match state.kind {
        StateKind::Plain => state.name.clone(),
        StateKind::Accepting => format!("{} A", state.name),
        StateKind::Rejecting => format!("{} R", state.name),
    }
}

/// Encodes a transition: `<from> <input> -> <to> <write> <direction>`.
fn encode_transition(machine: &Machine, transition: &Transition) -> String {
    format!(
        "{} {} -> {} {} {}",
        machine.state(transition.from).name,
        transition.input,
        machine.state(transition.to).name,
        transition.write.symbol(),
        transition.direction.symbol()
    )
}
