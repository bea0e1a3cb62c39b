//! This module provides functions for analyzing parsed machines to detect definitions that are
//! legal but probably not what the author meant. Findings never change how a machine runs.

use crate::machine::Machine;
use crate::types::StateId;
use std::collections::HashSet;
use std::fmt;

/// Represents the issues that can be found during the analysis of a machine.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Finding {
    /// A transition that can never fire because an earlier one in the same state reads the
    /// same symbol.
    ShadowedTransition { state: String, input: char },
    /// Transitions leaving an accepting or rejecting state; the machine halts before using them.
    TerminalTransitions(String),
    /// A plain state with no transitions, so every input rejects there.
    DeadEndState(String),
    /// User states that cannot be reached from the start state.
    UnreachableStates(Vec<String>),
    /// No accepting state is reachable from the start state.
    AcceptUnreachable,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::ShadowedTransition { state, input } => write!(
                f,
                "Transition on '{input}' in state {state} is shadowed by an earlier one"
            ),
            Finding::TerminalTransitions(state) => {
                write!(f, "Terminal state {state} has transitions that never run")
            }
            Finding::DeadEndState(state) => {
                write!(f, "State {state} has no transitions and always rejects")
            }
            Finding::UnreachableStates(states) => {
                write!(f, "Unreachable states detected: {states:?}")
            }
            Finding::AcceptUnreachable => {
                write!(f, "No accepting state is reachable from the start state")
            }
        }
    }
}

/// Analyzes a machine and returns every finding, in a stable order.
///
/// # Arguments
///
/// * `machine` - A reference to the `Machine` to be analyzed.
///
/// # Returns
///
/// * An empty vector if nothing suspicious was found.
pub fn analyze(machine: &Machine) -> Vec<Finding> {
    let mut findings = Vec::new();

    findings.extend(check_shadowed_transitions(machine));
    findings.extend(check_terminal_transitions(machine));
    findings.extend(check_dead_ends(machine));
    findings.extend(check_reachability(machine));

    findings
}

/// Finds transitions whose input was already claimed by an earlier transition of the same state.
fn check_shadowed_transitions(machine: &Machine) -> Vec<Finding> {
    let mut findings = Vec::new();

    for state in machine.states() {
        let mut seen = HashSet::new();
        for transition in &state.transitions {
            if !seen.insert(transition.input) {
                findings.push(Finding::ShadowedTransition {
                    state: state.name.clone(),
                    input: transition.input,
                });
            }
        }
    }

    findings
}

/// A terminal start state still takes its first step, so only other terminal states count.
fn check_terminal_transitions(machine: &Machine) -> Vec<Finding> {
    let start = machine.start().map(|id| id.index());

    machine
        .states()
        .iter()
        .enumerate()
        .filter(|&(i, s)| Some(i) != start && s.is_terminal() && !s.transitions.is_empty())
        .map(|(_, s)| Finding::TerminalTransitions(s.name.clone()))
        .collect()
}

fn check_dead_ends(machine: &Machine) -> Vec<Finding> {
    machine
        .user_states()
        .iter()
        .filter(|s| !s.is_terminal() && s.transitions.is_empty())
        .map(|s| Finding::DeadEndState(s.name.clone()))
        .collect()
}

/// Walks the graph from the start state, stopping at terminal states other than the start.
fn check_reachability(machine: &Machine) -> Vec<Finding> {
    let Some(start) = machine.start() else {
        return Vec::new();
    };

    let reachable = reachable_from(machine, start);
    let mut findings = Vec::new();

    let unreachable: Vec<String> = machine
        .states()
        .iter()
        .enumerate()
        .skip(2)
        .filter(|(i, _)| !reachable.contains(i))
        .map(|(_, s)| s.name.clone())
        .collect();

    if !unreachable.is_empty() {
        findings.push(Finding::UnreachableStates(unreachable));
    }

    // Accepting means entering an accepting state, which a terminal start never does at step 0
    let states = machine.states();
    let accepts = reachable
        .iter()
        .filter(|&&i| i == start.index() || !states[i].is_terminal())
        .flat_map(|&i| &states[i].transitions)
        .any(|t| states[t.to.index()].is_accepting());
    if !accepts {
        findings.push(Finding::AcceptUnreachable);
    }

    findings
}

fn reachable_from(machine: &Machine, start: StateId) -> HashSet<usize> {
    let mut reachable = HashSet::new();
    let mut queue = vec![start];

    while let Some(id) = queue.pop() {
        if !reachable.insert(id.index()) {
            continue;
        }

        let state = machine.state(id);
        if state.is_terminal() && id != start {
            continue;
        }

        queue.extend(state.transitions.iter().map(|t| t.to));
    }

    reachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_clean_machine_has_no_findings() {
        let machine = parse("2\nq0\nq1\nq0 0 -> q1 0 R\nq1 0 -> accept 0 L\n").unwrap();
        assert!(analyze(&machine).is_empty());
    }

    #[test]
    fn test_shadowed_transition() {
        let machine = parse("1\nx\nx a -> accept a R\nx a -> reject a R\n").unwrap();
        assert_eq!(
            analyze(&machine),
            vec![Finding::ShadowedTransition {
                state: "x".into(),
                input: 'a'
            }]
        );
    }

    #[test]
    fn test_dead_end_and_unreachable() {
        let machine = parse("3\nq0\nq1\nlost\nq0 0 -> q1 0 R\nq0 1 -> accept 1 R\n").unwrap();
        let findings = analyze(&machine);

        assert!(findings.contains(&Finding::DeadEndState("q1".into())));
        assert!(findings.contains(&Finding::DeadEndState("lost".into())));
        assert!(findings.contains(&Finding::UnreachableStates(vec!["lost".into()])));
        assert!(!findings.contains(&Finding::AcceptUnreachable));
    }

    #[test]
    fn test_accept_unreachable() {
        let machine = parse("1\nq0\nq0 0 -> q0 0 R\n").unwrap();
        assert_eq!(analyze(&machine), vec![Finding::AcceptUnreachable]);
    }

    #[test]
    fn test_user_accepting_state_counts_as_accept() {
        let machine = parse("2\nq0\nyes A\nq0 0 -> yes 0 R\n").unwrap();
        assert!(analyze(&machine).is_empty());
    }

    #[test]
    fn test_terminal_transitions() {
        let machine = parse("2\nq0\nyes A\nq0 0 -> yes 0 R\nyes 0 -> q0 0 R\n").unwrap();
        assert_eq!(
            analyze(&machine),
            vec![Finding::TerminalTransitions("yes".into())]
        );
    }

    #[test]
    fn test_terminal_start_state_is_walked() {
        let machine = parse("2\nq0 A\nq1\nq0 0 -> q1 0 R\nq1 0 -> accept 0 R\n").unwrap();
        assert!(analyze(&machine).is_empty());
    }

    #[test]
    fn test_accepting_start_state_alone_never_accepts() {
        let machine = parse("1\nq0 A\nq0 0 -> reject 0 R\n").unwrap();
        assert_eq!(analyze(&machine), vec![Finding::AcceptUnreachable]);
    }
}
