//! This module defines the `Machine` struct: the arena that owns every state and transition,
//! and the execution engine that steps it over a borrowed tape.

use crate::report::Reporter;
use crate::types::{
    Direction, Halt, Limits, MachineError, State, StateId, StateKind, Step, Transition, Write,
    ACCEPT_STATE, REJECT_STATE,
};
use tracing::{debug, info};

const ACCEPT_ID: StateId = StateId(0);
const REJECT_ID: StateId = StateId(1);

/// A deterministic single-tape Turing machine.
///
/// States live in an insertion-ordered arena. The distinguished `accept` and `reject`
/// states are always registered first, so user states start at index 2. Transitions
/// refer to states by [`StateId`], which keeps the cyclic control graph free of shared
/// ownership.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    states: Vec<State>,
    start: Option<StateId>,
    current: Option<StateId>,
    head: usize,
    step_count: usize,
    halted: bool,
    limits: Limits,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Creates an empty machine containing only the `accept` and `reject` states.
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Creates an empty machine that enforces the given capacity limits.
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            states: vec![
                State::new(ACCEPT_STATE, StateKind::Accepting),
                State::new(REJECT_STATE, StateKind::Rejecting),
            ],
            start: None,
            current: None,
            head: 0,
            step_count: 0,
            halted: false,
            limits,
        }
    }

    /// Registers a new state and returns its id.
    ///
    /// Names are truncated to the configured maximum length. The caller is responsible for
    /// rejecting duplicate names; [`Machine::find_state`] resolves duplicates to the first one.
    ///
    /// # Returns
    ///
    /// * `Err(MachineError::ResourceLimit)` if the machine is already at `max_states`.
    /// * `Err(MachineError::AllocationError)` if the arena cannot grow.
    pub fn add_state(&mut self, name: &str, kind: StateKind) -> Result<StateId, MachineError> {
        if let Some(max) = self.limits.max_states {
            if self.states.len() >= max {
                return Err(MachineError::ResourceLimit(format!(
                    "The machine already has the maximum amount of states ({max})"
                )));
            }
        }

        self.states
            .try_reserve(1)
            .map_err(|e| MachineError::AllocationError(e.to_string()))?;

        let id = StateId(self.states.len());
        self.states
            .push(State::new(self.limits.truncate(name), kind));

        Ok(id)
    }

    /// Appends a transition to the `from` state's ordered transition list.
    ///
    /// # Returns
    ///
    /// * `Err(MachineError::InvalidState)` if either end does not belong to this machine.
    /// * `Err(MachineError::ResourceLimit)` if `from` is already at `max_transitions`.
    /// * `Err(MachineError::AllocationError)` if the list cannot grow.
    pub fn add_transition(
        &mut self,
        from: StateId,
        input: char,
        to: StateId,
        write: Write,
        direction: Direction,
    ) -> Result<(), MachineError> {
        self.check_id(to)?;
        let max_transitions = self.limits.max_transitions;
        let state = self.state_mut(from)?;

        if let Some(max) = max_transitions {
            if state.transitions.len() >= max {
                return Err(MachineError::ResourceLimit(format!(
                    "State {} already has the maximum amount of transitions ({max})",
                    state.name
                )));
            }
        }

        state
            .transitions
            .try_reserve(1)
            .map_err(|e| MachineError::AllocationError(e.to_string()))?;

        state.transitions.push(Transition {
            from,
            to,
            input,
            write,
            direction,
        });

        Ok(())
    }

    /// Finds the first state with the given name, in insertion order.
    pub fn find_state(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name == name)
            .map(StateId)
    }

    /// Sets the start state and makes it current.
    pub fn set_start(&mut self, id: StateId) -> Result<(), MachineError> {
        self.check_id(id)?;
        self.start = Some(id);
        self.current = Some(id);
        self.halted = false;
        Ok(())
    }

    /// Returns the state with the given id, or `None` if the id belongs to another machine.
    pub fn get_state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.0)
    }

    /// Ids passed here must come from this machine.
    pub(crate) fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    /// Returns all states in insertion order, `accept` and `reject` first.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// User-defined states, i.e. everything after `accept` and `reject`.
    pub fn user_states(&self) -> &[State] {
        &self.states[2..]
    }

    /// The distinguished accepting state.
    pub fn accept(&self) -> StateId {
        ACCEPT_ID
    }

    /// The distinguished rejecting state.
    pub fn reject(&self) -> StateId {
        REJECT_ID
    }

    /// Returns the start state, if one has been set.
    pub fn start(&self) -> Option<StateId> {
        self.start
    }

    /// Returns the state the machine is in, if it has been started.
    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    /// Returns the current state's name, if the machine has been started.
    pub fn current_name(&self) -> Option<&str> {
        self.current.map(|id| self.state(id).name.as_str())
    }

    /// Returns the head position.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Returns the number of steps executed since construction or the last reset.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Returns the limits this machine enforces.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Total number of transitions across all states.
    pub fn transition_count(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }

    /// Restores the start state, head position 0 and step count 0.
    pub fn reset(&mut self) {
        self.current = self.start;
        self.head = 0;
        self.step_count = 0;
        self.halted = false;
    }

    /// Finds the transition the current state would take on `symbol`.
    ///
    /// Transitions are scanned in definition order and the first one whose input matches
    /// wins, so later transitions for the same input are never used.
    pub fn transition(&self, symbol: char) -> Option<&Transition> {
        let current = self.current?;
        self.state(current)
            .transitions
            .iter()
            .find(|t| t.input == symbol)
    }

    /// Executes a single step on `tape`.
    ///
    /// The current state's mode is only consulted after a move, so a start state marked
    /// accepting or rejecting still reads the tape on the first step. Reads the cell under the head, takes the first matching transition, writes (unless the
    /// transition keeps the cell), moves the head and enters the target state. An input with
    /// no matching transition moves the machine into the `reject` state without touching the
    /// tape. Moving left at cell 0 leaves the head at 0. Moving right from the last cell is a
    /// fatal halt that leaves tape, head and state unchanged.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if the machine entered a plain state.
    /// * `Step::Halt(Halt::Accept | Halt::Reject)` if it entered a terminal state.
    /// * `Step::Halt(Halt::Err(_))` on a fatal halt.
    pub fn step(&mut self, tape: &mut [char]) -> Step {
        let Some(current) = self.current else {
            return Step::Halt(Halt::Err(MachineError::NotStarted));
        };

        // Once accepted or rejected, stepping again repeats the verdict
        if self.halted {
            return Step::Halt(self.halt_in(current));
        }

        let Some(&input) = tape.get(self.head) else {
            return Step::Halt(Halt::Err(MachineError::TapeBoundary(self.head)));
        };

        let transition = match self.transition(input).copied() {
            Some(t) => t,
            None => {
                debug!(
                    state = %self.state(current).name,
                    input = %input,
                    "no transition defined, rejecting"
                );
                self.current = Some(REJECT_ID);
                self.step_count += 1;
                self.halted = true;
                return Step::Halt(self.halt_in(REJECT_ID));
            }
        };

        let head = match transition.direction {
            Direction::Left => self.head.saturating_sub(1),
            Direction::Right => {
                if self.head + 1 >= tape.len() {
                    return Step::Halt(Halt::Err(MachineError::TapeBoundary(self.head)));
                }
                self.head + 1
            }
        };

        if let Write::Symbol(symbol) = transition.write {
            tape[self.head] = symbol;
        }

        debug!(
            from = %self.state(current).name,
            to = %self.state(transition.to).name,
            input = %input,
            write = %transition.write.symbol(),
            head,
            "step"
        );

        self.head = head;
        self.current = Some(transition.to);
        self.step_count += 1;

        if self.state(transition.to).is_terminal() {
            self.halted = true;
            Step::Halt(self.halt_in(transition.to))
        } else {
            Step::Continue
        }
    }

    /// Runs the machine until it accepts, rejects or fails.
    ///
    /// `reporter` sees the starting configuration, every configuration after a step into a
    /// plain state, and the final halt. Without a `max_steps` limit a machine that never
    /// halts runs forever.
    pub fn run<R: Reporter + ?Sized>(&mut self, tape: &mut [char], reporter: &mut R) -> Halt {
        if self.current.is_none() {
            let halt = Halt::Err(MachineError::NotStarted);
            reporter.on_halt(self, tape, &halt);
            return halt;
        }

        reporter.on_start(self, tape);

        let halt = loop {
            if let Some(max) = self.limits.max_steps {
                if self.step_count >= max {
                    break Halt::Err(MachineError::StepLimit(max));
                }
            }

            match self.step(tape) {
                Step::Continue => reporter.on_step(self, tape),
                Step::Halt(halt) => break halt,
            }
        };

        info!(steps = self.step_count, "{halt}");
        reporter.on_halt(self, tape, &halt);

        halt
    }

    /// Renders the configuration: tape left of the head, the current state name, then the
    /// tape from the head onwards.
    ///
    /// ```text
    /// 1 q1 00
    /// ```
    pub fn configuration(&self, tape: &[char]) -> String {
        let split = self.head.min(tape.len());
        let left: String = tape[..split].iter().collect();
        let right: String = tape[split..].iter().collect();
        let state = self.current_name().unwrap_or("?");

        format!("{left} {state} {right}")
    }

    fn halt_in(&self, id: StateId) -> Halt {
        let state = self.state(id);
        match state.kind {
            StateKind::Accepting => Halt::Accept(state.name.clone()),
            StateKind::Rejecting => Halt::Reject(state.name.clone()),
            StateKind::Plain => Halt::Err(MachineError::InvalidState(state.name.clone())),
        }
    }

    fn check_id(&self, id: StateId) -> Result<(), MachineError> {
        if id.0 < self.states.len() {
            Ok(())
        } else {
            Err(MachineError::InvalidState(format!(
                "state #{} does not belong to this machine",
                id.0
            )))
        }
    }

    fn state_mut(&mut self, id: StateId) -> Result<&mut State, MachineError> {
        self.check_id(id)?;
        Ok(&mut self.states[id.0])
    }
}

/// Builds a tape of exactly `length` cells from `init`, truncating or padding with `blank`.
pub fn tape_from(init: &str, length: usize, blank: char) -> Vec<char> {
    init.chars()
        .chain(std::iter::repeat(blank))
        .take(length)
        .collect()
}
