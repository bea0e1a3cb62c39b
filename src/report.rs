//! Reporting sinks for machine runs.
//!
//! The engine calls a [`Reporter`] at the start of a run, after every step into a plain
//! state, and once when the machine halts. [`TraceReporter`] prints the classic
//! step-by-step trace, [`RunReport`] summarizes a finished run for machine consumption.

use crate::machine::Machine;
use crate::types::Halt;
use serde::Serialize;
use std::io::{self, Write};

/// Receives machine configurations while a run progresses.
///
/// All methods default to doing nothing.
pub trait Reporter {
    /// Called once before the first step.
    fn on_start(&mut self, _machine: &Machine, _tape: &[char]) {}

    /// Called after each step that left the machine in a plain state.
    fn on_step(&mut self, _machine: &Machine, _tape: &[char]) {}

    /// Called once with the final outcome.
    fn on_halt(&mut self, _machine: &Machine, _tape: &[char], _halt: &Halt) {}
}

/// A reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Reporter for Silent {}

/// Writes the step-by-step trace and the final message to any writer.
///
/// ```text
///  q0 000
/// 1 q1 00
///
/// > Done!
///
/// > Input accepted in state: accept
/// ```
///
/// Write errors stop further output; the first one is kept and returned by
/// [`TraceReporter::finish`].
pub struct TraceReporter<W: Write> {
    out: W,
    verbose: bool,
    error: Option<io::Error>,
}

impl<W: Write> TraceReporter<W> {
    /// Reports every configuration and the final message.
    pub fn new(out: W) -> Self {
        Self {
            out,
            verbose: true,
            error: None,
        }
    }

    /// Reports only the final message.
    pub fn quiet(out: W) -> Self {
        Self {
            verbose: false,
            ..Self::new(out)
        }
    }

    /// Flushes the writer and returns it, or the first write error encountered.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn emit(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.out, "{text}") {
            self.error = Some(e);
        }
    }
}

impl<W: Write> Reporter for TraceReporter<W> {
    fn on_start(&mut self, machine: &Machine, tape: &[char]) {
        if self.verbose {
            self.emit(&machine.configuration(tape));
        }
    }

    fn on_step(&mut self, machine: &Machine, tape: &[char]) {
        if self.verbose {
            self.emit(&machine.configuration(tape));
        }
    }

    fn on_halt(&mut self, _machine: &Machine, _tape: &[char], halt: &Halt) {
        match halt {
            Halt::Err(_) => self.emit(&format!("\n> {halt}")),
            _ => self.emit(&format!("\n> Done!\n\n> {halt}")),
        }
    }
}

/// Outcome of a run in a serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Accepted,
    Rejected,
    Error,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcome: Outcome,
    /// Name of the state the machine stopped in.
    pub state: Option<String>,
    pub error: Option<String>,
    pub steps: usize,
    pub head: usize,
    pub tape: String,
}

impl RunReport {
    /// Captures the machine and tape after `run` returned `halt`.
    pub fn new(machine: &Machine, tape: &[char], halt: &Halt) -> Self {
        let (outcome, error) = match halt {
            Halt::Accept(_) => (Outcome::Accepted, None),
            Halt::Reject(_) => (Outcome::Rejected, None),
            Halt::Err(e) => (Outcome::Error, Some(e.to_string())),
        };

        Self {
            outcome,
            state: machine.current_name().map(str::to_string),
            error,
            steps: machine.step_count(),
            head: machine.head(),
            tape: tape.iter().collect(),
        }
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
