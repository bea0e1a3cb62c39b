//! This module provides the parser for machine definitions, utilizing the `pest` crate.
//! It defines the grammar for `.tm` files and functions to build a fully linked `Machine`
//! from them.

use crate::{
    machine::Machine,
    types::{Direction, Limits, MachineError, StateId, StateKind, Write, DEFAULT_BLANK_SYMBOL},
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use tracing::{debug, warn};

/// Derives a `PestParser` for the definition grammar in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct DefinitionParser;

/// Parses a machine definition with the default [`Limits`].
///
/// See [`parse_with_limits`].
pub fn parse(input: &str) -> Result<Machine, MachineError> {
    parse_with_limits(input, Limits::default())
}

/// Parses a machine definition into a `Machine` ready to run.
///
/// `#` comment lines and blank lines are skipped, then a state count `N` is read, followed
/// by `N` state lines and any number of transition lines. Each line may end in a `# comment`. Every transition is resolved against
/// the declared states plus `accept` and `reject`. The first declared state becomes the
/// start state.
///
/// # Arguments
///
/// * `input` - The definition text.
/// * `limits` - Capacity limits enforced while building the machine.
///
/// # Returns
///
/// * `Ok(Machine)` with its current state set to the first declared state.
/// * `Err(MachineError::ParseError)` for malformed lines, unknown or duplicate states, or a
///   bad mode or direction.
/// * `Err(MachineError::ResourceLimit)` if a capacity limit is exceeded.
/// * `Err(MachineError::ConstructionError)` if no states are declared.
pub fn parse_with_limits(input: &str, limits: Limits) -> Result<Machine, MachineError> {
    let root = DefinitionParser::parse(Rule::definition, input)
        .map_err(|e| MachineError::ParseError(Box::new(e.renamed_rules(describe_rule))))?
        .next()
        .ok_or_else(|| MachineError::ConstructionError("Empty definition".to_string()))?;

    parse_definition(root, Machine::with_limits(limits))
}

/// Walks the `definition` pair, splitting lines into states and transitions by the count.
fn parse_definition(pair: Pair<Rule>, mut machine: Machine) -> Result<Machine, MachineError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();
    let count = parse_count(next_pair(&mut pairs, span)?)?;
    let mut first: Option<StateId> = None;
    let mut declared = 0;

    for p in pairs {
        let span = p.as_span();

        match p.as_rule() {
            Rule::state if declared < count => {
                let id = parse_state(p, &mut machine)?;
                first.get_or_insert(id);
                declared += 1;
            }
            Rule::transition if declared < count => {
                return Err(parse_error(
                    &format!(
                        "Expected state line {} of {count}, found a transition",
                        declared + 1
                    ),
                    span,
                ));
            }
            Rule::transition => parse_transition(p, &mut machine)?,
            Rule::state => {
                return Err(parse_error(
                    "Expected transition `<from> <input> -> <to> <write> <direction>`",
                    span,
                ));
            }
            _ => {} // Skip other rules
        }
    }

    if declared < count {
        let end = span.end_pos();
        return Err(parse_error(
            &format!("Expected {count} states, found {declared}"),
            end.span(&end),
        ));
    }

    let start = first.ok_or_else(|| {
        MachineError::ConstructionError("Machine should have at least one state".to_string())
    })?;
    machine.set_start(start)?;

    debug!(
        states = machine.states().len(),
        transitions = machine.transition_count(),
        start = %machine.state(start).name,
        "parsed machine"
    );

    Ok(machine)
}

/// Parses the number of state lines that follow.
fn parse_count(pair: Pair<Rule>) -> Result<usize, MachineError> {
    let span = pair.as_span();
    pair.as_str()
        .parse::<usize>()
        .map_err(|e| parse_error(&format!("Could not parse the state count: {e}"), span))
}

/// Parses a `<name> [A|R]` line and registers the state.
fn parse_state(pair: Pair<Rule>, machine: &mut Machine) -> Result<StateId, MachineError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();
    let name_pair = next_pair(&mut pairs, span)?;
    let name = truncate_name(machine.limits(), name_pair.as_str());

    let kind = match pairs.next() {
        Some(mode) => parse_mode(mode)?,
        None => StateKind::Plain,
    };

    // Prevent duplicated state declaration
    if machine.find_state(name).is_some() {
        return Err(parse_error(
            &format!("Duplicate state: {name}"),
            name_pair.as_span(),
        ));
    }

    let id = machine
        .add_state(name, kind)
        .map_err(|e| at_line(e, span))?;
    debug!(state = name, kind = ?kind, "parsed state");

    Ok(id)
}

/// Parses a `<from> <input> -> <to> <write> <direction>` line and attaches it to `<from>`.
fn parse_transition(pair: Pair<Rule>, machine: &mut Machine) -> Result<(), MachineError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();

    let from = resolve_state(machine, next_pair(&mut pairs, span)?)?;
    let input = parse_symbol(next_pair(&mut pairs, span)?.as_str());
    let to = resolve_state(machine, next_pair(&mut pairs, span)?)?;
    let write = Write::from_symbol(parse_symbol(next_pair(&mut pairs, span)?.as_str()));
    let direction = parse_direction(next_pair(&mut pairs, span)?)?;

    machine
        .add_transition(from, input, to, write, direction)
        .map_err(|e| at_line(e, span))?;

    debug!(
        from = %machine.state(from).name,
        input = %input,
        to = %machine.state(to).name,
        write = ?write,
        direction = ?direction,
        "parsed transition"
    );

    Ok(())
}

/// Looks up a referenced state by name, first match in declaration order.
fn resolve_state(machine: &Machine, pair: Pair<Rule>) -> Result<StateId, MachineError> {
    let name = truncate_name(machine.limits(), pair.as_str());
    machine
        .find_state(name)
        .ok_or_else(|| parse_error(&format!("Unknown state: {name}"), pair.as_span()))
}

/// Parses a state mode: `A` for accepting, `R` for rejecting.
fn parse_mode(pair: Pair<Rule>) -> Result<StateKind, MachineError> {
    match pair.as_str() {
        "A" => Ok(StateKind::Accepting),
        "R" => Ok(StateKind::Rejecting),
        other => Err(parse_error(
            &format!("Unsupported state mode: {other}"),
            pair.as_span(),
        )),
    }
}

/// Parses a single direction: `L` for Left, `R` for Right.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, MachineError> {
    match pair.as_str() {
        "L" => Ok(Direction::Left),
        "R" => Ok(Direction::Right),
        other => Err(parse_error(
            &format!("Unsupported direction: {other}"),
            pair.as_span(),
        )),
    }
}

/// Parses a single character symbol.
fn parse_symbol(input: &str) -> char {
    input.chars().next().unwrap_or(DEFAULT_BLANK_SYMBOL)
}

/// Applies the name length limit, warning when a name gets shortened.
fn truncate_name<'a>(limits: &Limits, name: &'a str) -> &'a str {
    let truncated = limits.truncate(name);
    if truncated.len() != name.len() {
        warn!(name, truncated, "state name truncated");
    }
    truncated
}

/// Takes the next pair of a line, which the grammar guarantees to exist.
fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, span: Span<'i>) -> Result<Pair<'i, Rule>, MachineError> {
    pairs
        .next()
        .ok_or_else(|| parse_error("Unexpected end of line", span))
}

/// Creates a `MachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> MachineError {
    MachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Prefixes capacity errors with the line that triggered them.
fn at_line(error: MachineError, span: Span) -> MachineError {
    let (line, _) = span.start_pos().line_col();
    match error {
        MachineError::ResourceLimit(msg) => MachineError::ResourceLimit(format!("line {line}: {msg}")),
        other => other,
    }
}

/// Human-readable rule names for grammar errors.
fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::count => "state count".to_string(),
        Rule::state => "state line".to_string(),
        Rule::transition => "transition line".to_string(),
        Rule::name => "state name".to_string(),
        Rule::symbol => "single-character symbol".to_string(),
        Rule::mode => "state mode".to_string(),
        Rule::token => "direction".to_string(),
        Rule::EOI => "end of input".to_string(),
        other => format!("{other:?}"),
    }
}
