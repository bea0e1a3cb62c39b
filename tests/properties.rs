//! Property-based tests for the parser and the execution engine.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated definitions and tapes.

use proptest::prelude::*;
use tmsim::{encode, parse, Direction, Halt, Machine, StateKind, Step, Write};

const SYMBOLS: &[char] = &['0', '1', 'a', 'b', '_', 'x'];

prop_compose! {
    fn arbitrary_symbol()(index in 0..SYMBOLS.len()) -> char {
        SYMBOLS[index]
    }
}

prop_compose! {
    fn arbitrary_tape()(cells in prop::collection::vec(arbitrary_symbol(), 1..12)) -> Vec<char> {
        cells
    }
}

/// A definition with `states` plain states and random transitions between them and the
/// distinguished states.
fn arbitrary_definition() -> impl Strategy<Value = String> {
    (1..6usize).prop_flat_map(|states| {
        let transition = (
            0..states,
            arbitrary_symbol(),
            0..states + 2,
            prop_oneof![arbitrary_symbol(), Just('\\')],
            any::<bool>(),
        );

        prop::collection::vec(transition, 0..15).prop_map(move |transitions| {
            let mut text = format!("# generated\n{states}\n");
            for i in 0..states {
                text.push_str(&format!("s{i}\n"));
            }
            for (from, input, to, write, left) in transitions {
                let to = match to {
                    t if t == states => "accept".to_string(),
                    t if t == states + 1 => "reject".to_string(),
                    t => format!("s{t}"),
                };
                let direction = if left { 'L' } else { 'R' };
                text.push_str(&format!("s{from} {input} -> {to} {write} {direction}\n"));
            }
            text
        })
    })
}

fn single_state(input: char, write: Write, direction: Direction) -> Machine {
    let mut machine = Machine::new();
    let q0 = machine.add_state("q0", StateKind::Plain).unwrap();
    let q1 = machine.add_state("q1", StateKind::Plain).unwrap();
    machine
        .add_transition(q0, input, q1, write, direction)
        .unwrap();
    machine.set_start(q0).unwrap();
    machine
}

proptest! {
    #[test]
    fn parsing_is_idempotent(definition in arbitrary_definition()) {
        let first = parse(&definition).unwrap();
        let second = parse(&definition).unwrap();

        prop_assert_eq!(first.states().len(), second.states().len());
        prop_assert_eq!(first.start(), second.start());
        for (a, b) in first.states().iter().zip(second.states()) {
            prop_assert_eq!(a.transitions.len(), b.transitions.len());
        }
    }

    #[test]
    fn encoding_round_trips(definition in arbitrary_definition()) {
        let machine = parse(&definition).unwrap();
        let reparsed = parse(&encode(&machine)).unwrap();

        prop_assert_eq!(reparsed.states(), machine.states());
        prop_assert_eq!(reparsed.start(), machine.start());
    }

    #[test]
    fn left_at_cell_zero_stays_at_zero(mut tape in arbitrary_tape()) {
        let mut machine = single_state(tape[0], Write::Keep, Direction::Left);

        prop_assert_eq!(machine.step(&mut tape), Step::Continue);
        prop_assert_eq!(machine.head(), 0);
    }

    #[test]
    fn right_from_last_cell_is_fatal(tape in arbitrary_tape()) {
        let mut machine = single_state('*', Write::Symbol('!'), Direction::Right);
        let mut cells = tape.clone();
        let last = cells.len() - 1;

        // Walk to the last cell first
        let mut walker = Machine::new();
        let w = walker.add_state("w", StateKind::Plain).unwrap();
        for &symbol in SYMBOLS {
            walker.add_transition(w, symbol, w, Write::Keep, Direction::Right).unwrap();
        }
        walker.set_start(w).unwrap();
        for _ in 0..last {
            prop_assert_eq!(walker.step(&mut cells), Step::Continue);
        }
        prop_assert_eq!(walker.head(), last);

        let result = walker.step(&mut cells);
        prop_assert!(matches!(result, Step::Halt(Halt::Err(_))));
        prop_assert_eq!(walker.head(), last);
        prop_assert_eq!(&cells, &tape);

        // A machine that does not match the symbol never moves at all
        prop_assert_eq!(machine.step(&mut cells), Step::Halt(Halt::Reject("reject".into())));
    }

    #[test]
    fn no_write_leaves_the_cell_untouched(mut tape in arbitrary_tape()) {
        let original = tape.clone();
        let mut machine = single_state(tape[0], Write::Keep, Direction::Left);

        machine.step(&mut tape);
        prop_assert_eq!(tape, original);
    }

    #[test]
    fn a_write_changes_exactly_one_cell(mut tape in arbitrary_tape(), symbol in arbitrary_symbol()) {
        let original = tape.clone();
        let mut machine = single_state(tape[0], Write::Symbol(symbol), Direction::Left);

        machine.step(&mut tape);
        prop_assert_eq!(tape[0], symbol);
        prop_assert_eq!(&tape[1..], &original[1..]);
    }

    #[test]
    fn first_registered_transition_wins(input in arbitrary_symbol(), extra in 1..4usize) {
        let mut machine = Machine::new();
        let x = machine.add_state("x", StateKind::Plain).unwrap();
        let first = machine.add_state("first", StateKind::Accepting).unwrap();
        machine.add_transition(x, input, first, Write::Keep, Direction::Left).unwrap();
        for _ in 0..extra {
            let other = machine.reject();
            machine.add_transition(x, input, other, Write::Keep, Direction::Left).unwrap();
        }
        machine.set_start(x).unwrap();

        let mut tape = vec![input];
        prop_assert_eq!(machine.step(&mut tape), Step::Halt(Halt::Accept("first".into())));
    }
}
