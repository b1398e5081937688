//! Property-based tests comparing stream chains with plain loops

use lazyweld::prelude::*;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Step {
    KeepEven,
    KeepAbove(i32),
    KeepNotMultipleOf(i32),
    Add(i32),
    Double,
    Negate,
}

// Generate arbitrary filter/map steps from a closed set
prop_compose! {
    fn arb_step()(idx in 0..6usize, k in -50..50i32, m in 2..7i32) -> Step {
        match idx {
            0 => Step::KeepEven,
            1 => Step::KeepAbove(k),
            2 => Step::KeepNotMultipleOf(m),
            3 => Step::Add(k),
            4 => Step::Double,
            _ => Step::Negate,
        }
    }
}

// Generate arbitrary inputs, small enough to hit duplicates often
prop_compose! {
    fn arb_input()(items in prop::collection::vec(-100..100i32, 0..64)) -> Vec<i32> {
        items
    }
}

fn apply(stream: Stream<i32>, step: &Step) -> Stream<i32> {
    match *step {
        Step::KeepEven => stream.filter(|x| x % 2 == 0),
        Step::KeepAbove(k) => stream.filter(move |x| *x > k),
        Step::KeepNotMultipleOf(m) => stream.filter(move |x| x % m != 0),
        Step::Add(k) => stream.map(move |x| x.wrapping_add(k)),
        Step::Double => stream.map(|x| x.wrapping_mul(2)),
        Step::Negate => stream.map(|x| x.wrapping_neg()),
    }
}

fn run_loop(input: &[i32], steps: &[Step]) -> Vec<i32> {
    let mut out = Vec::new();
    'items: for &item in input {
        let mut value = item;
        for step in steps {
            match *step {
                Step::KeepEven if value % 2 != 0 => continue 'items,
                Step::KeepAbove(k) if value <= k => continue 'items,
                Step::KeepNotMultipleOf(m) if value % m == 0 => continue 'items,
                Step::Add(k) => value = value.wrapping_add(k),
                Step::Double => value = value.wrapping_mul(2),
                Step::Negate => value = value.wrapping_neg(),
                _ => {}
            }
        }
        out.push(value);
    }
    out
}

fn first_occurrences(input: &[i32]) -> Vec<i32> {
    let mut seen = HashSet::new();
    input
        .iter()
        .copied()
        .filter(|item| seen.insert(*item))
        .collect()
}

proptest! {
    #[test]
    fn test_filter_map_chain_matches_loop(
        input in arb_input(),
        steps in prop::collection::vec(arb_step(), 0..8)
    ) {
        let stream = steps.iter().fold(Stream::of(input.clone()), apply);
        prop_assert_eq!(stream.collect().unwrap(), run_loop(&input, &steps));
    }

    #[test]
    fn test_sorted_matches_vec_sort(input in arb_input()) {
        let mut expected = input.clone();
        expected.sort();
        prop_assert_eq!(Stream::of(input).sorted().collect().unwrap(), expected);
    }

    #[test]
    fn test_distinct_keeps_first_occurrences(input in arb_input()) {
        let expected = first_occurrences(&input);
        prop_assert_eq!(Stream::of(input).distinct().collect().unwrap(), expected);
    }

    #[test]
    fn test_chain_then_stateful_ops_match_loop(
        input in arb_input(),
        steps in prop::collection::vec(arb_step(), 0..6)
    ) {
        let base = steps.iter().fold(Stream::of(input.clone()), apply);
        let looped = run_loop(&input, &steps);

        let mut sorted = looped.clone();
        sorted.sort();
        prop_assert_eq!(base.sorted().collect().unwrap(), sorted);

        let mut unique_sorted = first_occurrences(&looped);
        unique_sorted.sort();
        prop_assert_eq!(base.distinct().sorted().collect().unwrap(), unique_sorted);

        let total = looped.iter().fold(0i32, |acc, x| acc.wrapping_add(*x));
        prop_assert_eq!(base.reduce(0, |acc, x| acc.wrapping_add(x)).unwrap(), total);
    }

    #[test]
    fn test_skip_limit_match_iterator(input in arb_input(), skip in 0..20usize, limit in 0..20usize) {
        let expected: Vec<i32> = input.iter().copied().skip(skip).take(limit).collect();
        let stream = Stream::of(input).skip(skip).limit(limit);
        prop_assert_eq!(stream.collect().unwrap(), expected.clone());
        prop_assert_eq!(stream.short_circuit(false).collect().unwrap(), expected);
    }

    #[test]
    fn test_each_terminal_traverses_source_once(
        input in arb_input(),
        steps in prop::collection::vec(arb_step(), 0..6)
    ) {
        let source = Arc::new(Instrumented::new(VecSource::new(input)));
        let stream = steps
            .iter()
            .fold(Stream::from_source(source.clone()), apply)
            .distinct()
            .sorted();
        prop_assert_eq!(source.traversals(), 0);
        stream.collect().unwrap();
        prop_assert_eq!(source.traversals(), 1);
        stream.count().unwrap();
        prop_assert_eq!(source.traversals(), 2);
    }
}
