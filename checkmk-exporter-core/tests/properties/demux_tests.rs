//! Property-based tests for the section demultiplexer

use std::collections::HashSet;

use checkmk_exporter_core::demux;
use proptest::prelude::*;

/// Section names as the agent prints them
fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

/// Payload lines that can never be mistaken for a marker
fn arb_line() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9/%. :-]{0,40}"
}

fn arb_lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_line(), 0..20)
}

fn render(sections: &[(String, Vec<String>)]) -> String {
    let mut raw = String::new();
    for (name, lines) in sections {
        raw.push_str(&format!("<<<{name}>>>\n"));
        for line in lines {
            raw.push_str(line);
            raw.push('\n');
        }
    }
    raw
}

fn dedup(lines: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    lines
        .iter()
        .filter(|l| seen.insert(l.as_str()))
        .cloned()
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A single run keeps each distinct line once, in first-seen order
    #[test]
    fn prop_run_is_deduplicated_in_order(name in arb_name(), lines in arb_lines()) {
        let map = demux(&render(&[(name.clone(), lines.clone())]));
        prop_assert_eq!(map.len(), 1);
        let expected_lines = dedup(&lines);
        prop_assert_eq!(map.get(&name).unwrap(), expected_lines.as_slice());
    }

    /// `A, B, A`: the last run of A wins, B keeps its own run
    #[test]
    fn prop_later_run_overwrites(
        a in arb_name(),
        b in arb_name(),
        first in arb_lines(),
        middle in arb_lines(),
        last in arb_lines(),
    ) {
        prop_assume!(a != b);
        let raw = render(&[
            (a.clone(), first),
            (b.clone(), middle.clone()),
            (a.clone(), last.clone()),
        ]);
        let map = demux(&raw);
        let expected_last = dedup(&last);
        prop_assert_eq!(map.get(&a).unwrap(), expected_last.as_slice());
        let expected_middle = dedup(&middle);
        prop_assert_eq!(map.get(&b).unwrap(), expected_middle.as_slice());
    }

    /// Every marker name shows up as a key, and only those
    #[test]
    fn prop_keys_are_marker_names(
        sections in prop::collection::vec((arb_name(), arb_lines()), 0..8),
    ) {
        let map = demux(&render(&sections));
        let expected: HashSet<&str> = sections.iter().map(|(n, _)| n.as_str()).collect();
        let actual: HashSet<&str> = map.names().into_iter().collect();
        prop_assert_eq!(actual, expected);
    }

    /// Text before the first marker never lands in a section
    #[test]
    fn prop_preamble_is_dropped(preamble in arb_lines(), name in arb_name(), lines in arb_lines()) {
        let mut raw = preamble.join("\n");
        raw.push('\n');
        raw.push_str(&render(&[(name.clone(), lines.clone())]));
        let map = demux(&raw);
        prop_assert_eq!(map.len(), 1);
        let expected_lines = dedup(&lines);
        prop_assert_eq!(map.get(&name).unwrap(), expected_lines.as_slice());
    }
}
