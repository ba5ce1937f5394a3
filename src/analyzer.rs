//! This module provides checks that look for likely mistakes in a rule set before it runs:
//! unreachable or dead-end states, rules that can never fire, and input symbols no rule reads.
//!
//! None of these stop a machine from being built. The engine's behavior is fully defined for
//! all of them (a dead end is simply `Stuck`), so the findings are reported as warnings.

use crate::index::RuleIndex;
use crate::types::{self, is_halt_state, NextState, ReadSymbol, BLANK_SYMBOL, WILDCARD_STATE};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// A potential problem found in a rule set.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisWarning {
    /// The initial state has no rules, so the first step is `Stuck`.
    UndefinedInitialState(String),
    /// States with rules that no path from the initial state leads to.
    UnreachableStates(Vec<String>),
    /// Non-halting next states without any rules; entering one means the next step is `Stuck`.
    DeadEndStates(Vec<String>),
    /// Halting states that declare rules. Those rules are never consulted.
    HaltingStateRules(Vec<String>),
    /// A rule that can never fire because an earlier rule of the same state reads a
    /// pattern covering it.
    ShadowedRule {
        state: String,
        line: usize,
        shadowed_by: usize,
    },
    /// Input symbols that no rule reads, neither literally nor through a wildcard.
    UnhandledInputSymbols(Vec<char>),
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::UndefinedInitialState(state) => {
                write!(f, "Initial state '{state}' has no rules")
            }
            AnalysisWarning::UnreachableStates(states) => {
                write!(f, "Unreachable states detected: {states:?}")
            }
            AnalysisWarning::DeadEndStates(states) => {
                write!(f, "Transitions lead to states without rules: {states:?}")
            }
            AnalysisWarning::HaltingStateRules(states) => {
                write!(f, "Rules declared for halting states are ignored: {states:?}")
            }
            AnalysisWarning::ShadowedRule {
                state,
                line,
                shadowed_by,
            } => write!(
                f,
                "Rule on line {line} for state '{state}' is shadowed by line {shadowed_by}"
            ),
            AnalysisWarning::UnhandledInputSymbols(symbols) => write!(
                f,
                "Input contains symbols not handled by any transition: {symbols:?}"
            ),
        }
    }
}

/// What the checks look at.
struct Subject<'a> {
    index: &'a RuleIndex,
    initial_state: &'a str,
    inputs: Vec<&'a str>,
}

type Check = fn(&Subject) -> Vec<AnalysisWarning>;

/// Analyzes a rule set together with the initial state and tape inputs it will run with.
///
/// `initial_state` is normalized the same way [`crate::TuringMachine::new`] does it.
///
/// # Returns
///
/// Every warning found, grouped by check. An empty vector means nothing suspicious was found.
pub fn analyze<S: AsRef<str>>(
    index: &RuleIndex,
    initial_state: &str,
    inputs: &[S],
) -> Vec<AnalysisWarning> {
    let subject = Subject {
        index,
        initial_state: types::initial_state(initial_state),
        inputs: inputs.iter().map(|s| s.as_ref()).collect(),
    };

    let checks: [Check; 6] = [
        check_initial_state,
        check_unreachable_states,
        check_dead_end_states,
        check_halting_state_rules,
        check_shadowed_rules,
        check_input_symbols,
    ];

    checks.iter().flat_map(|check| check(&subject)).collect()
}

fn check_initial_state(subject: &Subject) -> Vec<AnalysisWarning> {
    let state = subject.initial_state;
    if is_halt_state(state)
        || subject.index.contains_state(state)
        || !subject.index.wildcard_rules().is_empty()
    {
        return Vec::new();
    }

    vec![AnalysisWarning::UndefinedInitialState(state.to_string())]
}

/// Depth-first traversal from the initial state over named next states.
///
/// Rules of the `*` state can fire from any non-halting state, so their targets count as
/// reachable as soon as one non-halting state is.
fn check_unreachable_states(subject: &Subject) -> Vec<AnalysisWarning> {
    let index = subject.index;
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue = vec![subject.initial_state];
    let mut wildcard_expanded = false;

    while let Some(state) = queue.pop() {
        if !visited.insert(state) || is_halt_state(state) {
            continue;
        }

        let mut rules = index.lookup(state).iter().collect::<Vec<_>>();
        if !wildcard_expanded {
            rules.extend(index.wildcard_rules());
            wildcard_expanded = true;
        }

        for rule in rules {
            if let NextState::Named(next) = &rule.next_state {
                if !visited.contains(next.as_str()) {
                    queue.push(next);
                }
            }
        }
    }

    let unreachable: Vec<String> = index
        .states()
        .into_iter()
        .filter(|state| *state != WILDCARD_STATE && !is_halt_state(state))
        .filter(|state| !visited.contains(state))
        .map(String::from)
        .collect();

    if unreachable.is_empty() {
        return Vec::new();
    }

    vec![AnalysisWarning::UnreachableStates(unreachable)]
}

fn check_dead_end_states(subject: &Subject) -> Vec<AnalysisWarning> {
    let index = subject.index;
    if !index.wildcard_rules().is_empty() {
        return Vec::new();
    }

    let dead_ends: BTreeSet<String> = index
        .iter()
        .filter_map(|rule| match &rule.next_state {
            NextState::Named(next) if !is_halt_state(next) && !index.contains_state(next) => {
                Some(next.clone())
            }
            _ => None,
        })
        .collect();

    if dead_ends.is_empty() {
        return Vec::new();
    }

    vec![AnalysisWarning::DeadEndStates(dead_ends.into_iter().collect())]
}

fn check_halting_state_rules(subject: &Subject) -> Vec<AnalysisWarning> {
    let halting: Vec<String> = subject
        .index
        .states()
        .into_iter()
        .filter(|state| is_halt_state(state))
        .map(String::from)
        .collect();

    if halting.is_empty() {
        return Vec::new();
    }

    vec![AnalysisWarning::HaltingStateRules(halting)]
}

/// Rules are matched first to last, so a rule whose read pattern is covered by an earlier
/// rule of the same state can never be selected.
fn check_shadowed_rules(subject: &Subject) -> Vec<AnalysisWarning> {
    let mut warnings = Vec::new();

    for state in subject.index.states() {
        let rules = subject.index.lookup(state);
        for (j, later) in rules.iter().enumerate() {
            let shadow = rules[..j].iter().find(|earlier| {
                earlier
                    .read
                    .iter()
                    .zip(&later.read)
                    .all(|(e, l)| e.covers(l))
            });

            if let Some(earlier) = shadow {
                warnings.push(AnalysisWarning::ShadowedRule {
                    state: state.to_string(),
                    line: later.line,
                    shadowed_by: earlier.line,
                });
            }
        }
    }

    warnings
}

/// Checks each tape's input against the symbols rules read from that tape.
fn check_input_symbols(subject: &Subject) -> Vec<AnalysisWarning> {
    let mut unhandled = BTreeSet::new();

    for (tape, input) in subject.inputs.iter().enumerate() {
        let patterns: Vec<ReadSymbol> = subject
            .index
            .iter()
            .filter_map(|rule| rule.read.get(tape).copied())
            .collect();

        if patterns.contains(&ReadSymbol::Any) {
            continue;
        }

        unhandled.extend(input.chars().filter(|&c| {
            c != ' ' && c != BLANK_SYMBOL && !patterns.contains(&ReadSymbol::Exact(c))
        }));
    }

    if unhandled.is_empty() {
        return Vec::new();
    }

    vec![AnalysisWarning::UnhandledInputSymbols(
        unhandled.into_iter().collect(),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load;

    fn warnings(rules: &str, tape_count: usize, state: &str, inputs: &[&str]) -> Vec<AnalysisWarning> {
        analyze(&load(rules, tape_count).unwrap(), state, inputs)
    }

    #[test]
    fn test_clean_program() {
        let result = warnings("0 0 0 r 0\n0 1 1 r 0\n0 _ _ * halt", 1, "0", &["0101"]);
        assert!(result.is_empty(), "unexpected warnings: {:?}", result);
    }

    #[test]
    fn test_initial_state_is_normalized() {
        let rules = "0 0 0 r 0\n0 1 1 r 0\n0 _ _ * halt";
        assert!(warnings(rules, 1, "", &["01"]).is_empty());
        assert!(warnings(rules, 1, "  0 extra", &["01"]).is_empty());

        let result = warnings("q1 * * * halt", 1, " q1 q2 ", &[""]);
        assert!(result.is_empty(), "unexpected warnings: {:?}", result);
    }

    #[test]
    fn test_undefined_initial_state() {
        let result = warnings("0 0 0 r 0", 1, "start", &[""]);

        assert!(result.contains(&AnalysisWarning::UndefinedInitialState("start".into())));
    }

    #[test]
    fn test_initial_halting_state_is_fine() {
        let result = warnings("0 0 0 r halt", 1, "halt", &[""]);
        assert!(!result
            .iter()
            .any(|w| matches!(w, AnalysisWarning::UndefinedInitialState(_))));
    }

    #[test]
    fn test_unreachable_states() {
        let result = warnings(
            "start a b r middle\nmiddle b c r halt\nisland a a r island",
            1,
            "start",
            &["a"],
        );

        assert!(result.contains(&AnalysisWarning::UnreachableStates(vec!["island".into()])));
    }

    #[test]
    fn test_wildcard_targets_are_reachable() {
        let result = warnings("start a a r start\n* _ _ * extra\nextra * * * halt", 1, "start", &["a"]);

        assert!(!result
            .iter()
            .any(|w| matches!(w, AnalysisWarning::UnreachableStates(_))));
    }

    #[test]
    fn test_dead_end_states() {
        let result = warnings("0 1 1 r nowhere\n0 0 0 r gone\n0 _ _ * halt", 1, "0", &["1"]);

        assert!(result.contains(&AnalysisWarning::DeadEndStates(vec![
            "gone".into(),
            "nowhere".into()
        ])));
    }

    #[test]
    fn test_halting_state_rules() {
        let result = warnings("0 _ _ * halt\nhalt _ 1 r 0", 1, "0", &[""]);

        assert!(result.contains(&AnalysisWarning::HaltingStateRules(vec!["halt".into()])));
    }

    #[test]
    fn test_shadowed_rules() {
        let result = warnings("0 * * r 0\n0 1 x r 0\n0 _ _ * halt", 1, "0", &["1"]);

        let shadowed: Vec<_> = result
            .iter()
            .filter(|w| matches!(w, AnalysisWarning::ShadowedRule { .. }))
            .collect();
        assert_eq!(shadowed.len(), 2);
        assert_eq!(
            shadowed[0],
            &AnalysisWarning::ShadowedRule {
                state: "0".into(),
                line: 2,
                shadowed_by: 1,
            }
        );
    }

    #[test]
    fn test_two_tape_partial_cover_is_not_shadowing() {
        let result = warnings("0 * 0 _ _ r r 0\n0 1 1 _ _ r r 0\n0 _ _ _ _ * * halt", 2, "0", &["1", "1"]);

        assert!(!result
            .iter()
            .any(|w| matches!(w, AnalysisWarning::ShadowedRule { .. })));
    }

    #[test]
    fn test_unhandled_input_symbols() {
        let result = warnings("0 a b r 0\n0 _ _ * halt", 1, "0", &["abcb a"]);

        assert!(result.contains(&AnalysisWarning::UnhandledInputSymbols(vec!['b', 'c'])));
    }

    #[test]
    fn test_wildcard_read_handles_every_symbol() {
        let result = warnings("0 * * r 0", 1, "0", &["xyz"]);
        assert!(!result
            .iter()
            .any(|w| matches!(w, AnalysisWarning::UnhandledInputSymbols(_))));
    }

    #[test]
    fn test_warning_display() {
        let warning = AnalysisWarning::ShadowedRule {
            state: "q".into(),
            line: 4,
            shadowed_by: 2,
        };
        assert_eq!(
            warning.to_string(),
            "Rule on line 4 for state 'q' is shadowed by line 2"
        );
    }
}
