//! The `RuleIndex` groups parsed rules by the state they are declared for.
//!
//! Lookup preserves declaration order, which is what gives the engine its first-match
//! tie-break: an earlier rule always wins over a later one, however specific the later one is.

use crate::types::{Transition, WILDCARD_STATE};
use std::collections::HashMap;

/// An immutable, state-keyed view over a rule set.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleIndex {
    tape_count: usize,
    rules: HashMap<String, Vec<Transition>>,
    len: usize,
}

impl RuleIndex {
    /// Builds an index over `rules` for a machine with `tape_count` tapes.
    ///
    /// An empty rule set is valid; every step of a machine built over it is `Stuck`.
    pub fn build(tape_count: usize, rules: impl IntoIterator<Item = Transition>) -> Self {
        let mut grouped: HashMap<String, Vec<Transition>> = HashMap::new();
        let mut len = 0;

        for rule in rules {
            debug_assert_eq!(rule.tape_count(), tape_count);
            grouped.entry(rule.state.clone()).or_default().push(rule);
            len += 1;
        }

        Self {
            tape_count,
            rules: grouped,
            len,
        }
    }

    /// Returns the rules declared for `state`, in declaration order.
    ///
    /// A state without rules yields an empty slice.
    pub fn lookup(&self, state: &str) -> &[Transition] {
        self.rules.get(state).map(Vec::as_slice).unwrap_or_default()
    }

    /// Rules declared with the `*` source state.
    pub fn wildcard_rules(&self) -> &[Transition] {
        self.lookup(WILDCARD_STATE)
    }

    /// Number of tapes every rule in this index addresses.
    pub fn tape_count(&self) -> usize {
        self.tape_count
    }

    /// Total number of rules.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if at least one rule is declared for `state`.
    pub fn contains_state(&self, state: &str) -> bool {
        self.rules.contains_key(state)
    }

    /// All states with declared rules, sorted by name.
    pub fn states(&self) -> Vec<&str> {
        let mut states: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        states.sort_unstable();
        states
    }

    /// Iterates over every rule, ordered by source line.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let mut all: Vec<&Transition> = self.rules.values().flatten().collect();
        all.sort_by_key(|rule| rule.line);
        all.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn index(text: &str, tape_count: usize) -> RuleIndex {
        RuleIndex::build(tape_count, parse(text, tape_count).unwrap())
    }

    #[test]
    fn test_lookup_preserves_declaration_order() {
        let index = index("a * * r a\nb 1 1 r b\na 0 1 r b\na _ _ * halt", 1);

        let lines: Vec<usize> = index.lookup("a").iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![1, 3, 4]);
        assert_eq!(index.lookup("b").len(), 1);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_lookup_unknown_state_is_empty() {
        let index = index("0 0 0 r 0", 1);

        assert!(index.lookup("missing").is_empty());
        assert!(index.lookup("halt").is_empty());
        assert!(!index.contains_state("missing"));
    }

    #[test]
    fn test_empty_index() {
        let index = RuleIndex::build(2, Vec::new());

        assert!(index.is_empty());
        assert_eq!(index.tape_count(), 2);
        assert!(index.states().is_empty());
        assert!(index.wildcard_rules().is_empty());
    }

    #[test]
    fn test_states_and_iteration() {
        let index = index("q2 0 0 r q1\nq1 0 0 r q2\n* _ _ * halt", 1);

        assert_eq!(index.states(), vec!["*", "q1", "q2"]);
        assert_eq!(index.wildcard_rules().len(), 1);
        assert_eq!(
            index.iter().map(|r| r.state.as_str()).collect::<Vec<_>>(),
            vec!["q2", "q1", "*"]
        );
    }
}
