//! This module provides `ProgramLoader`, the entry point that turns rule text into something
//! a machine can run. It does no file-system access; callers read the text themselves.

use crate::index::RuleIndex;
use crate::machine::TuringMachine;
use crate::parser::parse;
use crate::types::TuringMachineError;
use std::sync::Arc;
use tracing::debug;

/// `ProgramLoader` is a utility struct for loading rule sets and machines from rule text.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Parses `text` for a machine with `tape_count` tapes and indexes the result.
    ///
    /// # Returns
    ///
    /// * `Ok(RuleIndex)` if every line is valid.
    /// * `Err(TuringMachineError::InvalidRules)` listing every invalid line.
    /// * `Err(TuringMachineError::UnsupportedTapeCount)` if `tape_count` is not 1 or 2.
    pub fn load(text: &str, tape_count: usize) -> Result<RuleIndex, TuringMachineError> {
        let rules = parse(text, tape_count)?;
        let index = RuleIndex::build(tape_count, rules);

        debug!(
            rules = index.len(),
            states = index.states().len(),
            tapes = tape_count,
            "rule set loaded"
        );

        Ok(index)
    }

    /// Loads `text` and creates a machine over it in one go.
    pub fn load_machine<S: AsRef<str>>(
        text: &str,
        tape_count: usize,
        initial_state: &str,
        inputs: &[S],
    ) -> Result<TuringMachine, TuringMachineError> {
        let index = Self::load(text, tape_count)?;
        TuringMachine::new(Arc::new(index), initial_state, inputs)
    }
}

/// Shorthand for [`ProgramLoader::load`].
pub fn load(text: &str, tape_count: usize) -> Result<RuleIndex, TuringMachineError> {
    ProgramLoader::load(text, tape_count)
}
