//! This module defines the `TuringMachine` struct, the step engine of the simulator.
//! It owns the current state, the tapes and their heads, and the run status, and it advances
//! them one rule application at a time.

use crate::index::RuleIndex;
use crate::parser::check_tape_count;
use crate::tape::{Tape, TapeWindow};
use crate::types::{self, is_halt_state, Status, Transition, TuringMachineError, WriteSymbol};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};

/// Represents a one- or two-tape Turing Machine.
///
/// The rule index is shared and read-only; everything else is owned by the machine and
/// mutated in place by [`TuringMachine::step`].
#[derive(Debug, Clone)]
pub struct TuringMachine {
    index: Arc<RuleIndex>,
    initial_state: String,
    inputs: Vec<String>,
    state: String,
    tapes: Vec<Tape>,
    heads: Vec<i64>,
    status: Status,
    step_count: usize,
    last_transition: Option<Transition>,
}

/// A serializable view of a machine at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub state: String,
    pub status: Status,
    pub step_count: usize,
    pub heads: Vec<i64>,
    pub tapes: Vec<TapeWindow>,
}

impl TuringMachine {
    /// Creates a machine over `index`, starting in `initial_state`.
    ///
    /// `inputs` holds one string per tape; tapes without an input start blank. Every head
    /// starts at position 0. Only the first whitespace-separated word of `initial_state` is
    /// used, and an empty state falls back to `"0"`.
    ///
    /// # Returns
    ///
    /// * `Err(TuringMachineError::UnsupportedTapeCount)` if the index is not for 1 or 2 tapes.
    /// * `Err(TuringMachineError::TooManyInputs)` if there are more inputs than tapes.
    pub fn new<S: AsRef<str>>(
        index: Arc<RuleIndex>,
        initial_state: &str,
        inputs: &[S],
    ) -> Result<Self, TuringMachineError> {
        let tape_count = index.tape_count();
        check_tape_count(tape_count)?;

        if inputs.len() > tape_count {
            return Err(TuringMachineError::TooManyInputs {
                inputs: inputs.len(),
                tapes: tape_count,
            });
        }

        let initial_state = types::initial_state(initial_state).to_string();
        let mut inputs: Vec<String> = inputs.iter().map(|s| s.as_ref().to_string()).collect();
        inputs.resize(tape_count, String::new());

        debug!(
            state = %initial_state,
            tapes = tape_count,
            rules = index.len(),
            "machine created"
        );

        Ok(Self {
            state: initial_state.clone(),
            tapes: inputs.iter().map(|input| Tape::from_input(input)).collect(),
            heads: vec![0; tape_count],
            status: Status::Ready,
            step_count: 0,
            last_transition: None,
            index,
            initial_state,
            inputs,
        })
    }

    /// Executes a single step and returns the resulting status.
    ///
    /// The first rule for the current state whose read patterns accept the symbols under the
    /// heads is applied: writes first, then head moves, then the state change. Rules declared
    /// for the `*` state are only consulted when no rule of the current state matches. If no
    /// rule matches at all the machine becomes `Stuck` and nothing is modified.
    ///
    /// On `Halted` or `Stuck` this is a no-op.
    pub fn step(&mut self) -> Status {
        if self.status.is_terminal() {
            return self.status;
        }

        // Only reachable when the machine was started in a halting state.
        if is_halt_state(&self.state) {
            debug!(state = %self.state, "started in halting state");
            self.status = Status::Halted;
            return self.status;
        }

        let symbols = self.symbols();
        let index = Arc::clone(&self.index);
        let Some(transition) = find_transition(&index, &self.state, &symbols) else {
            debug!(state = %self.state, ?symbols, steps = self.step_count, "no rule matches");
            self.status = Status::Stuck;
            return self.status;
        };

        for (i, tape) in self.tapes.iter_mut().enumerate() {
            if let WriteSymbol::Put(symbol) = transition.write[i] {
                tape.write(self.heads[i], symbol);
            }
            self.heads[i] += transition.directions[i].offset();
        }

        self.state = transition.next_state.resolve(&self.state).to_string();
        self.step_count += 1;

        self.status = if is_halt_state(&self.state) {
            debug!(state = %self.state, steps = self.step_count, "halted");
            Status::Halted
        } else if transition.breakpoint {
            debug!(line = transition.line, steps = self.step_count, "paused at breakpoint");
            Status::Paused
        } else {
            Status::Running
        };

        trace!(
            step = self.step_count,
            line = transition.line,
            rule = %transition,
            state = %self.state,
            "applied rule"
        );
        self.last_transition = Some(transition.clone());

        self.status
    }

    /// Steps until the machine is no longer `Running`.
    ///
    /// Stops on `Paused`, `Halted` or `Stuck`. There is no step limit: a machine that never
    /// halts keeps this call busy forever. Use [`TuringMachine::run_for`] to bound it.
    pub fn run(&mut self) -> Status {
        loop {
            match self.step() {
                Status::Running => continue,
                status => return status,
            }
        }
    }

    /// Like [`TuringMachine::run`], but gives up after `max_steps` calls to `step`.
    ///
    /// Returns the status reached, which is still `Running` if the limit was hit.
    pub fn run_for(&mut self, max_steps: usize) -> Status {
        for _ in 0..max_steps {
            match self.step() {
                Status::Running => continue,
                status => return status,
            }
        }

        self.status
    }

    /// Restores the configuration the machine was created with.
    pub fn reset(&mut self) {
        self.state = self.initial_state.clone();
        self.tapes = self.inputs.iter().map(|input| Tape::from_input(input)).collect();
        self.heads = vec![0; self.tapes.len()];
        self.status = Status::Ready;
        self.step_count = 0;
        self.last_transition = None;
    }

    /// Returns the current state.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the state the machine started in.
    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the number of rules applied so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn tape_count(&self) -> usize {
        self.tapes.len()
    }

    pub fn tapes(&self) -> &[Tape] {
        &self.tapes
    }

    /// Returns the head position of every tape.
    pub fn heads(&self) -> &[i64] {
        &self.heads
    }

    /// The rule index this machine runs on.
    pub fn index(&self) -> &RuleIndex {
        &self.index
    }

    /// The rule applied by the most recent successful step.
    pub fn last_transition(&self) -> Option<&Transition> {
        self.last_transition.as_ref()
    }

    /// Returns the symbols currently under each head.
    pub fn symbols(&self) -> Vec<char> {
        self.tapes
            .iter()
            .zip(&self.heads)
            .map(|(tape, &head)| tape.read(head))
            .collect()
    }

    /// Returns the rule the next step would apply, if any.
    pub fn transition(&self) -> Option<&Transition> {
        if self.status.is_terminal() || is_halt_state(&self.state) {
            return None;
        }
        find_transition(&self.index, &self.state, &self.symbols())
    }

    /// A display window of `radius` cells on each side of the head of tape `tape_index`.
    pub fn window(&self, tape_index: usize, radius: usize) -> Result<TapeWindow, TuringMachineError> {
        let tape = self
            .tapes
            .get(tape_index)
            .ok_or(TuringMachineError::TapeIndex {
                index: tape_index,
                tapes: self.tapes.len(),
            })?;

        Ok(tape.window(self.heads[tape_index], radius))
    }

    /// Display windows for every tape.
    pub fn windows(&self, radius: usize) -> Vec<TapeWindow> {
        self.tapes
            .iter()
            .zip(&self.heads)
            .map(|(tape, &head)| tape.window(head, radius))
            .collect()
    }

    /// Captures the observable state of the machine.
    pub fn snapshot(&self, radius: usize) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            status: self.status,
            step_count: self.step_count,
            heads: self.heads.clone(),
            tapes: self.windows(radius),
        }
    }
}

/// Finds the first rule for `state` accepting `symbols`, falling back to the `*` state rules.
fn find_transition<'a>(
    index: &'a RuleIndex,
    state: &str,
    symbols: &[char],
) -> Option<&'a Transition> {
    index
        .lookup(state)
        .iter()
        .find(|t| t.matches(symbols))
        .or_else(|| index.wildcard_rules().iter().find(|t| t.matches(symbols)))
}
