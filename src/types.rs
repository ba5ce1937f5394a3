//! This module defines the core data structures and types used throughout the simulator,
//! including transition rules, symbol patterns, run status, and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::parser::Rule;

/// The reserved blank symbol. Every unwritten tape cell reads as blank.
pub const BLANK_SYMBOL: char = '_';
/// The reserved wildcard symbol: "any" when read, "unchanged" when written or used as a next state.
pub const WILDCARD: char = '*';
/// The wildcard as a state token.
pub const WILDCARD_STATE: &str = "*";
/// Trailing token that marks a rule as a breakpoint.
pub const BREAKPOINT_MARKER: &str = "!";
/// Any state whose name starts with this prefix is a halting state.
pub const HALT_PREFIX: &str = "halt";
/// State used when the caller supplies an empty initial state.
pub const DEFAULT_INITIAL_STATE: &str = "0";
/// The maximum number of tapes a rule set may declare.
pub const MAX_TAPES: usize = 2;
/// The default step guard used by drivers that run a machine to completion.
pub const MAX_EXECUTION_STEPS: usize = 10000;
/// The largest number of cells a display window shows on each side of a head.
pub const MAX_WINDOW_RADIUS: usize = 4096;

/// Returns `true` if `state` is a halting state.
///
/// The check is a case-sensitive prefix match, so `halt`, `halt-accept` and `haltx` all halt.
pub fn is_halt_state(state: &str) -> bool {
    state.starts_with(HALT_PREFIX)
}

/// Normalizes a user-supplied initial state.
///
/// Only the first whitespace-separated word is kept. An empty or all-whitespace string falls
/// back to [`DEFAULT_INITIAL_STATE`].
pub fn initial_state(state: &str) -> &str {
    state.split_whitespace().next().unwrap_or(DEFAULT_INITIAL_STATE)
}

/// Number of tokens a rule line needs for `tape_count` tapes, excluding the breakpoint marker.
pub fn rule_arity(tape_count: usize) -> usize {
    2 + 3 * tape_count
}

/// The symbol pattern a rule reads from one tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadSymbol {
    /// Matches any symbol, blank included.
    Any,
    /// Matches exactly this symbol.
    Exact(char),
}

impl ReadSymbol {
    /// Checks whether this pattern accepts the observed symbol.
    pub fn matches(&self, observed: char) -> bool {
        match self {
            ReadSymbol::Any => true,
            ReadSymbol::Exact(symbol) => *symbol == observed,
        }
    }

    /// Returns `true` if every symbol accepted by `other` is also accepted by `self`.
    pub fn covers(&self, other: &ReadSymbol) -> bool {
        match (self, other) {
            (ReadSymbol::Any, _) => true,
            (ReadSymbol::Exact(a), ReadSymbol::Exact(b)) => a == b,
            (ReadSymbol::Exact(_), ReadSymbol::Any) => false,
        }
    }
}

impl From<char> for ReadSymbol {
    fn from(c: char) -> Self {
        if c == WILDCARD {
            ReadSymbol::Any
        } else {
            ReadSymbol::Exact(c)
        }
    }
}

impl fmt::Display for ReadSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadSymbol::Any => write!(f, "{WILDCARD}"),
            ReadSymbol::Exact(c) => write!(f, "{c}"),
        }
    }
}

/// What a rule writes to one tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriteSymbol {
    /// Leave the cell as it is.
    Keep,
    /// Overwrite the cell with this symbol.
    Put(char),
}

impl From<char> for WriteSymbol {
    fn from(c: char) -> Self {
        if c == WILDCARD {
            WriteSymbol::Keep
        } else {
            WriteSymbol::Put(c)
        }
    }
}

impl fmt::Display for WriteSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteSymbol::Keep => write!(f, "{WILDCARD}"),
            WriteSymbol::Put(c) => write!(f, "{c}"),
        }
    }
}

/// Represents the possible directions a head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    /// Head displacement for this direction.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Stay => 0,
        }
    }

    /// Parses a move token. Only `l`, `r` and `*` are accepted.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "l" => Some(Direction::Left),
            "r" => Some(Direction::Right),
            "*" => Some(Direction::Stay),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Direction::Left => "l",
            Direction::Right => "r",
            Direction::Stay => "*",
        };
        f.write_str(token)
    }
}

/// The state a rule moves the machine into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NextState {
    /// Remain in the rule's originating state.
    Same,
    /// Move to the named state.
    Named(String),
}

impl NextState {
    /// Resolves the next state against the state the machine is currently in.
    pub fn resolve<'a>(&'a self, current: &'a str) -> &'a str {
        match self {
            NextState::Same => current,
            NextState::Named(name) => name,
        }
    }
}

impl From<&str> for NextState {
    fn from(token: &str) -> Self {
        if token == WILDCARD_STATE {
            NextState::Same
        } else {
            NextState::Named(token.to_string())
        }
    }
}

impl fmt::Display for NextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextState::Same => f.write_str(WILDCARD_STATE),
            NextState::Named(name) => f.write_str(name),
        }
    }
}

/// A single transition rule, as declared by one line of rule text.
///
/// `read`, `write` and `directions` all hold exactly one entry per tape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state this rule is declared for (`*` for any non-halting state).
    pub state: String,
    /// Symbol patterns to match under each head.
    pub read: Vec<ReadSymbol>,
    /// Symbols to write under each head.
    pub write: Vec<WriteSymbol>,
    /// Head movements applied after writing.
    pub directions: Vec<Direction>,
    /// The state to enter after applying the rule.
    pub next_state: NextState,
    /// Whether the machine pauses after this rule is applied.
    pub breakpoint: bool,
    /// 1-based line of the rule text this rule was declared on.
    pub line: usize,
}

impl Transition {
    /// Number of tapes this rule addresses.
    pub fn tape_count(&self) -> usize {
        self.read.len()
    }

    /// Checks whether this rule's read patterns accept the observed symbols.
    ///
    /// A rule whose write or move lists do not line up with its reads never matches.
    pub fn matches(&self, observed: &[char]) -> bool {
        self.read.len() == observed.len()
            && self.write.len() == observed.len()
            && self.directions.len() == observed.len()
            && self
                .read
                .iter()
                .zip(observed)
                .all(|(pattern, &symbol)| pattern.matches(symbol))
    }
}

/// Formats the rule back into rule-text form.
impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state)?;
        for read in &self.read {
            write!(f, " {read}")?;
        }
        for write in &self.write {
            write!(f, " {write}")?;
        }
        for direction in &self.directions {
            write!(f, " {direction}")?;
        }
        write!(f, " {}", self.next_state)?;
        if self.breakpoint {
            write!(f, " {BREAKPOINT_MARKER}")?;
        }
        Ok(())
    }
}

/// The run status of a machine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// No step has been taken yet.
    #[default]
    Ready,
    /// The last step applied a rule and execution may continue.
    Running,
    /// The last step applied a breakpoint rule.
    Paused,
    /// The machine entered a halting state.
    Halted,
    /// No rule matched the current state and symbols.
    Stuck,
}

impl Status {
    /// `Halted` and `Stuck` are final: further steps change nothing.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Halted | Status::Stuck)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Ready => "ready",
            Status::Running => "running",
            Status::Paused => "paused",
            Status::Halted => "halted",
            Status::Stuck => "stuck",
        };
        f.write_str(label)
    }
}

/// The rule field an invalid token was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenField {
    Read(usize),
    Write(usize),
    Move(usize),
}

impl fmt::Display for TokenField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenField::Read(tape) => write!(f, "read symbol for tape {}", tape + 1),
            TokenField::Write(tape) => write!(f, "write symbol for tape {}", tape + 1),
            TokenField::Move(tape) => write!(f, "move for tape {}", tape + 1),
        }
    }
}

/// An error found on a single line of rule text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    /// The line has the wrong number of tokens.
    #[error("Line {line}: expected {expected} or {} tokens, found {found}: {text:?}", .expected + 1)]
    MalformedRule {
        line: usize,
        text: String,
        expected: usize,
        found: usize,
    },
    /// A symbol or move token is not valid for its position.
    #[error("Line {line}: invalid {field} {token:?}: {text:?}")]
    InvalidToken {
        line: usize,
        text: String,
        token: String,
        field: TokenField,
    },
    /// The line could not be tokenized.
    #[error("Line {line}: {source}")]
    Syntax {
        line: usize,
        source: Box<pest::error::Error<Rule>>,
    },
}

impl RuleError {
    /// The 1-based line the error was reported on.
    pub fn line(&self) -> usize {
        match self {
            RuleError::MalformedRule { line, .. }
            | RuleError::InvalidToken { line, .. }
            | RuleError::Syntax { line, .. } => *line,
        }
    }
}

/// Every line error collected while parsing a rule text.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleErrors(pub Vec<RuleError>);

impl RuleErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, RuleError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RuleErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self
            .0
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        f.write_str(&lines)
    }
}

/// Represents various errors that can occur while loading rules or building a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// One or more rule lines failed to parse.
    #[error("{} invalid rule line(s):\n{0}", .0.len())]
    InvalidRules(RuleErrors),
    /// Only one- and two-tape machines are supported.
    #[error("Unsupported tape count: {0} (expected 1 or 2)")]
    UnsupportedTapeCount(usize),
    /// More input strings were supplied than the machine has tapes.
    #[error("Too many tape inputs: {inputs} inputs for {tapes} tapes")]
    TooManyInputs { inputs: usize, tapes: usize },
    /// A tape index outside the machine's tapes.
    #[error("Tape index {index} is out of bounds (machine has {tapes} tapes)")]
    TapeIndex { index: usize, tapes: usize },
    /// No built-in program matches the requested name or index.
    #[error("Program not found: {0}")]
    ProgramNotFound(String),
}
