//! This crate provides the core of a finite-tape Turing Machine simulator.
//! It includes modules for parsing rule text, indexing rules by state, representing tapes,
//! stepping the machine, analyzing rule sets, and a collection of built-in programs.
//!
//! ```
//! use tmsim::{ProgramLoader, Status};
//!
//! let rules = "0 0 0 r 0\n0 1 1 r 0\n0 _ _ * halt";
//! let mut machine = ProgramLoader::load_machine(rules, 1, "0", &["0101"]).unwrap();
//!
//! assert_eq!(machine.run(), Status::Halted);
//! assert_eq!(machine.step_count(), 5);
//! ```

pub mod analyzer;
pub mod index;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod tape;
pub mod types;

/// Re-exports the `analyze` function and `AnalysisWarning` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisWarning};
/// Re-exports the `RuleIndex` struct from the index module.
pub use index::RuleIndex;
/// Re-exports the `load` function and `ProgramLoader` struct from the loader module.
pub use loader::{load, ProgramLoader};
/// Re-exports the `TuringMachine` and `Snapshot` structs from the machine module.
pub use machine::{Snapshot, TuringMachine};
/// Re-exports the `parse` and `parse_line` functions from the parser module.
pub use parser::{parse, parse_line};
/// Re-exports `Program`, `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{Program, ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the `Tape` and `TapeWindow` structs from the tape module.
pub use tape::{Tape, TapeWindow};
/// Re-exports the rule, status and error types from the types module.
pub use types::{
    Direction, NextState, ReadSymbol, RuleError, RuleErrors, Status, TokenField, Transition,
    TuringMachineError, WriteSymbol, BLANK_SYMBOL, MAX_EXECUTION_STEPS, MAX_WINDOW_RADIUS,
    WILDCARD,
};
