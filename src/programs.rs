//! Built-in sample programs, embedded at compile time from `demos/`.

use crate::index::RuleIndex;
use crate::loader::ProgramLoader;
use crate::machine::TuringMachine;
use crate::types::TuringMachineError;
use std::sync::Arc;
use tracing::warn;

/// Where a built-in program comes from and how it is meant to be run.
struct ProgramSource {
    name: &'static str,
    tape_count: usize,
    initial_state: &'static str,
    inputs: &'static [&'static str],
    text: &'static str,
}

// Default embedded programs
const PROGRAM_SOURCES: [ProgramSource; 5] = [
    ProgramSource {
        name: "Scan right",
        tape_count: 1,
        initial_state: "0",
        inputs: &["010011"],
        text: include_str!("../demos/scan-right.tm"),
    },
    ProgramSource {
        name: "Binary increment",
        tape_count: 1,
        initial_state: "0",
        inputs: &["1011"],
        text: include_str!("../demos/binary-increment.tm"),
    },
    ProgramSource {
        name: "Palindrome checker",
        tape_count: 1,
        initial_state: "0",
        inputs: &["0110"],
        text: include_str!("../demos/palindrome.tm"),
    },
    ProgramSource {
        name: "Two-tape copy",
        tape_count: 2,
        initial_state: "0",
        inputs: &["0110"],
        text: include_str!("../demos/two-tape-copy.tm"),
    },
    ProgramSource {
        name: "Two-tape reverse",
        tape_count: 2,
        initial_state: "0",
        inputs: &["0111"],
        text: include_str!("../demos/two-tape-reverse.tm"),
    },
];

/// A parsed built-in program together with its suggested run configuration.
#[derive(Debug, Clone)]
pub struct Program {
    pub name: &'static str,
    pub tape_count: usize,
    pub initial_state: &'static str,
    pub inputs: Vec<String>,
    pub text: &'static str,
    pub index: Arc<RuleIndex>,
}

impl Program {
    /// Creates a fresh machine running this program on its sample input.
    pub fn machine(&self) -> Result<TuringMachine, TuringMachineError> {
        TuringMachine::new(Arc::clone(&self.index), self.initial_state, &self.inputs)
    }

    /// Creates a fresh machine running this program on the given inputs.
    pub fn machine_with_inputs<S: AsRef<str>>(
        &self,
        inputs: &[S],
    ) -> Result<TuringMachine, TuringMachineError> {
        TuringMachine::new(Arc::clone(&self.index), self.initial_state, inputs)
    }
}

lazy_static::lazy_static! {
    pub static ref PROGRAMS: Vec<Program> = load_programs();
}

fn load_programs() -> Vec<Program> {
    let mut programs = Vec::new();

    for source in &PROGRAM_SOURCES {
        match ProgramLoader::load(source.text, source.tape_count) {
            Ok(index) => programs.push(Program {
                name: source.name,
                tape_count: source.tape_count,
                initial_state: source.initial_state,
                inputs: source.inputs.iter().map(|s| s.to_string()).collect(),
                text: source.text,
                index: Arc::new(index),
            }),
            Err(e) => warn!(program = source.name, error = %e, "failed to parse built-in program"),
        }
    }

    programs
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        PROGRAMS.len()
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<&'static Program, TuringMachineError> {
        PROGRAMS
            .get(index)
            .ok_or_else(|| TuringMachineError::ProgramNotFound(format!("index {index}")))
    }

    /// Get a program by its name, ignoring case
    pub fn get_program_by_name(name: &str) -> Result<&'static Program, TuringMachineError> {
        PROGRAMS
            .iter()
            .find(|program| program.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| TuringMachineError::ProgramNotFound(name.to_string()))
    }

    /// List all program names
    pub fn list_program_names() -> Vec<&'static str> {
        PROGRAMS.iter().map(|program| program.name).collect()
    }

    /// Get information about a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, TuringMachineError> {
        let program = Self::get_program_by_index(index)?;

        Ok(ProgramInfo {
            index,
            name: program.name.to_string(),
            tape_count: program.tape_count,
            initial_state: program.initial_state.to_string(),
            inputs: program.inputs.clone(),
            state_count: program.index.states().len(),
            transition_count: program.index.len(),
        })
    }

    /// Search for programs by name
    pub fn search_programs(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();

        PROGRAMS
            .iter()
            .enumerate()
            .filter(|(_, program)| program.name.to_lowercase().contains(&query))
            .map(|(index, _)| index)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub tape_count: usize,
    pub initial_state: String,
    pub inputs: Vec<String>,
    pub state_count: usize,
    pub transition_count: usize,
}
