mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::{fs, io};
use tmsim::{
    analyze, load, parse_line, ProgramManager, Snapshot, Status, TuringMachine,
    MAX_EXECUTION_STEPS,
};
use tracing::{debug, info, warn};

/// Runs a one- or two-tape Turing machine described by rule text.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  tmsim-cli --program scan.tm --input 010011
  tmsim-cli --builtin \"two-tape copy\" --input 1011 --debug
  cat palindrome.tm | tmsim-cli --input 0110")]
struct Cli {
    /// Rule file to execute. Rule text can also be piped via stdin.
    #[clap(short, long, conflicts_with = "builtin")]
    program: Option<PathBuf>,

    /// Run a built-in program by name.
    #[clap(short, long)]
    builtin: Option<String>,

    /// List the built-in programs and exit.
    #[clap(long)]
    list: bool,

    /// Number of tapes (1 or 2). Detected from the first rule when omitted.
    #[clap(short, long)]
    tapes: Option<usize>,

    /// Input for each tape, in order. Spaces are read as blank.
    #[clap(short, long)]
    input: Vec<String>,

    /// Initial state. Defaults to "0", or to the built-in program's start state.
    #[clap(short, long)]
    state: Option<String>,

    /// Stop after this many steps even if the machine has not halted.
    #[clap(long, default_value_t = MAX_EXECUTION_STEPS)]
    max_steps: usize,

    /// Number of cells shown on each side of a head (at most 4096).
    #[clap(short, long, default_value_t = 16)]
    window: usize,

    /// Print each step of the execution.
    #[clap(short = 'd', long)]
    debug: bool,

    /// Stop at the first breakpoint instead of continuing past it.
    #[clap(long)]
    stop_at_breakpoint: bool,

    /// Print the final configuration as JSON.
    #[clap(long)]
    json: bool,
}

/// Everything needed to build a machine.
#[derive(Debug)]
struct Setup {
    text: String,
    tape_count: usize,
    initial_state: String,
    inputs: Vec<String>,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    Halted,
    Stuck,
    Paused,
    StepLimit,
}

impl Outcome {
    fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Halted | Outcome::Paused => ExitCode::SUCCESS,
            Outcome::Stuck => ExitCode::from(2),
            Outcome::StepLimit => ExitCode::from(3),
        }
    }
}

#[derive(Serialize)]
struct Summary {
    outcome: Outcome,
    #[serde(flatten)]
    snapshot: Snapshot,
    contents: Vec<String>,
    last_rule_line: Option<usize>,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Outcome> {
    if cli.list {
        for (i, name) in ProgramManager::list_program_names().iter().enumerate() {
            println!("{i}: {name}");
        }
        return Ok(Outcome::Halted);
    }

    let config = setup(cli)?;
    let index = load(&config.text, config.tape_count).context("failed to load rules")?;

    let mut machine = TuringMachine::new(Arc::new(index), &config.initial_state, &config.inputs)?;
    for warning in analyze(machine.index(), machine.initial_state(), &config.inputs) {
        warn!(%warning, "rule set warning");
    }

    let outcome = execute(&mut machine, cli);

    if cli.json {
        let summary = Summary {
            outcome,
            snapshot: machine.snapshot(cli.window),
            contents: machine.tapes().iter().map(|tape| tape.contents()).collect(),
            last_rule_line: machine.last_transition().map(|t| t.line),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", describe(&machine, outcome, cli.max_steps));
        for tape in machine.tapes() {
            println!("{}", tape.contents());
        }
    }

    Ok(outcome)
}

/// Resolves the rule text, tape count, initial state and inputs from the command line.
fn setup(cli: &Cli) -> Result<Setup> {
    if let Some(name) = &cli.builtin {
        let program = ProgramManager::get_program_by_name(name)?;
        return Ok(Setup {
            text: program.text.to_string(),
            tape_count: cli.tapes.unwrap_or(program.tape_count),
            initial_state: cli
                .state
                .clone()
                .unwrap_or_else(|| program.initial_state.to_string()),
            inputs: if cli.input.is_empty() {
                program.inputs.clone()
            } else {
                cli.input.clone()
            },
        });
    }

    let text = read_source(cli.program.as_deref())?;
    let tape_count = match cli.tapes {
        Some(tapes) => tapes,
        None => detect_tape_count(&text)
            .context("could not detect the tape count from the rules; pass --tapes")?,
    };
    debug!(tape_count, "tape count resolved");

    Ok(Setup {
        text,
        tape_count,
        initial_state: cli.state.clone().unwrap_or_default(),
        inputs: cli.input.clone(),
    })
}

/// Reads rule text from `path`, or from stdin when it is not a terminal.
fn read_source(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        return fs::read_to_string(path)
            .with_context(|| format!("failed to read file '{}'", path.display()));
    }

    if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read from stdin")?;
        return Ok(buffer);
    }

    bail!("no program given: use --program, --builtin, or pipe rules via stdin")
}

/// Guesses the tape count from the first line that declares a rule.
fn detect_tape_count(text: &str) -> Option<usize> {
    for (i, line) in text.lines().enumerate() {
        match parse_line(i + 1, line, 1) {
            Ok(Some(_)) => return Some(1),
            Ok(None) => continue,
            Err(_) => {
                return matches!(parse_line(i + 1, line, 2), Ok(Some(_))).then_some(2);
            }
        }
    }
    None
}

/// Steps the machine until it halts, gets stuck, pauses or hits the step limit.
fn execute(machine: &mut TuringMachine, cli: &Cli) -> Outcome {
    if cli.debug {
        print_state(machine, cli.window);
    }

    for _ in 0..cli.max_steps {
        let status = machine.step();

        if cli.debug && status != Status::Stuck {
            print_step(machine);
            print_state(machine, cli.window);
        }

        match status {
            Status::Running | Status::Ready => continue,
            Status::Paused if !cli.stop_at_breakpoint => {
                info!(step = machine.step_count(), "passing breakpoint");
                continue;
            }
            Status::Paused => return Outcome::Paused,
            Status::Halted => return Outcome::Halted,
            Status::Stuck => return Outcome::Stuck,
        }
    }

    Outcome::StepLimit
}

fn print_step(machine: &TuringMachine) {
    if let Some(rule) = machine.last_transition() {
        println!(
            "{:06}: {}  [line {}]",
            machine.step_count(),
            rule,
            rule.line
        );
    }
}

fn print_state(machine: &TuringMachine, window: usize) {
    println!(
        "State: {}  Steps: {}  Reads: {:?}",
        machine.state(),
        machine.step_count(),
        machine.symbols()
    );
    for (i, tape) in machine.windows(window).iter().enumerate() {
        println!("Tape {}: {}", i + 1, tape.cells);
        println!("        {}", tape.marker());
    }
}

/// A one-line, human-readable account of how the run ended.
fn describe(machine: &TuringMachine, outcome: Outcome, max_steps: usize) -> String {
    match outcome {
        Outcome::Halted => format!(
            "Halted (entered state '{}') after {} steps.",
            machine.state(),
            machine.step_count()
        ),
        Outcome::Stuck => format!(
            "Stuck (no rule for state '{}' reading {:?}) after {} steps.",
            machine.state(),
            machine.symbols(),
            machine.step_count()
        ),
        Outcome::Paused => format!(
            "Paused at breakpoint (line {}) after {} steps.",
            machine.last_transition().map_or(0, |t| t.line),
            machine.step_count()
        ),
        Outcome::StepLimit => format!(
            "Step limit of {max_steps} reached in state '{}'.",
            machine.state()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use tmsim::ProgramLoader;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tmsim-cli").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_detect_tape_count() {
        assert_eq!(detect_tape_count("; one tape\n\n0 0 0 r 0"), Some(1));
        assert_eq!(detect_tape_count("tapes: 2\n0 0 _ 0 0 r r 0 !"), Some(2));
        assert_eq!(detect_tape_count("0 0 r 0"), None);
        assert_eq!(detect_tape_count("; only comments"), None);
    }

    #[test]
    fn test_read_source_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.tm");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"0 0 0 r 0\n0 _ _ * halt\n").unwrap();

        let text = read_source(Some(&path)).unwrap();
        assert_eq!(text, "0 0 0 r 0\n0 _ _ * halt\n");

        let missing = read_source(Some(&dir.path().join("missing.tm")));
        assert!(missing.unwrap_err().to_string().contains("missing.tm"));
    }

    #[test]
    fn test_setup_from_program_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("copy.tm");
        fs::write(&path, "0 1 _ 1 1 r r 0\n0 _ _ _ _ * * halt\n").unwrap();
        let path = path.to_string_lossy().to_string();

        let config = setup(&cli(&["--program", &path, "--input", "11"])).unwrap();
        assert_eq!(config.tape_count, 2);
        assert_eq!(config.initial_state, "");
        assert_eq!(config.inputs, vec!["11".to_string()]);
    }

    #[test]
    fn test_program_file_without_state_has_no_warnings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.tm");
        fs::write(&path, "0 0 0 r 0\n0 1 1 r 0\n0 _ _ * halt\n").unwrap();
        let path = path.to_string_lossy().to_string();

        for args in [
            vec!["--program", path.as_str(), "--input", "01"],
            vec!["--program", path.as_str(), "--input", "01", "--state", "  0 extra"],
        ] {
            let config = setup(&cli(&args)).unwrap();
            let index = load(&config.text, config.tape_count).unwrap();
            let machine =
                TuringMachine::new(Arc::new(index), &config.initial_state, &config.inputs)
                    .unwrap();

            let warnings = analyze(machine.index(), machine.initial_state(), &config.inputs);
            assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
            assert!(analyze(machine.index(), &config.initial_state, &config.inputs).is_empty());
        }
    }

    #[test]
    fn test_setup_from_builtin() {
        let config = setup(&cli(&["--builtin", "binary increment"])).unwrap();
        assert_eq!(config.tape_count, 1);
        assert_eq!(config.initial_state, "0");
        assert_eq!(config.inputs, vec!["1011".to_string()]);
    }

    #[test]
    fn test_setup_overrides_builtin_defaults() {
        let config = setup(&cli(&["--builtin", "binary increment", "--input", "111", "-s", "q"]))
            .unwrap();
        assert_eq!(config.inputs, vec!["111".to_string()]);
        assert_eq!(config.initial_state, "q");
    }

    #[test]
    fn test_execute_outcomes() {
        let mut machine =
            ProgramLoader::load_machine("0 1 1 r 0\n0 _ _ * halt", 1, "0", &["11"]).unwrap();
        assert_eq!(execute(&mut machine, &cli(&[])), Outcome::Halted);

        let mut machine = ProgramLoader::load_machine("0 1 1 r 0", 1, "0", &["12"]).unwrap();
        assert_eq!(execute(&mut machine, &cli(&[])), Outcome::Stuck);

        let mut machine = ProgramLoader::load_machine("0 * * r 0", 1, "0", &[""]).unwrap();
        assert_eq!(
            execute(&mut machine, &cli(&["--max-steps", "50"])),
            Outcome::StepLimit
        );
        assert_eq!(machine.step_count(), 50);
    }

    #[test]
    fn test_execute_breakpoints() {
        let rules = "0 1 x r 0 !\n0 _ _ * halt";

        let mut machine = ProgramLoader::load_machine(rules, 1, "0", &["11"]).unwrap();
        assert_eq!(execute(&mut machine, &cli(&[])), Outcome::Halted);
        assert_eq!(machine.tapes()[0].contents(), "xx");

        let mut machine = ProgramLoader::load_machine(rules, 1, "0", &["11"]).unwrap();
        assert_eq!(
            execute(&mut machine, &cli(&["--stop-at-breakpoint"])),
            Outcome::Paused
        );
        assert_eq!(machine.step_count(), 1);
    }

    #[test]
    fn test_describe() {
        let mut machine = ProgramLoader::load_machine("0 1 1 r 0", 1, "0", &["1"]).unwrap();
        let outcome = execute(&mut machine, &cli(&[]));

        assert_eq!(
            describe(&machine, outcome, 10),
            "Stuck (no rule for state '0' reading ['_']) after 1 steps."
        );
    }
}
