//! This module provides the parser for rule text, utilizing the `pest` crate.
//! The grammar in `grammar.pest` splits each line into tokens; this module then checks the
//! token count against the tape count and turns the tokens into a `Transition`.
//!
//! Parsing never stops at the first bad line. Every line is visited so that callers can
//! report all errors at once.

use crate::types::{
    rule_arity, Direction, NextState, ReadSymbol, RuleError, RuleErrors, TokenField, Transition,
    TuringMachineError, WriteSymbol, BREAKPOINT_MARKER, MAX_TAPES,
};
use pest::Parser as PestParser;
use pest_derive::Parser as PestParser;
use tracing::{debug, trace};

/// Derives a `PestParser` for the rule line grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct RuleParser;

/// The shape of a single line of rule text after tokenization.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// Blank or comment-only line.
    Empty,
    /// A `key: value` header line, ignored by the simulator.
    Directive(&'a str),
    /// A candidate rule.
    Tokens(Vec<&'a str>),
}

/// Parses a whole rule text for a machine with `tape_count` tapes.
///
/// Blank lines, comments and directive lines produce nothing. Every other line must be a
/// valid rule; all invalid lines are collected and returned together.
///
/// # Returns
///
/// * `Ok(Vec<Transition>)` with the rules in declaration order.
/// * `Err(TuringMachineError::UnsupportedTapeCount)` if `tape_count` is not 1 or 2.
/// * `Err(TuringMachineError::InvalidRules)` if any line failed to parse.
pub fn parse(input: &str, tape_count: usize) -> Result<Vec<Transition>, TuringMachineError> {
    check_tape_count(tape_count)?;

    let mut transitions = Vec::new();
    let mut errors = Vec::new();

    for (i, text) in input.lines().enumerate() {
        match parse_line(i + 1, text, tape_count) {
            Ok(Some(transition)) => transitions.push(transition),
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        debug!(errors = errors.len(), "rule text rejected");
        return Err(TuringMachineError::InvalidRules(RuleErrors(errors)));
    }

    Ok(transitions)
}

/// Parses one line of rule text. `line` is the 1-based line number used in errors.
///
/// Returns `Ok(None)` for lines that declare no rule.
pub fn parse_line(
    line: usize,
    text: &str,
    tape_count: usize,
) -> Result<Option<Transition>, RuleError> {
    match tokenize(line, text)? {
        Line::Empty => Ok(None),
        Line::Directive(directive) => {
            debug!(line, directive, "ignoring directive line");
            Ok(None)
        }
        Line::Tokens(tokens) => parse_tokens(line, text, &tokens, tape_count).map(Some),
    }
}

/// Rejects tape counts other than 1 or 2.
pub(crate) fn check_tape_count(tape_count: usize) -> Result<(), TuringMachineError> {
    if tape_count == 0 || tape_count > MAX_TAPES {
        return Err(TuringMachineError::UnsupportedTapeCount(tape_count));
    }
    Ok(())
}

/// Runs the grammar over a single line.
fn tokenize(line: usize, text: &str) -> Result<Line<'_>, RuleError> {
    let root = RuleParser::parse(Rule::line, text)
        .map_err(|e| RuleError::Syntax {
            line,
            source: Box::new(e),
        })?
        .next();

    let Some(root) = root else {
        return Ok(Line::Empty);
    };

    let mut tokens = Vec::new();
    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::directive => return Ok(Line::Directive(pair.as_str().trim())),
            Rule::token => tokens.push(pair.as_str()),
            _ => {} // EOI
        }
    }

    if tokens.is_empty() {
        Ok(Line::Empty)
    } else {
        Ok(Line::Tokens(tokens))
    }
}

/// Turns the tokens of one line into a `Transition`.
///
/// Token layout: `state reads.. writes.. moves.. next [!]`, one read, write and move per tape.
fn parse_tokens(
    line: usize,
    text: &str,
    tokens: &[&str],
    tape_count: usize,
) -> Result<Transition, RuleError> {
    let arity = rule_arity(tape_count);
    let found = tokens.len();

    let (tokens, breakpoint) = match tokens.split_last() {
        Some((&last, rest)) if found == arity + 1 && last == BREAKPOINT_MARKER => (rest, true),
        _ => (tokens, false),
    };

    if tokens.len() != arity {
        return Err(RuleError::MalformedRule {
            line,
            text: text.trim().to_string(),
            expected: arity,
            found,
        });
    }

    let k = tape_count;
    let mut read = Vec::with_capacity(k);
    let mut write = Vec::with_capacity(k);
    let mut directions = Vec::with_capacity(k);

    for tape in 0..k {
        let token = tokens[1 + tape];
        read.push(ReadSymbol::from(parse_symbol(
            line,
            text,
            token,
            TokenField::Read(tape),
        )?));
    }
    for tape in 0..k {
        let token = tokens[1 + k + tape];
        write.push(WriteSymbol::from(parse_symbol(
            line,
            text,
            token,
            TokenField::Write(tape),
        )?));
    }
    for tape in 0..k {
        let token = tokens[1 + 2 * k + tape];
        let direction = Direction::from_token(token)
            .ok_or_else(|| invalid_token(line, text, token, TokenField::Move(tape)))?;
        directions.push(direction);
    }

    let transition = Transition {
        state: tokens[0].to_string(),
        read,
        write,
        directions,
        next_state: NextState::from(tokens[arity - 1]),
        breakpoint,
        line,
    };
    trace!(line, rule = %transition, "parsed rule");

    Ok(transition)
}

/// Parses a read or write token: exactly one printable character.
fn parse_symbol(
    line: usize,
    text: &str,
    token: &str,
    field: TokenField,
) -> Result<char, RuleError> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Ok(c),
        _ => Err(invalid_token(line, text, token, field)),
    }
}

/// Creates a `RuleError::InvalidToken` for `token` on the given line.
fn invalid_token(line: usize, text: &str, token: &str, field: TokenField) -> RuleError {
    RuleError::InvalidToken {
        line,
        text: text.trim().to_string(),
        token: token.to_string(),
        field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_of(result: Result<Vec<Transition>, TuringMachineError>) -> Vec<RuleError> {
        match result {
            Err(TuringMachineError::InvalidRules(errors)) => errors.0,
            other => panic!("Expected InvalidRules, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_single_tape_program() {
        let input = "; scan right\n\n0 0 0 r 0\n0 1 1 r 0\n0 _ _ * halt\n";

        let rules = parse(input, 1).unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(
            rules[0],
            Transition {
                state: "0".into(),
                read: vec![ReadSymbol::Exact('0')],
                write: vec![WriteSymbol::Put('0')],
                directions: vec![Direction::Right],
                next_state: NextState::Named("0".into()),
                breakpoint: false,
                line: 3,
            }
        );
        assert_eq!(rules[2].read, vec![ReadSymbol::Exact('_')]);
        assert_eq!(rules[2].directions, vec![Direction::Stay]);
        assert_eq!(rules[2].line, 5);
    }

    #[test]
    fn test_parse_two_tape_rule() {
        let rules = parse("0 1 _ 1 1 r r 0", 2).unwrap();
        let rule = &rules[0];

        assert_eq!(rule.read, vec![ReadSymbol::Exact('1'), ReadSymbol::Exact('_')]);
        assert_eq!(rule.write, vec![WriteSymbol::Put('1'), WriteSymbol::Put('1')]);
        assert_eq!(rule.directions, vec![Direction::Right, Direction::Right]);
        assert_eq!(rule.next_state, NextState::Named("0".into()));
    }

    #[test]
    fn test_parse_wildcards() {
        let rules = parse("scan * * l *", 1).unwrap();
        let rule = &rules[0];

        assert_eq!(rule.read, vec![ReadSymbol::Any]);
        assert_eq!(rule.write, vec![WriteSymbol::Keep]);
        assert_eq!(rule.directions, vec![Direction::Left]);
        assert_eq!(rule.next_state, NextState::Same);
    }

    #[test]
    fn test_parse_breakpoint() {
        let rules = parse("0 0 1 r 1 !\n1 _ _ * halt", 1).unwrap();
        assert!(rules[0].breakpoint);
        assert!(!rules[1].breakpoint);

        let rules = parse("0 0 _ 0 0 r r 0 !", 2).unwrap();
        assert!(rules[0].breakpoint);
    }

    #[test]
    fn test_parse_multi_character_states() {
        let rules = parse("check-left 1 1 * halt-accept", 1).unwrap();
        assert_eq!(rules[0].state, "check-left");
        assert_eq!(rules[0].next_state, NextState::Named("halt-accept".into()));
    }

    #[test]
    fn test_parse_splits_on_unicode_whitespace() {
        let rules = parse("0 0 0 r 0\u{0c}", 1).unwrap();
        assert_eq!(rules[0].next_state, NextState::Named("0".into()));

        let rules = parse("0\u{a0}1 1\u{2003}r\u{0b}halt", 1).unwrap();
        assert_eq!(rules[0].state, "0");
        assert_eq!(rules[0].read, vec![ReadSymbol::Exact('1')]);
        assert_eq!(rules[0].directions, vec![Direction::Right]);
        assert_eq!(rules[0].next_state, NextState::Named("halt".into()));
    }

    #[test]
    fn test_parse_inline_comment_and_whitespace() {
        let rules = parse("   0 1 1 r 0   ; keep scanning\n\t;\t indented comment", 1).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].next_state, NextState::Named("0".into()));

        // A comment glued to the last token still ends the rule.
        let rules = parse("0 1 1 r 0;note", 1).unwrap();
        assert_eq!(rules[0].next_state, NextState::Named("0".into()));
    }

    #[test]
    fn test_parse_skips_directives() {
        let input = "tapes: 2\nStart: 0\ninitial_tape: 0110\n0 0 _ 0 0 r r 0";
        let rules = parse(input, 2).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].line, 4);

        // A state that merely starts with a directive keyword is still a rule.
        let rules = parse("start 0 0 r start", 1).unwrap();
        assert_eq!(rules[0].state, "start");
    }

    #[test]
    fn test_parse_malformed_token_count() {
        let errors = errors_of(parse("0 0 0 r 0\n0 1 r 0\n", 1));

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0],
            RuleError::MalformedRule {
                line: 2,
                text: "0 1 r 0".into(),
                expected: 5,
                found: 4,
            }
        );
    }

    #[test]
    fn test_parse_extra_token_that_is_not_breakpoint() {
        let errors = errors_of(parse("0 0 0 r 0 x", 1));
        assert!(matches!(
            errors[0],
            RuleError::MalformedRule {
                line: 1,
                found: 6,
                ..
            }
        ));

        // Two-tape arity applied to a one-tape line.
        let errors = errors_of(parse("0 0 0 r 0", 2));
        assert!(matches!(
            errors[0],
            RuleError::MalformedRule {
                expected: 8,
                found: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_collects_every_error() {
        let input = "0 0 0 r\n0 1 1 r 0\n0 ab 1 r 0\n0 1 1 x 0\n0 _ _ * halt";
        let errors = errors_of(parse(input, 1));

        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.iter().map(RuleError::line).collect::<Vec<_>>(),
            vec![1, 3, 4]
        );
    }

    #[test]
    fn test_parse_invalid_symbol_token() {
        let errors = errors_of(parse("0 0 10 r 0", 1));

        assert_eq!(
            errors[0],
            RuleError::InvalidToken {
                line: 1,
                text: "0 0 10 r 0".into(),
                token: "10".into(),
                field: TokenField::Write(0),
            }
        );
        assert!(errors[0].to_string().contains("write symbol for tape 1"));
    }

    #[test]
    fn test_parse_invalid_move_token() {
        let errors = errors_of(parse("0 0 _ 0 0 r R 0", 2));

        assert!(matches!(
            &errors[0],
            RuleError::InvalidToken { token, field: TokenField::Move(1), .. } if token == "R"
        ));
    }

    #[test]
    fn test_parse_unsupported_tape_count() {
        assert_eq!(
            parse("0 0 0 r 0", 3),
            Err(TuringMachineError::UnsupportedTapeCount(3))
        );
        assert_eq!(
            parse("", 0),
            Err(TuringMachineError::UnsupportedTapeCount(0))
        );
    }

    #[test]
    fn test_parse_empty_text() {
        assert_eq!(parse("", 1).unwrap(), Vec::new());
        assert_eq!(parse("; nothing here\n\n", 2).unwrap(), Vec::new());
    }

    #[test]
    fn test_tokenize_lines() {
        assert_eq!(tokenize(1, "").unwrap(), Line::Empty);
        assert_eq!(tokenize(1, "  ; hi").unwrap(), Line::Empty);
        assert_eq!(
            tokenize(1, "blank : _").unwrap(),
            Line::Directive("blank : _")
        );
        assert_eq!(
            tokenize(1, "a b  c").unwrap(),
            Line::Tokens(vec!["a", "b", "c"])
        );
    }
}
