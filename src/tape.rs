//! A bi-infinite tape of single-character cells.
//!
//! Only non-blank cells are stored. Reading any other position yields the blank symbol, so a
//! tape never runs out in either direction.

use crate::types::{BLANK_SYMBOL, MAX_WINDOW_RADIUS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

/// A bi-infinite tape addressed by signed position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tape {
    cells: BTreeMap<i64, char>,
}

impl Tape {
    /// Creates an all-blank tape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds positions `0..len` with the characters of `input`.
    ///
    /// Spaces in the input are treated as blank.
    pub fn from_input(input: &str) -> Self {
        let mut tape = Self::new();
        for (pos, c) in (0..).zip(input.chars()) {
            let symbol = if c == ' ' { BLANK_SYMBOL } else { c };
            tape.write(pos, symbol);
        }
        tape
    }

    /// Reads the symbol at `pos`. Unwritten cells are blank.
    pub fn read(&self, pos: i64) -> char {
        self.cells.get(&pos).copied().unwrap_or(BLANK_SYMBOL)
    }

    /// Writes `symbol` at `pos`. Writing blank erases the cell.
    pub fn write(&mut self, pos: i64, symbol: char) {
        if symbol == BLANK_SYMBOL {
            self.cells.remove(&pos);
        } else {
            self.cells.insert(pos, symbol);
        }
    }

    /// Returns `true` if every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.is_empty()
    }

    /// Leftmost and rightmost non-blank positions, if any.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        let first = self.cells.keys().next()?;
        let last = self.cells.keys().next_back()?;
        Some((*first, *last))
    }

    /// Renders the symbols in `range`, blank cells included.
    pub fn render(&self, range: RangeInclusive<i64>) -> String {
        range.map(|pos| self.read(pos)).collect()
    }

    /// The span from the leftmost to the rightmost non-blank cell.
    ///
    /// An all-blank tape renders as the empty string.
    pub fn contents(&self) -> String {
        match self.bounds() {
            Some((first, last)) => self.render(first..=last),
            None => String::new(),
        }
    }

    /// A display window of `radius` cells on each side of `head`.
    ///
    /// The radius is capped at [`MAX_WINDOW_RADIUS`].
    pub fn window(&self, head: i64, radius: usize) -> TapeWindow {
        let radius = radius.min(MAX_WINDOW_RADIUS) as i64;
        let start = head.saturating_sub(radius);
        let end = head.saturating_add(radius);

        TapeWindow {
            start,
            head,
            cells: self.render(start..=end),
        }
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.contents())
    }
}

/// A contiguous slice of a tape around a head, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeWindow {
    /// Tape position of the first cell in `cells`.
    pub start: i64,
    /// Tape position of the head.
    pub head: i64,
    /// The symbols in the window, one char per cell.
    pub cells: String,
}

impl TapeWindow {
    /// Offset of the head within `cells`.
    pub fn head_offset(&self) -> usize {
        usize::try_from(self.head - self.start).unwrap_or(0)
    }

    /// A line with a `^` under the head cell, to print below `cells`.
    pub fn marker(&self) -> String {
        format!("{}^", " ".repeat(self.head_offset()))
    }
}

impl fmt::Display for TapeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.cells, self.marker())
    }
}
