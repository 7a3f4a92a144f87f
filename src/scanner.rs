//! Generic per-language scanner contract
//!
//! Every language implements `Lexer`: a forward character-by-character
//! state machine that paints style runs over the accessor's range, and
//! a folder that derives fold levels from the resulting style stream.
//! The scan range and paint cursor live in the `Accessor`; `Run` is
//! the sweep cursor the scanners drive.
//!
//! Scanners never fail. A malformed construct gets an error style and
//! the state resets to default at the next line; only the multi-line
//! constructs tracked in the per-line state can carry forward.

use crate::accessor::{Accessor, Document};
use crate::config::PropertySet;
use crate::style::Style;
use crate::words::WordList;

/// A per-language lexical scanner and folder
pub trait Lexer {
    /// Registry name of this lexer
    fn name(&self) -> &'static str;

    /// Paint style runs over the accessor's range. `init_style` is the
    /// style in force immediately before the range (default at document
    /// start); keyword sets and properties are read-only.
    fn scan(
        &self,
        init_style: Style,
        words: &[WordList],
        props: &PropertySet,
        acc: &mut Accessor,
    );

    /// Derive fold levels for the lines covered by the accessor's
    /// range, consuming the style stream produced by `scan`.
    fn fold(
        &self,
        init_style: Style,
        words: &[WordList],
        props: &PropertySet,
        acc: &mut Accessor,
    );

    /// Move a requested restart position back to a position this lexer
    /// can resume from. The default treats every line start as safe,
    /// which holds whenever the line state plus the previous line's
    /// final style fully determine the scanner state.
    fn backtrack(&self, doc: &Document, pos: usize) -> usize {
        doc.line_start(doc.line_of(pos))
    }
}

/// Forward sweep cursor over an accessor's range
///
/// Tracks the current, next and previous characters, accumulates one
/// pending style run, and commits runs through the accessor's paint
/// cursor. `set_style` closes the pending run before the current
/// position; `change_style` retroactively reclassifies the pending run
/// (used once a whole token has been seen).
pub struct Run<'r, 'doc> {
    acc: &'r mut Accessor<'doc>,
    pub pos: usize,
    end: usize,
    pub ch: char,
    pub ch_next: char,
    pub ch_prev: char,
    pub at_line_start: bool,
    style: Style,
}

impl<'r, 'doc> Run<'r, 'doc> {
    pub fn new(acc: &'r mut Accessor<'doc>, init_style: Style) -> Self {
        let pos = acc.start();
        let end = acc.end();
        let ch = acc.char_at(pos);
        let ch_next = acc.char_at(pos + 1);
        let ch_prev = if pos > 0 { acc.char_at(pos - 1) } else { '\n' };
        let at_line_start = pos == acc.line_start(acc.line_of(pos));
        Self { acc, pos, end, ch, ch_next, ch_prev, at_line_start, style: init_style }
    }

    /// Whether the sweep still has characters in range
    pub fn more(&self) -> bool {
        self.pos < self.end
    }

    /// Advance one character
    pub fn forward(&mut self) {
        self.ch_prev = self.ch;
        self.pos += 1;
        self.ch = self.acc.char_at(self.pos);
        self.ch_next = self.acc.char_at(self.pos + 1);
        self.at_line_start =
            self.ch_prev == '\n' || (self.ch_prev == '\r' && self.ch != '\n');
    }

    /// Advance `n` characters (look-ahead swallow for escapes and
    /// multi-character operators)
    pub fn forward_n(&mut self, n: usize) {
        for _ in 0..n {
            self.forward();
        }
    }

    /// Whether the current character is the last of its line's EOL
    pub fn at_line_end(&self) -> bool {
        self.ch == '\n' || (self.ch == '\r' && self.ch_next != '\n')
    }

    /// Close the pending run before the current position and start a
    /// new run with `style`
    pub fn set_style(&mut self, style: Style) {
        if self.pos > 0 {
            self.acc.colour_to(self.pos - 1, self.style);
        }
        self.style = style;
    }

    /// Retroactively reclassify the pending run (token classification
    /// after its boundary is reached)
    pub fn change_style(&mut self, style: Style) {
        self.style = style;
    }

    /// Style of the pending run
    pub fn style(&self) -> Style {
        self.style
    }

    /// Paint the remainder of the range with the pending style and
    /// verify coverage
    pub fn finish(self) {
        if self.end > 0 {
            self.acc.colour_to(self.end - 1, self.style);
        }
        self.acc.flush();
    }

    /// Read-only view of the document (resync heuristics)
    pub fn document(&self) -> &crate::accessor::Document {
        self.acc.document()
    }

    pub fn matches(&self, literal: &str) -> bool {
        self.acc.matches(self.pos, literal)
    }

    pub fn matches_nocase(&self, literal: &str) -> bool {
        self.acc.matches_nocase(self.pos, literal)
    }

    pub fn char_at(&self, pos: usize) -> char {
        self.acc.char_at(pos)
    }

    pub fn text_range(&self, start: usize, end: usize) -> &str {
        self.acc.text_range(start, end)
    }

    /// Text from `start` to the current position
    pub fn token_since(&self, start: usize) -> &str {
        self.acc.text_range(start, self.pos)
    }

    pub fn line_of(&self, pos: usize) -> usize {
        self.acc.line_of(pos)
    }

    pub fn current_line(&self) -> usize {
        self.acc.line_of(self.pos)
    }

    pub fn line_start_of(&self, line: usize) -> usize {
        self.acc.line_start(line)
    }

    pub fn line_end_of(&self, line: usize) -> usize {
        self.acc.line_end(line)
    }

    pub fn line_text(&self, line: usize) -> &str {
        self.acc.line_text(line)
    }

    pub fn line_state(&self, line: usize) -> i32 {
        self.acc.line_state(line)
    }

    pub fn set_line_state(&mut self, line: usize, state: i32) {
        self.acc.set_line_state(line, state);
    }
}

/// Word-start predicate shared by the C-like scanners: letters,
/// underscore, and anything outside ASCII
pub fn is_word_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || !ch.is_ascii()
}

/// Word-continuation predicate shared by the C-like scanners
pub fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || !ch.is_ascii()
}

/// Blank predicate (space or tab)
pub fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}
