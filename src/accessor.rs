//! Document access and style painting
//!
//! A `Document` owns the text plus the three derived per-position /
//! per-line arrays: style codes, packed line states and packed fold
//! levels. The arrays live as long as the document and are mutated
//! incrementally by each re-lex call.
//!
//! An `Accessor` is the scanner's window onto a document during one
//! scan call: random-access reads plus the forward-only paint cursor
//! (`colour_to`). Within one call, successive paint end positions are
//! non-decreasing and their union covers exactly the requested range.

use crate::style::{self, Style};

/// A document with its derived style, line-state and fold-level arrays
#[derive(Debug, Clone, Default)]
pub struct Document {
    text: String,
    /// Byte offset of each line start; `line_starts[0] == 0`
    line_starts: Vec<usize>,
    styles: Vec<Style>,
    line_states: Vec<i32>,
    fold_levels: Vec<i32>,
}

impl Document {
    pub fn new(text: &str) -> Self {
        let mut doc = Self::default();
        doc.set_text(text);
        doc
    }

    /// Replace the whole text, resetting all derived arrays
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.styles = vec![style::DEFAULT; self.text.len()];
        self.rebuild_line_index();
        let lines = self.line_starts.len();
        self.line_states = vec![0; lines];
        self.fold_levels = vec![0; lines];
    }

    /// Apply an edit: `deleted` bytes at `pos` are replaced by `inserted`.
    ///
    /// Derived values outside the edited lines are preserved (shifted if
    /// the edit changed the line count), so a following bounded rescan
    /// only needs to recompute the affected region.
    pub fn apply_edit(&mut self, pos: usize, deleted: usize, inserted: &str) {
        let pos = pos.min(self.text.len());
        let deleted = deleted.min(self.text.len() - pos);
        let first_line = self.line_of(pos);
        let last_deleted_line = self.line_of(pos + deleted);

        self.text.replace_range(pos..pos + deleted, inserted);
        self.styles.splice(
            pos..pos + deleted,
            std::iter::repeat(style::DEFAULT).take(inserted.len()),
        );
        self.rebuild_line_index();

        let new_count = self.line_starts.len();
        let inserted_lines = inserted.bytes().filter(|&b| b == b'\n').count();
        let last_new_line = first_line + inserted_lines;

        let mut states = Vec::with_capacity(new_count);
        let mut levels = Vec::with_capacity(new_count);
        states.extend_from_slice(&self.line_states[..first_line.min(self.line_states.len())]);
        levels.extend_from_slice(&self.fold_levels[..first_line.min(self.fold_levels.len())]);
        // Lines touched by the edit are recomputed by the next scan
        states.resize((last_new_line + 1).min(new_count), 0);
        levels.resize((last_new_line + 1).min(new_count), 0);
        if last_deleted_line + 1 < self.line_states.len() {
            states.extend_from_slice(&self.line_states[last_deleted_line + 1..]);
            levels.extend_from_slice(&self.fold_levels[last_deleted_line + 1..]);
        }
        states.resize(new_count, 0);
        levels.resize(new_count, 0);
        states.truncate(new_count);
        levels.truncate(new_count);
        self.line_states = states;
        self.fold_levels = levels;
    }

    fn rebuild_line_index(&mut self) {
        self.line_starts.clear();
        self.line_starts.push(0);
        for (i, b) in self.text.bytes().enumerate() {
            if b == b'\n' {
                self.line_starts.push(i + 1);
            }
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Character at `pos`; a space sentinel past end of document, never fails
    pub fn char_at(&self, pos: usize) -> char {
        self.text.as_bytes().get(pos).map(|&b| b as char).unwrap_or(' ')
    }

    pub fn style_at(&self, pos: usize) -> Style {
        self.styles.get(pos).copied().unwrap_or(style::DEFAULT)
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub(crate) fn set_style(&mut self, pos: usize, style: Style) {
        if let Some(slot) = self.styles.get_mut(pos) {
            *slot = style;
        }
    }

    /// Line containing `pos` (the last line for positions past the end)
    pub fn line_of(&self, pos: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= pos) - 1
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts.get(line).copied().unwrap_or(self.text.len())
    }

    /// One past the last byte of `line`, including its newline
    pub fn line_end(&self, line: usize) -> usize {
        self.line_start(line + 1)
    }

    /// Text of `line` without its trailing newline
    pub fn line_text(&self, line: usize) -> &str {
        let start = self.line_start(line);
        let mut end = self.line_end(line);
        while end > start {
            let b = self.text.as_bytes()[end - 1];
            if b == b'\n' || b == b'\r' {
                end -= 1;
            } else {
                break;
            }
        }
        &self.text[start..end]
    }

    pub fn line_state(&self, line: usize) -> i32 {
        self.line_states.get(line).copied().unwrap_or(0)
    }

    pub fn set_line_state(&mut self, line: usize, state: i32) {
        if let Some(slot) = self.line_states.get_mut(line) {
            *slot = state;
        }
    }

    pub fn line_states(&self) -> &[i32] {
        &self.line_states
    }

    pub fn fold_level(&self, line: usize) -> i32 {
        self.fold_levels.get(line).copied().unwrap_or(0)
    }

    pub fn set_fold_level(&mut self, line: usize, level: i32) {
        if let Some(slot) = self.fold_levels.get_mut(line) {
            *slot = level;
        }
    }

    pub fn fold_levels(&self) -> &[i32] {
        &self.fold_levels
    }
}

/// The scanner's view of a document for one scan call
pub struct Accessor<'a> {
    doc: &'a mut Document,
    start: usize,
    end: usize,
    /// Next unpainted position
    painted: usize,
}

impl<'a> Accessor<'a> {
    pub fn new(doc: &'a mut Document, start: usize, length: usize) -> Self {
        let start = start.min(doc.len());
        let end = (start + length).min(doc.len());
        Self { doc, start, end, painted: start }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// End of the scan range, exclusive
    pub fn end(&self) -> usize {
        self.end
    }

    /// Read-only view of the underlying document (resync heuristics)
    pub fn document(&self) -> &Document {
        self.doc
    }

    pub fn char_at(&self, pos: usize) -> char {
        self.doc.char_at(pos)
    }

    pub fn style_at(&self, pos: usize) -> Style {
        self.doc.style_at(pos)
    }

    /// Literal byte-for-byte match at `pos`
    pub fn matches(&self, pos: usize, literal: &str) -> bool {
        let bytes = self.doc.text.as_bytes();
        match bytes.get(pos..pos + literal.len()) {
            Some(slice) => slice == literal.as_bytes(),
            None => false,
        }
    }

    /// ASCII case-insensitive match at `pos` (markup tag and attribute names)
    pub fn matches_nocase(&self, pos: usize, literal: &str) -> bool {
        let bytes = self.doc.text.as_bytes();
        match bytes.get(pos..pos + literal.len()) {
            Some(slice) => slice.eq_ignore_ascii_case(literal.as_bytes()),
            None => false,
        }
    }

    pub fn text_range(&self, start: usize, end: usize) -> &str {
        let start = start.min(self.doc.len());
        let end = end.clamp(start, self.doc.len());
        &self.doc.text[start..end]
    }

    pub fn line_of(&self, pos: usize) -> usize {
        self.doc.line_of(pos)
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.doc.line_start(line)
    }

    pub fn line_end(&self, line: usize) -> usize {
        self.doc.line_end(line)
    }

    pub fn line_count(&self) -> usize {
        self.doc.line_count()
    }

    pub fn line_text(&self, line: usize) -> &str {
        self.doc.line_text(line)
    }

    pub fn line_state(&self, line: usize) -> i32 {
        self.doc.line_state(line)
    }

    pub fn set_line_state(&mut self, line: usize, state: i32) {
        self.doc.set_line_state(line, state);
    }

    pub fn level(&self, line: usize) -> i32 {
        self.doc.fold_level(line)
    }

    pub fn set_level(&mut self, line: usize, level: i32) {
        self.doc.set_fold_level(line, level);
    }

    /// Paint `[next-unpainted, end_inclusive]` with `style` and advance
    /// the paint cursor. End positions must not move backwards; an
    /// already-reached end is a no-op (empty run).
    pub fn colour_to(&mut self, end_inclusive: usize, style: Style) {
        let end = (end_inclusive + 1).min(self.end);
        debug_assert!(
            end + 1 > self.painted,
            "paint cursor moved backwards: {} < {}",
            end,
            self.painted
        );
        if end <= self.painted {
            return;
        }
        for pos in self.painted..end {
            self.doc.styles[pos] = style;
        }
        self.painted = end;
    }

    /// Verify the requested range was painted exactly once
    pub fn flush(&self) {
        debug_assert_eq!(
            self.painted, self.end,
            "scan did not cover its range: painted to {}, end {}",
            self.painted, self.end
        );
    }
}
