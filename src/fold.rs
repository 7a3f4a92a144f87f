//! Fold level derivation
//!
//! Fold levels are packed per line as `current | next << 16` plus flag
//! bits, with levels biased by `FOLD_BASE` so underflow on malformed
//! input stays representable. A line's level can only be committed
//! once its own effect on the following line is known, so folders run
//! a `FoldContext` that carries `(current, min-seen, next)` across the
//! line and commits at each line end.
//!
//! Folders consume the style stream: a brace inside a string or
//! comment style never moves the level.

use crate::accessor::Accessor;

/// Base level; all real levels are `>= FOLD_BASE`
pub const FOLD_BASE: i32 = 0x400;

/// Mask for the level number within the low word
pub const LEVEL_MASK: i32 = 0x0FFF;

/// The line is blank or whitespace-only (compaction policy)
pub const FLAG_WHITE: i32 = 0x1000;

/// The line opens a deeper level and has visible content
pub const FLAG_HEADER: i32 = 0x2000;

/// Level number of a packed per-line value
pub fn level_number(level: i32) -> i32 {
    level & LEVEL_MASK
}

/// Level the following line starts at
pub fn next_level(level: i32) -> i32 {
    (level >> 16) & LEVEL_MASK
}

pub fn is_header(level: i32) -> bool {
    level & FLAG_HEADER != 0
}

pub fn is_white(level: i32) -> bool {
    level & FLAG_WHITE != 0
}

/// Per-line fold state carried across one fold pass
pub struct FoldContext<'r, 'doc> {
    acc: &'r mut Accessor<'doc>,
    pub line: usize,
    /// Minimum level reached on the current line before any opening
    /// token; makes `"} else {"` a single same-level header instead of
    /// a drop-then-rise
    level_min: i32,
    /// Running level including this line's effect
    level_next: i32,
    pub visible_chars: usize,
    compact: bool,
}

impl<'r, 'doc> FoldContext<'r, 'doc> {
    /// Start folding at `first_line`, seeding the level from the
    /// previous line's committed next-level.
    pub fn new(acc: &'r mut Accessor<'doc>, first_line: usize, compact: bool) -> Self {
        let level_current = if first_line > 0 {
            next_level(acc.level(first_line - 1)).max(FOLD_BASE)
        } else {
            FOLD_BASE
        };
        Self {
            acc,
            line: first_line,
            level_min: level_current,
            level_next: level_current,
            visible_chars: 0,
            compact,
        }
    }

    pub fn increment(&mut self) {
        self.level_next += 1;
    }

    pub fn decrement(&mut self) {
        if self.level_next > 0 {
            self.level_next -= 1;
        }
        if self.level_next < self.level_min {
            self.level_min = self.level_next;
        }
    }

    /// Count a non-whitespace character on the current line
    pub fn visible(&mut self) {
        self.visible_chars += 1;
    }

    pub fn level(&self) -> i32 {
        self.level_next
    }

    pub fn char_at(&self, pos: usize) -> char {
        self.acc.char_at(pos)
    }

    pub fn style_at(&self, pos: usize) -> crate::style::Style {
        self.acc.style_at(pos)
    }

    pub fn matches(&self, pos: usize, literal: &str) -> bool {
        self.acc.matches(pos, literal)
    }

    pub fn text_range(&self, start: usize, end: usize) -> &str {
        self.acc.text_range(start, end)
    }

    /// Commit the current line's packed level and advance to the next
    pub fn end_line(&mut self) {
        let level_use = self.level_min;
        let mut level = level_use | (self.level_next << 16);
        if self.visible_chars == 0 && self.compact {
            level |= FLAG_WHITE;
        }
        if self.level_next > level_use && self.visible_chars > 0 {
            level |= FLAG_HEADER;
        }
        if level != self.acc.level(self.line) {
            self.acc.set_level(self.line, level);
        }
        self.line += 1;
        self.level_min = self.level_next;
        self.visible_chars = 0;
    }

    /// Commit the final line of the range when it lacks a newline.
    /// A range ending exactly at a line boundary has already committed
    /// every line it covered; the following line is left untouched.
    pub fn finish(mut self) {
        if self.acc.line_start(self.line) < self.acc.end() {
            self.end_line();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::Document;

    /// Minimal brace folder over raw characters, enough to exercise
    /// the context itself
    fn fold_braces(doc: &mut Document, compact: bool) {
        let len = doc.len();
        let mut acc = Accessor::new(doc, 0, len);
        let mut fc = FoldContext::new(&mut acc, 0, compact);
        for pos in 0..len {
            let ch = fc.char_at(pos);
            match ch {
                '{' => {
                    fc.visible();
                    fc.increment();
                }
                '}' => {
                    fc.visible();
                    fc.decrement();
                }
                '\n' => fc.end_line(),
                ' ' | '\t' | '\r' => {}
                _ => fc.visible(),
            }
        }
        fc.finish();
    }

    #[test]
    fn test_simple_block() {
        let mut doc = Document::new("if (x) {\n  y();\n}\n");
        fold_braces(&mut doc, true);

        let l0 = doc.fold_level(0);
        let l1 = doc.fold_level(1);
        let l2 = doc.fold_level(2);
        assert_eq!(level_number(l0), FOLD_BASE);
        assert!(is_header(l0));
        assert_eq!(level_number(l1), FOLD_BASE + 1);
        assert!(!is_header(l1));
        assert_eq!(level_number(l2), FOLD_BASE);
        assert_eq!(next_level(l2), FOLD_BASE);
    }

    #[test]
    fn test_close_then_open_is_one_header() {
        let mut doc = Document::new("if (x) {\n  y();\n} else {\n  z();\n}\n");
        fold_braces(&mut doc, true);

        // "} else {" keeps the outer level and is the line's only header
        let l2 = doc.fold_level(2);
        assert_eq!(level_number(l2), FOLD_BASE);
        assert_eq!(next_level(l2), FOLD_BASE + 1);
        assert!(is_header(l2));

        let headers: Vec<usize> = (0..doc.line_count())
            .filter(|&l| is_header(doc.fold_level(l)))
            .collect();
        assert_eq!(headers, vec![0, 2]);
    }

    #[test]
    fn test_blank_line_is_white_never_header() {
        let mut doc = Document::new("{\n\n}\n");
        fold_braces(&mut doc, true);
        let l1 = doc.fold_level(1);
        assert!(is_white(l1));
        assert!(!is_header(l1));
        assert_eq!(level_number(l1), FOLD_BASE + 1);
    }

    #[test]
    fn test_compact_off() {
        let mut doc = Document::new("{\n\n}\n");
        fold_braces(&mut doc, false);
        assert!(!is_white(doc.fold_level(1)));
    }

    #[test]
    fn test_underflow_clamped() {
        let mut doc = Document::new("}}}\n");
        fold_braces(&mut doc, true);
        // Levels never go negative; stray closers are absorbed
        assert!(level_number(doc.fold_level(0)) >= 0);
    }
}
