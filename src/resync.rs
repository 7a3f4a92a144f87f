//! Resynchronization
//!
//! A re-lex request may start inside a construct whose meaning depends
//! on information that was never packed into the per-line state (a
//! heredoc body, whose terminator text cannot fit a packed integer, or
//! a continuation line). Before scanning forward, the engine asks the
//! lexer to move the restart back to a point it can resume from; the
//! helpers here implement the bounded backward walks the lexers share.
//!
//! Exhausting the walk is not an error: the safe point degrades to the
//! document start with the default init style.

use tracing::trace;

use crate::accessor::Document;
use crate::scanner::Lexer;
use crate::style::{self, Style};

/// Cap on the backward walk, so pathological documents cannot turn a
/// small edit into a quadratic rescan. Beyond the cap the walk stops
/// at the earliest line reached; the following scan is still correct,
/// just larger.
pub const MAX_BACKTRACK_LINES: usize = 400;

/// Lines probed ahead when judging a heredoc candidate
const MAX_TERMINATOR_PROBE_LINES: usize = 200;

/// Decide the true scan start for a request at `pos`: the lexer's
/// backtracked position plus the init style in force just before it.
pub fn safe_start(lexer: &dyn Lexer, doc: &Document, pos: usize) -> (usize, Style) {
    let start = lexer.backtrack(doc, pos.min(doc.len()));
    let init_style = if start == 0 {
        style::DEFAULT
    } else {
        doc.style_at(start - 1)
    };
    if start != pos {
        trace!(requested = pos, start, init_style, "resynchronized scan start");
    }
    (start, init_style)
}

/// Walk backward from `line` while `blocked` says its predecessor's
/// state still prevents a resume there. Returns the first line whose
/// start is safe, bounded by `MAX_BACKTRACK_LINES`.
pub fn back_while(doc: &Document, mut line: usize, blocked: impl Fn(&Document, usize) -> bool) -> usize {
    let floor = line.saturating_sub(MAX_BACKTRACK_LINES);
    while line > floor && blocked(doc, line) {
        line -= 1;
    }
    line
}

/// Whether a line is blank or whitespace-only. Under the
/// resync-extension policy such lines never host a safe point on their
/// own, since their state is whatever surrounds them.
pub fn is_whitespace_line(doc: &Document, line: usize) -> bool {
    doc.line_text(line).bytes().all(|b| b == b' ' || b == b'\t')
}

/// A heredoc opener's delimiter as written: the target text, whether
/// the body may be indented (`<<-`), and whether the delimiter was
/// quoted (suppressing expansion in the body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeredocDelimiter {
    pub target: String,
    pub indented: bool,
    pub quoted: bool,
}

/// Parse a heredoc delimiter starting just after the `<<` arrows.
/// Returns `None` when no plausible target follows (which is the first
/// signal that the arrows were a shift/append operator instead).
pub fn heredoc_delimiter(doc: &Document, mut pos: usize) -> Option<HeredocDelimiter> {
    let mut indented = false;
    if doc.char_at(pos) == '-' {
        indented = true;
        pos += 1;
    }
    while doc.char_at(pos) == ' ' || doc.char_at(pos) == '\t' {
        pos += 1;
    }

    let quote = match doc.char_at(pos) {
        q @ ('\'' | '"' | '`') => {
            pos += 1;
            Some(q)
        }
        _ => None,
    };

    // Unquoted targets are words: a leading digit means the arrows
    // were a shift by a number, not an opener
    if quote.is_none() && doc.char_at(pos).is_ascii_digit() {
        return None;
    }

    let mut target = String::new();
    loop {
        let ch = doc.char_at(pos);
        let ends = match quote {
            Some(q) => ch == q || ch == '\n' || ch == '\r' || pos >= doc.len(),
            None => !(ch.is_ascii_alphanumeric() || ch == '_'),
        };
        if ends {
            break;
        }
        target.push(ch);
        pos += 1;
    }

    if target.is_empty() {
        return None;
    }
    Some(HeredocDelimiter { target, indented, quoted: quote.is_some() })
}

/// Scan forward from the line after `pos` for a line that closes the
/// heredoc. Best-effort: bounded, and an indented terminator is only
/// stripped of leading tabs as the shell does.
pub fn terminator_follows(doc: &Document, pos: usize, delim: &HeredocDelimiter) -> bool {
    let first = doc.line_of(pos) + 1;
    let last = (first + MAX_TERMINATOR_PROBE_LINES).min(doc.line_count());
    for line in first..last {
        let text = doc.line_text(line);
        let text = if delim.indented {
            text.trim_start_matches('\t')
        } else {
            text
        };
        if text == delim.target {
            return true;
        }
    }
    false
}

/// Judge the token before `pos` by its *style*: walk left over blanks
/// and report whether the first styled character carries `style`.
/// Used to tell `$count << 2` (variable, so a shift) from `cat << EOF`.
pub fn preceding_style_is(doc: &Document, pos: usize, style: Style) -> bool {
    let mut p = pos;
    while p > 0 {
        p -= 1;
        let ch = doc.char_at(p);
        if ch == ' ' || ch == '\t' {
            continue;
        }
        return doc.style_at(p) == style;
    }
    false
}

/// Heuristic: does `<<` at `pos` open a heredoc? Deliberately
/// best-effort, not a parse: a plausible target must follow, a
/// matching terminator must appear ahead, and the preceding token must
/// not be styled as a variable. Adversarial input can fool this.
pub fn looks_like_heredoc(doc: &Document, pos: usize, variable_style: Style) -> bool {
    if preceding_style_is(doc, pos, variable_style) {
        return false;
    }
    match heredoc_delimiter(doc, pos + 2) {
        Some(delim) => terminator_follows(doc, pos, &delim),
        None => false,
    }
}
