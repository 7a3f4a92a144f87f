//! Shell language scanner and folder
//!
//! Line-oriented grammar with `#` comments, single/double quoted
//! strings, `$name` / `${...}` expansions, backticks and heredocs.
//!
//! Heredocs are the non-resumable construct in this crate: the
//! terminator text cannot be packed into the per-line integer, so the
//! per-line state only records *that* a heredoc is open and
//! `backtrack` walks back to the opener line, where the delimiter can
//! be re-read. Whether `<<` opens a heredoc at all is decided by the
//! best-effort heuristic in `resync`.

use crate::accessor::{Accessor, Document};
use crate::config::PropertySet;
use crate::fold::FoldContext;
use crate::number::NumberScanner;
use crate::resync::{self, HeredocDelimiter};
use crate::scanner::{is_blank, is_word_char, is_word_start, Lexer, Run};
use crate::style::Style;
use crate::words::WordList;

pub const DEFAULT: Style = 0;
pub const ERROR: Style = 1;
pub const COMMENT: Style = 2;
pub const NUMBER: Style = 3;
pub const KEYWORD: Style = 4;
pub const STRING: Style = 5;
pub const CHARACTER: Style = 6;
pub const OPERATOR: Style = 7;
pub const IDENTIFIER: Style = 8;
/// `$name` expansion
pub const SCALAR: Style = 9;
/// `${...}` expansion
pub const PARAM: Style = 10;
pub const BACKTICKS: Style = 11;
pub const HERE_DELIM: Style = 12;
pub const HERE_BODY: Style = 13;

/// Line-state bits. The heredoc terminator text is deliberately not
/// packed; lines with `LS_IN_HEREDOC` set are resumed via `backtrack`.
pub const LS_IN_HEREDOC: i32 = 1 << 0;
pub const LS_HEREDOC_INDENTED: i32 = 1 << 1;
pub const LS_HEREDOC_QUOTED: i32 = 1 << 2;
/// Line ends with a backslash continuation
pub const LS_CONTINUATION: i32 = 1 << 3;

enum State {
    Default,
    Comment,
    Word { start: usize },
    Number(NumberScanner),
    StringDouble,
    StringSingle,
    Backticks,
    Param,
    /// Between heredoc body lines, checking each line start against
    /// the terminator
    HereBody { delim: HeredocDelimiter },
    /// Painting the terminator line
    HereClose,
}

fn state_for(init_style: Style) -> State {
    match init_style {
        STRING => State::StringDouble,
        CHARACTER => State::StringSingle,
        BACKTICKS => State::Backticks,
        PARAM => State::Param,
        // A heredoc body cannot be resumed from style alone; backtrack
        // prevents this from being reached in normal operation
        _ => State::Default,
    }
}

fn is_shell_operator(ch: char) -> bool {
    matches!(
        ch,
        '{' | '}' | '(' | ')' | '[' | ']' | '<' | '>' | '|' | '&' | ';' | '!' | '='
            | '*' | '+' | '-' | '/' | '%' | '^' | '~' | '?' | ':' | ','
    )
}

pub struct Shell;

impl Lexer for Shell {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn scan(
        &self,
        init_style: Style,
        words: &[WordList],
        _props: &PropertySet,
        acc: &mut Accessor,
    ) {
        let empty = WordList::default();
        let keywords = words.first().unwrap_or(&empty);

        let mut run = Run::new(acc, init_style);
        let mut state = state_for(init_style);
        // Heredoc opened on the current line, entered at its EOL
        let mut pending_heredoc: Option<HeredocDelimiter> = None;
        let mut continuation = false;

        while run.more() {
            // Record the per-line state at each line's final EOL char
            if run.at_line_end() {
                let mut bits = 0;
                let open = match (&state, &pending_heredoc) {
                    (State::HereBody { delim }, _) => Some(delim),
                    (_, Some(delim)) => Some(delim),
                    _ => None,
                };
                if let Some(delim) = open {
                    bits |= LS_IN_HEREDOC;
                    if delim.indented {
                        bits |= LS_HEREDOC_INDENTED;
                    }
                    if delim.quoted {
                        bits |= LS_HEREDOC_QUOTED;
                    }
                }
                if continuation {
                    bits |= LS_CONTINUATION;
                }
                let line = run.current_line();
                run.set_line_state(line, bits);
                continuation = false;
                if let Some(delim) = pending_heredoc.take() {
                    if !matches!(state, State::HereBody { .. }) {
                        state = State::HereBody { delim };
                    }
                }
            }

            match state {
                State::Default => {
                    let ch = run.ch;
                    if ch == '\\' {
                        if run.ch_next == '\n' || run.ch_next == '\r' {
                            continuation = true;
                            run.forward();
                        } else {
                            run.forward_n(2);
                        }
                    } else if ch == '#' && !is_word_char(run.ch_prev) {
                        run.set_style(COMMENT);
                        state = State::Comment;
                        run.forward();
                    } else if ch == '<' && run.ch_next == '<' && !run.matches("<<<") {
                        if resync::looks_like_heredoc(run.document(), run.pos, SCALAR) {
                            run.set_style(HERE_DELIM);
                            let delim = consume_heredoc_delimiter(&mut run);
                            run.set_style(DEFAULT);
                            pending_heredoc = delim;
                            state = State::Default;
                        } else {
                            run.set_style(OPERATOR);
                            run.forward_n(2);
                        }
                    } else if ch == '$' {
                        if run.ch_next == '{' {
                            run.set_style(PARAM);
                            state = State::Param;
                            run.forward_n(2);
                        } else if is_word_start(run.ch_next) {
                            run.set_style(SCALAR);
                            run.forward();
                            while is_word_char(run.ch) && run.more() {
                                run.forward();
                            }
                            run.set_style(DEFAULT);
                        } else {
                            run.set_style(OPERATOR);
                            run.forward();
                        }
                    } else if ch == '`' {
                        run.set_style(BACKTICKS);
                        state = State::Backticks;
                        run.forward();
                    } else if ch == '"' {
                        run.set_style(STRING);
                        state = State::StringDouble;
                        run.forward();
                    } else if ch == '\'' {
                        run.set_style(CHARACTER);
                        state = State::StringSingle;
                        run.forward();
                    } else if NumberScanner::starts(ch, run.ch_next) && !is_word_char(run.ch_prev)
                    {
                        run.set_style(NUMBER);
                        let (scanner, consumed) = NumberScanner::begin(ch, run.ch_next);
                        run.forward_n(consumed);
                        state = State::Number(scanner);
                    } else if is_word_start(ch) {
                        run.set_style(IDENTIFIER);
                        state = State::Word { start: run.pos };
                        run.forward();
                    } else if is_shell_operator(ch) {
                        run.set_style(OPERATOR);
                        run.forward();
                    } else {
                        run.set_style(DEFAULT);
                        run.forward();
                    }
                }
                State::Comment => {
                    if run.ch == '\n' || run.ch == '\r' {
                        state = State::Default;
                    } else {
                        run.forward();
                    }
                }
                State::Word { start } => {
                    if is_word_char(run.ch) {
                        run.forward();
                    } else {
                        if keywords.contains(run.token_since(start)) {
                            run.change_style(KEYWORD);
                        }
                        state = State::Default;
                    }
                }
                State::Number(ref mut scanner) => {
                    if scanner.accept(run.ch, run.ch_next) {
                        run.forward();
                    } else {
                        if !scanner.is_valid() {
                            run.change_style(DEFAULT);
                        }
                        state = State::Default;
                    }
                }
                State::StringDouble => {
                    if run.ch == '\\' && !matches!(run.ch_next, '\n' | '\r') {
                        run.forward_n(2);
                    } else if run.ch == '"' {
                        run.forward();
                        run.set_style(DEFAULT);
                        state = State::Default;
                    } else {
                        run.forward();
                    }
                }
                State::StringSingle => {
                    if run.ch == '\'' {
                        run.forward();
                        run.set_style(DEFAULT);
                        state = State::Default;
                    } else {
                        run.forward();
                    }
                }
                State::Backticks => {
                    if run.ch == '\\' && !matches!(run.ch_next, '\n' | '\r') {
                        run.forward_n(2);
                    } else if run.ch == '`' {
                        run.forward();
                        run.set_style(DEFAULT);
                        state = State::Default;
                    } else {
                        run.forward();
                    }
                }
                State::Param => {
                    if run.ch == '}' {
                        run.forward();
                        run.set_style(DEFAULT);
                        state = State::Default;
                    } else if run.ch == '\n' || run.ch == '\r' {
                        // Unterminated expansion: error to EOL, reset
                        run.change_style(ERROR);
                        state = State::Default;
                    } else {
                        run.forward();
                    }
                }
                State::HereBody { ref delim } => {
                    if run.at_line_start && terminates_heredoc(&run, delim) {
                        run.set_style(HERE_DELIM);
                        state = State::HereClose;
                    } else {
                        run.set_style(HERE_BODY);
                        run.forward();
                    }
                }
                State::HereClose => {
                    if run.ch == '\n' || run.ch == '\r' {
                        run.set_style(DEFAULT);
                        state = State::Default;
                    } else {
                        run.forward();
                    }
                }
            }
        }

        if let State::Word { start } = state {
            if keywords.contains(run.token_since(start)) {
                run.change_style(KEYWORD);
            }
        }
        run.finish();
    }

    fn fold(
        &self,
        _init_style: Style,
        _words: &[WordList],
        props: &PropertySet,
        acc: &mut Accessor,
    ) {
        if !props.get_bool("fold", true) {
            return;
        }
        let compact = props.get_bool("fold.compact", true);

        let start = acc.start();
        let end = acc.end();
        let first_line = acc.line_of(start);
        let mut fc = FoldContext::new(acc, first_line, compact);

        for pos in start..end {
            let ch = fc.char_at(pos);
            let style = fc.style_at(pos);

            if style == KEYWORD && (pos == 0 || fc.style_at(pos - 1) != KEYWORD) {
                let mut word_end = pos;
                while fc.style_at(word_end) == KEYWORD && is_word_char(fc.char_at(word_end)) {
                    word_end += 1;
                }
                match fc.text_range(pos, word_end).to_string().as_str() {
                    "if" | "do" | "case" => fc.increment(),
                    "fi" | "done" | "esac" => fc.decrement(),
                    _ => {}
                }
            }

            if style == OPERATOR {
                if ch == '{' {
                    fc.increment();
                } else if ch == '}' {
                    fc.decrement();
                }
            }

            match ch {
                '\n' => fc.end_line(),
                '\r' => {
                    if fc.char_at(pos + 1) != '\n' {
                        fc.end_line();
                    }
                }
                ' ' | '\t' => {}
                _ => fc.visible(),
            }
        }
        fc.finish();
    }

    /// Heredoc bodies and continuation chains cannot be resumed from a
    /// packed line state; walk back past them (and, conservatively,
    /// past whitespace-only lines) to a line start that can be.
    fn backtrack(&self, doc: &Document, pos: usize) -> usize {
        let line = doc.line_of(pos.min(doc.len()));
        let line = resync::back_while(doc, line, |doc, l| {
            let prev_state = doc.line_state(l - 1);
            prev_state & (LS_IN_HEREDOC | LS_CONTINUATION) != 0
                || resync::is_whitespace_line(doc, l - 1)
        });
        doc.line_start(line)
    }
}

/// Consume `<<`, optional `-`, optional quote and the target word.
/// Returns the parsed delimiter (None only for malformed openers the
/// heuristic should have rejected).
fn consume_heredoc_delimiter(run: &mut Run) -> Option<HeredocDelimiter> {
    let delim = resync::heredoc_delimiter(run.document(), run.pos + 2);
    run.forward_n(2);
    if run.ch == '-' {
        run.forward();
    }
    while is_blank(run.ch) && run.more() {
        run.forward();
    }
    if matches!(run.ch, '\'' | '"' | '`') {
        let quote = run.ch;
        run.forward();
        while run.ch != quote && !matches!(run.ch, '\n' | '\r') && run.more() {
            run.forward();
        }
        if run.ch == quote {
            run.forward();
        }
    } else {
        while is_word_char(run.ch) && run.more() {
            run.forward();
        }
    }
    delim
}

/// Whether the line at the cursor closes the heredoc
fn terminates_heredoc(run: &Run, delim: &HeredocDelimiter) -> bool {
    let text = run.line_text(run.current_line());
    let text = if delim.indented {
        text.trim_start_matches('\t')
    } else {
        text
    };
    text == delim.target
}
