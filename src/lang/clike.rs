//! C-like language scanner and folder
//!
//! Covers the brace-and-semicolon family: keywords and type names from
//! two keyword sets, numeric literals, single- and double-quoted
//! strings with escapes, `//` and `/* */` comments, and `#` lines.
//! Resumption is style-coarse: the style of the previous character is
//! enough to rebuild the scanner state at any line start, so no
//! per-line state is stored.

use crate::accessor::Accessor;
use crate::config::PropertySet;
use crate::fold::FoldContext;
use crate::number::NumberScanner;
use crate::scanner::{is_blank, is_word_char, is_word_start, Lexer, Run};
use crate::style::Style;
use crate::words::WordList;

pub const DEFAULT: Style = 0;
pub const COMMENT: Style = 1;
pub const COMMENT_LINE: Style = 2;
pub const NUMBER: Style = 3;
pub const KEYWORD: Style = 4;
pub const TYPE: Style = 5;
pub const STRING: Style = 6;
pub const CHARACTER: Style = 7;
pub const PREPROCESSOR: Style = 8;
pub const OPERATOR: Style = 9;
pub const IDENTIFIER: Style = 10;
/// Unterminated string at end of line
pub const STRING_EOL: Style = 11;

/// Scanner state between characters
enum State {
    Default,
    Comment,
    CommentLine,
    Preprocessor,
    Number(NumberScanner),
    Word { start: usize },
    Str { quote: char },
}

fn is_operator(ch: char) -> bool {
    matches!(
        ch,
        '{' | '}' | '(' | ')' | '[' | ']' | '<' | '>' | '+' | '-' | '*' | '/' | '%'
            | '=' | '!' | '&' | '|' | '^' | '~' | '?' | ':' | ';' | ',' | '.'
    )
}

/// Rebuild scanner state from the style in force before the range
fn state_for(init_style: Style) -> State {
    match init_style {
        COMMENT => State::Comment,
        COMMENT_LINE => State::CommentLine,
        PREPROCESSOR => State::Preprocessor,
        STRING => State::Str { quote: '"' },
        CHARACTER => State::Str { quote: '\'' },
        _ => State::Default,
    }
}

pub struct CLike;

impl CLike {
    fn classify(&self, run: &mut Run, start: usize, keywords: &WordList, types: &WordList) {
        let line = run.line_of(start);
        let rest = run
            .text_range(start, run.line_end_of(line))
            .to_string();
        if let Some(len) = keywords.longest_match(&rest, is_word_char) {
            // A compound keyword may reach past the scanned word
            if start + len > run.pos {
                run.forward_n(start + len - run.pos);
            }
            run.change_style(KEYWORD);
        } else if types.contains(run.token_since(start)) {
            run.change_style(TYPE);
        }
    }
}

impl Lexer for CLike {
    fn name(&self) -> &'static str {
        "clike"
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
        let types = words.get(1).unwrap_or(&empty);

        let mut run = Run::new(acc, init_style);
        let mut state = state_for(init_style);

        while run.more() {
            match state {
                State::Default => {
                    let ch = run.ch;
                    if ch == '/' && run.ch_next == '/' {
                        run.set_style(COMMENT_LINE);
                        state = State::CommentLine;
                        run.forward_n(2);
                    } else if ch == '/' && run.ch_next == '*' {
                        run.set_style(COMMENT);
                        state = State::Comment;
                        run.forward_n(2);
                    } else if NumberScanner::starts(ch, run.ch_next) {
                        run.set_style(NUMBER);
                        let (scanner, consumed) = NumberScanner::begin(ch, run.ch_next);
                        run.forward_n(consumed);
                        state = State::Number(scanner);
                    } else if is_word_start(ch) {
                        run.set_style(IDENTIFIER);
                        state = State::Word { start: run.pos };
                        run.forward();
                    } else if ch == '"' || ch == '\'' {
                        run.set_style(if ch == '"' { STRING } else { CHARACTER });
                        state = State::Str { quote: ch };
                        run.forward();
                    } else if ch == '#' && only_blanks_on_line_before(&run) {
                        run.set_style(PREPROCESSOR);
                        state = State::Preprocessor;
                        run.forward();
                    } else if is_operator(ch) {
                        run.set_style(OPERATOR);
                        run.forward();
                    } else {
                        run.set_style(DEFAULT);
                        run.forward();
                    }
                }
                State::Comment => {
                    if run.ch == '*' && run.ch_next == '/' {
                        run.forward_n(2);
                        run.set_style(DEFAULT);
                        state = State::Default;
                    } else {
                        run.forward();
                    }
                }
                State::CommentLine | State::Preprocessor => {
                    if run.ch == '\\' && is_eol(run.ch_next) {
                        // Backslash continuation keeps the line-scoped
                        // style across the EOL so resumption works
                        consume_escaped_eol(&mut run);
                    } else if is_eol(run.ch) {
                        state = State::Default;
                    } else {
                        run.forward();
                    }
                }
                State::Number(ref mut scanner) => {
                    if run.more() && scanner.accept(run.ch, run.ch_next) {
                        run.forward();
                    } else {
                        if !scanner.is_valid() {
                            run.change_style(DEFAULT);
                        }
                        state = State::Default;
                    }
                }
                State::Word { start } => {
                    if is_word_char(run.ch) {
                        run.forward();
                    } else {
                        self.classify(&mut run, start, keywords, types);
                        state = State::Default;
                    }
                }
                State::Str { quote } => {
                    if run.ch == '\\' {
                        if is_eol(run.ch_next) {
                            consume_escaped_eol(&mut run);
                        } else {
                            run.forward_n(2);
                        }
                    } else if run.ch == quote {
                        run.forward();
                        run.set_style(DEFAULT);
                        state = State::Default;
                    } else if is_eol(run.ch) {
                        // Unterminated: demote the whole run, reset
                        run.change_style(STRING_EOL);
                        state = State::Default;
                    } else {
                        run.forward();
                    }
                }
            }
        }

        // Tokens cut off by the end of the range still classify
        match state {
            State::Word { start } => self.classify(&mut run, start, keywords, types),
            State::Number(ref scanner) if !scanner.is_valid() => run.change_style(DEFAULT),
            _ => {}
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
        let fold_comment = props.get_bool("fold.comment", true);
        let fold_preproc = props.get_bool("fold.preprocessor", true);

        let start = acc.start();
        let end = acc.end();
        let first_line = acc.line_of(start);
        let mut fc = FoldContext::new(acc, first_line, compact);

        for pos in start..end {
            let ch = fc.char_at(pos);
            let style = fc.style_at(pos);

            if fold_comment && style == COMMENT {
                if pos == 0 || fc.style_at(pos - 1) != COMMENT {
                    fc.increment();
                }
                if fc.style_at(pos + 1) != COMMENT {
                    fc.decrement();
                }
            }

            if fold_preproc && style == PREPROCESSOR && ch == '#' {
                let mut p = pos + 1;
                while is_blank(fc.char_at(p)) {
                    p += 1;
                }
                if fc.matches(p, "if") {
                    fc.increment();
                } else if fc.matches(p, "endif") {
                    fc.decrement();
                } else if fc.matches(p, "else") || fc.matches(p, "elif") {
                    // Same-level header via the min-level rule
                    fc.decrement();
                    fc.increment();
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
}

fn is_eol(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

/// Consume a backslash plus the EOL sequence after it
fn consume_escaped_eol(run: &mut Run) {
    if run.ch_next == '\r' && run.char_at(run.pos + 2) == '\n' {
        run.forward_n(3);
    } else {
        run.forward_n(2);
    }
}

/// Only blanks between the current line's start and the current position
fn only_blanks_on_line_before(run: &Run) -> bool {
    let line_start = run.line_start_of(run.current_line());
    run.text_range(line_start, run.pos).chars().all(is_blank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::Document;
    use crate::style;

    fn keyword_sets() -> Vec<WordList> {
        vec![
            WordList::new("if else else\x01if for while return", false),
            WordList::new("int char void unsigned", false),
        ]
    }

    fn scan_all(text: &str) -> Document {
        let mut doc = Document::new(text);
        let words = keyword_sets();
        let props = PropertySet::new();
        let len = doc.len();
        let mut acc = Accessor::new(&mut doc, 0, len);
        CLike.scan(style::DEFAULT, &words, &props, &mut acc);
        doc
    }

    fn fold_all(doc: &mut Document, props: &PropertySet) {
        let words = keyword_sets();
        let len = doc.len();
        let mut acc = Accessor::new(doc, 0, len);
        CLike.fold(style::DEFAULT, &words, props, &mut acc);
    }

    #[test]
    fn test_basic_statement() {
        let doc = scan_all("int x = 42; // hi");
        assert_eq!(doc.style_at(0), TYPE); // int
        assert_eq!(doc.style_at(2), TYPE);
        assert_eq!(doc.style_at(3), DEFAULT);
        assert_eq!(doc.style_at(4), IDENTIFIER); // x
        assert_eq!(doc.style_at(6), OPERATOR); // =
        assert_eq!(doc.style_at(8), NUMBER); // 42
        assert_eq!(doc.style_at(9), NUMBER);
        assert_eq!(doc.style_at(10), OPERATOR); // ;
        assert_eq!(doc.style_at(12), COMMENT_LINE); // //
        assert_eq!(doc.style_at(16), COMMENT_LINE);
    }

    #[test]
    fn test_compound_keyword_wins() {
        let doc = scan_all("else if (x) return;");
        // "else if" is one keyword token
        for pos in 0..7 {
            assert_eq!(doc.style_at(pos), KEYWORD, "pos {pos}");
        }
        assert_eq!(doc.style_at(7), DEFAULT);
        assert_eq!(doc.style_at(12), KEYWORD); // return
    }

    #[test]
    fn test_strings_and_escapes() {
        let doc = scan_all(r#"a = "x\"y"; b = 'c';"#);
        assert_eq!(doc.style_at(4), STRING);
        assert_eq!(doc.style_at(6), STRING); // escaped quote
        assert_eq!(doc.style_at(9), STRING); // closing quote
        assert_eq!(doc.style_at(10), OPERATOR); // ;
        assert_eq!(doc.style_at(16), CHARACTER);
    }

    #[test]
    fn test_unterminated_string_resets_next_line() {
        let doc = scan_all("s = \"abc\nx = 1;\n");
        // The whole string run is demoted, the EOL is default
        assert_eq!(doc.style_at(4), STRING_EOL);
        assert_eq!(doc.style_at(7), STRING_EOL);
        assert_eq!(doc.style_at(8), DEFAULT); // \n
        assert_eq!(doc.style_at(9), IDENTIFIER); // x on the next line
        assert_eq!(doc.style_at(13), NUMBER);
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let doc = scan_all("a /* one\ntwo */ b");
        assert_eq!(doc.style_at(0), IDENTIFIER);
        assert_eq!(doc.style_at(2), COMMENT);
        assert_eq!(doc.style_at(8), COMMENT); // the newline inside
        assert_eq!(doc.style_at(9), COMMENT);
        assert_eq!(doc.style_at(14), COMMENT); // */
        assert_eq!(doc.style_at(16), IDENTIFIER);
    }

    #[test]
    fn test_preprocessor_line() {
        let doc = scan_all("#include <x.h>\ny;\n");
        assert_eq!(doc.style_at(0), PREPROCESSOR);
        assert_eq!(doc.style_at(13), PREPROCESSOR);
        assert_eq!(doc.style_at(15), IDENTIFIER); // y
        // '#' not at line start is not a preprocessor line
        let doc = scan_all("a # b");
        assert_eq!(doc.style_at(2), DEFAULT);
    }

    #[test]
    fn test_malformed_number_demoted() {
        let doc = scan_all("x = 1__2;");
        assert_eq!(doc.style_at(4), DEFAULT);
        assert_eq!(doc.style_at(7), DEFAULT);
        assert_eq!(doc.style_at(8), OPERATOR);
    }

    #[test]
    fn test_chunked_scan_matches_full_scan() {
        let text = "a /* c\nmore\n*/ b\nint q = 3; // t\n";
        let full = scan_all(text);

        let mut doc = Document::new(text);
        let words = keyword_sets();
        let props = PropertySet::new();
        let split = doc.line_start(1);
        {
            let mut acc = Accessor::new(&mut doc, 0, split);
            CLike.scan(style::DEFAULT, &words, &props, &mut acc);
        }
        let init = doc.style_at(split - 1);
        {
            let len = doc.len() - split;
            let mut acc = Accessor::new(&mut doc, split, len);
            CLike.scan(init, &words, &props, &mut acc);
        }
        assert_eq!(doc.styles(), full.styles());
    }

    #[test]
    fn test_fold_preprocessor_and_braces() {
        let mut doc = scan_all("#if A\nint f() {\n}\n#endif\n");
        let props = PropertySet::new();
        fold_all(&mut doc, &props);

        use crate::fold::{is_header, level_number, next_level, FOLD_BASE};
        assert!(is_header(doc.fold_level(0))); // #if
        assert!(is_header(doc.fold_level(1))); // {
        assert_eq!(level_number(doc.fold_level(1)), FOLD_BASE + 1);
        // #endif shows at the outer level once its drop is applied
        assert_eq!(level_number(doc.fold_level(3)), FOLD_BASE);
        assert_eq!(next_level(doc.fold_level(3)), FOLD_BASE);
    }

    #[test]
    fn test_fold_respects_master_switch() {
        let mut doc = scan_all("{\n}\n");
        let props = PropertySet::parse("fold = false");
        fold_all(&mut doc, &props);
        assert_eq!(doc.fold_level(0), 0);
    }

    #[test]
    fn test_braces_in_strings_do_not_fold() {
        let mut doc = scan_all("s = \"{{{\";\n");
        let props = PropertySet::new();
        fold_all(&mut doc, &props);
        use crate::fold::{is_header, next_level, FOLD_BASE};
        assert!(!is_header(doc.fold_level(0)));
        assert_eq!(next_level(doc.fold_level(0)), FOLD_BASE);
    }
}
