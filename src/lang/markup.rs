//! Markup host scanner with embedded sublanguages
//!
//! The host grammar covers tags, attributes, entities, `<!-- -->`
//! comments and `<!...>` declarations (with nesting). Tag names are
//! checked against keyword set 0; a name outside the set takes the
//! unknown-tag style. Two sublanguages
//! can be embedded: a C-like script language inside `<script>` tags
//! and inside `<? ... ?>` blocks, and a line-oriented basic language
//! selected through a `type=` / `language=` attribute.
//!
//! Which script language a `<script>` region uses may depend on an
//! attribute value that has not been read when the tag name is seen,
//! so the scanner records "language pending" and commits only once the
//! quoted value closes.
//!
//! Leaving a `<? ?>` block restores a one-deep pushdown captured at
//! entry (the state and language in force before it). This is enough
//! because the grammar forbids nesting a block inside another block;
//! it is a deliberate simplification, not an oversight.

use crate::accessor::Accessor;
use crate::config::PropertySet;
use crate::fold::FoldContext;
use crate::number::NumberScanner;
use crate::scanner::{is_blank, is_word_char, is_word_start, Lexer, Run};
use crate::style::Style;
use crate::words::WordList;

// Host styles
pub const DEFAULT: Style = 0;
pub const TAG: Style = 1;
pub const TAG_END: Style = 2;
pub const ATTRIBUTE: Style = 3;
pub const DOUBLE_STRING: Style = 4;
pub const SINGLE_STRING: Style = 5;
pub const COMMENT: Style = 6;
pub const ENTITY: Style = 7;
pub const DECLARATION: Style = 8;
/// `<?` and `?>` block delimiters
pub const QUESTION: Style = 9;
/// Unquoted attribute value
pub const VALUE: Style = 10;
/// Tag whose name is not in keyword set 0
pub const TAG_UNKNOWN: Style = 11;

// Embedded script (C-like) styles
pub const JS_DEFAULT: Style = 20;
pub const JS_COMMENT: Style = 21;
pub const JS_COMMENT_LINE: Style = 22;
pub const JS_NUMBER: Style = 23;
pub const JS_KEYWORD: Style = 24;
pub const JS_STRING: Style = 25;
pub const JS_CHARACTER: Style = 26;
pub const JS_IDENTIFIER: Style = 27;
pub const JS_OPERATOR: Style = 28;
pub const JS_STRING_EOL: Style = 29;

// Embedded basic styles
pub const VB_DEFAULT: Style = 30;
pub const VB_COMMENT: Style = 31;
pub const VB_NUMBER: Style = 32;
pub const VB_KEYWORD: Style = 33;
pub const VB_STRING: Style = 34;
pub const VB_IDENTIFIER: Style = 35;
pub const VB_OPERATOR: Style = 36;
pub const VB_STRING_EOL: Style = 37;

/// Embedded sublanguage identity; ids appear in the packed line state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubLang {
    Js,
    Basic,
}

impl SubLang {
    fn id(self) -> u8 {
        match self {
            SubLang::Js => 1,
            SubLang::Basic => 2,
        }
    }

    fn from_id(id: u8) -> Option<SubLang> {
        match id {
            1 => Some(SubLang::Js),
            2 => Some(SubLang::Basic),
            _ => None,
        }
    }

    fn default_style(self) -> Style {
        match self {
            SubLang::Js => JS_DEFAULT,
            SubLang::Basic => VB_DEFAULT,
        }
    }
}

/// Per-line scanner context, packed into the opaque 32-bit line state.
///
/// Together with the style of the line's final character this is
/// sufficient to resume scanning at the next line; nothing here
/// depends on later lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineStateRecord {
    /// Active sublanguage id at end of line (0 = host)
    pub sublanguage: u8,
    /// Still inside a tag at end of line
    pub tag_open: bool,
    /// That tag is a closing tag
    pub tag_closing: bool,
    /// That tag is a `<script>` tag
    pub tag_is_script: bool,
    /// Default script language id for `<script>` without a type
    pub default_script: u8,
    /// State before an open `<? ?>` block: 0 = none, 1 = text,
    /// 2 = script region (js), 3 = script region (basic)
    pub before_preproc: u8,
    /// A `type=`/`language=` attribute value is still pending
    pub lang_pending: bool,
    /// Declaration nesting depth
    pub decl_depth: u8,
}

impl LineStateRecord {
    pub fn pack(self) -> i32 {
        (self.sublanguage as i32 & 0xF)
            | (self.tag_open as i32) << 4
            | (self.tag_closing as i32) << 5
            | (self.default_script as i32 & 0x7) << 6
            | (self.before_preproc as i32 & 0x1F) << 9
            | (self.lang_pending as i32) << 14
            | (self.tag_is_script as i32) << 15
            | (self.decl_depth as i32 & 0xFF) << 16
    }

    pub fn unpack(state: i32) -> Self {
        Self {
            sublanguage: (state & 0xF) as u8,
            tag_open: state & (1 << 4) != 0,
            tag_closing: state & (1 << 5) != 0,
            default_script: (state >> 6 & 0x7) as u8,
            before_preproc: (state >> 9 & 0x1F) as u8,
            lang_pending: state & (1 << 14) != 0,
            tag_is_script: state & (1 << 15) != 0,
            decl_depth: (state >> 16 & 0xFF) as u8,
        }
    }
}

/// Inner state of an embedded script/basic region
#[derive(Debug, Clone)]
enum Inner {
    Default,
    Word { start: usize },
    Number(NumberScanner),
    StringDouble,
    StringSingle,
    Comment,
    CommentLine,
}

/// What was in force before a `<? ?>` block (the 1-deep pushdown)
#[derive(Debug, Clone, Copy)]
enum Before {
    Text,
    Script(SubLang),
}

impl Before {
    fn encode(self) -> u8 {
        match self {
            Before::Text => 1,
            Before::Script(SubLang::Js) => 2,
            Before::Script(SubLang::Basic) => 3,
        }
    }

    fn decode(code: u8) -> Option<Before> {
        match code {
            1 => Some(Before::Text),
            2 => Some(Before::Script(SubLang::Js)),
            3 => Some(Before::Script(SubLang::Basic)),
            _ => None,
        }
    }
}

enum State {
    Text,
    TagName { closing: bool, start: usize },
    InTag { closing: bool, script: bool, lang_attr: bool, after_eq: bool },
    AttrName { closing: bool, script: bool, start: usize },
    AttrValue {
        closing: bool,
        script: bool,
        lang_attr: bool,
        quote: char,
        start: Option<usize>,
    },
    AttrValueBare { closing: bool, script: bool, lang_attr: bool, start: usize },
    Comment,
    Declaration { depth: u8 },
    Script { lang: SubLang, inner: Inner },
    Preproc { lang: SubLang, inner: Inner, before: Before },
}

fn is_tag_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | ':' | '.')
}

fn is_eol(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

/// Map an attribute value to a sublanguage
fn language_from_value(value: &str) -> Option<SubLang> {
    let value = value.to_lowercase();
    if value.contains("vbscript") || value.contains("basic") {
        Some(SubLang::Basic)
    } else if value.contains("javascript")
        || value.contains("ecmascript")
        || value.contains("jscript")
    {
        Some(SubLang::Js)
    } else {
        None
    }
}

/// Rebuild the inner script state from the previous line's final style
fn inner_from_style(init_style: Style) -> Inner {
    match init_style {
        JS_STRING | VB_STRING => Inner::StringDouble,
        JS_CHARACTER => Inner::StringSingle,
        JS_COMMENT => Inner::Comment,
        _ => Inner::Default,
    }
}

pub struct Markup;

impl Markup {
    /// Reconstruct the scanner state for a resume at a line start
    fn state_from(rec: LineStateRecord, init_style: Style) -> State {
        if let Some(before) = Before::decode(rec.before_preproc) {
            let lang = SubLang::from_id(rec.sublanguage).unwrap_or(SubLang::Js);
            return State::Preproc { lang, inner: inner_from_style(init_style), before };
        }
        if let Some(lang) = SubLang::from_id(rec.sublanguage) {
            return State::Script { lang, inner: inner_from_style(init_style) };
        }
        if rec.decl_depth > 0 {
            return State::Declaration { depth: rec.decl_depth };
        }
        if rec.tag_open {
            return match init_style {
                DOUBLE_STRING | SINGLE_STRING => State::AttrValue {
                    closing: rec.tag_closing,
                    script: rec.tag_is_script,
                    lang_attr: rec.lang_pending,
                    quote: if init_style == DOUBLE_STRING { '"' } else { '\'' },
                    // The opening quote is on an earlier line; the
                    // value text cannot be recovered, so a pending
                    // language degrades to the default
                    start: None,
                },
                _ => State::InTag {
                    closing: rec.tag_closing,
                    script: rec.tag_is_script,
                    lang_attr: rec.lang_pending,
                    after_eq: false,
                },
            };
        }
        if init_style == COMMENT {
            return State::Comment;
        }
        State::Text
    }

    fn record_for(state: &State, default_script: u8) -> LineStateRecord {
        let mut rec = LineStateRecord { default_script, ..Default::default() };
        match state {
            State::Text | State::Comment | State::TagName { .. } => {}
            State::InTag { closing, script, lang_attr, .. } => {
                rec.tag_open = true;
                rec.tag_closing = *closing;
                rec.tag_is_script = *script;
                rec.lang_pending = *lang_attr;
            }
            State::AttrName { closing, script, .. } => {
                rec.tag_open = true;
                rec.tag_closing = *closing;
                rec.tag_is_script = *script;
            }
            State::AttrValue { closing, script, lang_attr, .. }
            | State::AttrValueBare { closing, script, lang_attr, .. } => {
                rec.tag_open = true;
                rec.tag_closing = *closing;
                rec.tag_is_script = *script;
                rec.lang_pending = *lang_attr;
            }
            State::Declaration { depth } => rec.decl_depth = *depth,
            State::Script { lang, .. } => rec.sublanguage = lang.id(),
            State::Preproc { lang, before, .. } => {
                rec.sublanguage = lang.id();
                rec.before_preproc = before.encode();
            }
        }
        rec
    }
}

impl Lexer for Markup {
    fn name(&self) -> &'static str {
        "markup"
    }

    fn scan(
        &self,
        init_style: Style,
        words: &[WordList],
        props: &PropertySet,
        acc: &mut Accessor,
    ) {
        let empty = WordList::default();
        let tag_names = words.get(0).unwrap_or(&empty);
        let js_keywords = words.get(1).unwrap_or(&empty);
        let vb_keywords = words.get(2).unwrap_or(&empty);

        let default_script = match props.get("script.default") {
            Some("basic") => SubLang::Basic,
            _ => SubLang::Js,
        };

        let first_line = acc.line_of(acc.start());
        let rec = if first_line > 0 {
            LineStateRecord::unpack(acc.line_state(first_line - 1))
        } else {
            LineStateRecord::default()
        };

        let mut run = Run::new(acc, init_style);
        let mut state = Self::state_from(rec, init_style);
        // Language chosen by an already-closed type= attribute, applied
        // at the tag's '>'
        let mut chosen_lang: Option<SubLang> = None;

        while run.more() {
            if run.at_line_end() {
                let line = run.current_line();
                let rec = Self::record_for(&state, default_script.id());
                run.set_line_state(line, rec.pack());
            }

            match state {
                State::Text => {
                    if run.ch == '<' {
                        if run.matches("<!--") {
                            run.set_style(COMMENT);
                            run.forward_n(4);
                            state = State::Comment;
                        } else if run.ch_next == '?' {
                            run.set_style(QUESTION);
                            run.forward_n(2);
                            while is_word_char(run.ch) && run.more() {
                                run.forward();
                            }
                            run.set_style(default_script.default_style());
                            state = State::Preproc {
                                lang: default_script,
                                inner: Inner::Default,
                                before: Before::Text,
                            };
                        } else if run.ch_next == '!' {
                            run.set_style(DECLARATION);
                            run.forward_n(2);
                            state = State::Declaration { depth: 1 };
                        } else if run.ch_next == '/' {
                            run.set_style(TAG);
                            run.forward_n(2);
                            state = State::TagName { closing: true, start: run.pos };
                        } else if is_word_start(run.ch_next) {
                            run.set_style(TAG);
                            run.forward();
                            state = State::TagName { closing: false, start: run.pos };
                        } else {
                            run.set_style(DEFAULT);
                            run.forward();
                        }
                    } else if run.ch == '&' {
                        // Entities are short and never span lines
                        let mut p = run.pos + 1;
                        while run.char_at(p).is_ascii_alphanumeric() || run.char_at(p) == '#' {
                            p += 1;
                        }
                        if run.char_at(p) == ';' && p > run.pos + 1 {
                            run.set_style(ENTITY);
                            run.forward_n(p - run.pos + 1);
                            run.set_style(DEFAULT);
                        } else {
                            run.set_style(DEFAULT);
                            run.forward();
                        }
                    } else {
                        run.set_style(DEFAULT);
                        run.forward();
                    }
                }
                State::TagName { closing, start } => {
                    if is_tag_char(run.ch) {
                        run.forward();
                    } else {
                        // An empty set 0 treats every name as known
                        let (script, known) = {
                            let name = run.token_since(start);
                            (
                                !closing && name.eq_ignore_ascii_case("script"),
                                tag_names.is_empty() || tag_names.contains(name),
                            )
                        };
                        if !known {
                            run.change_style(TAG_UNKNOWN);
                        }
                        state = State::InTag {
                            closing,
                            script,
                            lang_attr: false,
                            after_eq: false,
                        };
                    }
                }
                State::InTag { closing, script, lang_attr, after_eq } => {
                    if run.ch == '>' {
                        run.set_style(TAG);
                        run.forward();
                        if script && !closing {
                            let lang = chosen_lang.take().unwrap_or(default_script);
                            run.set_style(lang.default_style());
                            state = State::Script { lang, inner: Inner::Default };
                        } else {
                            chosen_lang = None;
                            run.set_style(DEFAULT);
                            state = State::Text;
                        }
                    } else if run.ch == '/' && run.ch_next == '>' {
                        run.set_style(TAG_END);
                        run.forward_n(2);
                        chosen_lang = None;
                        run.set_style(DEFAULT);
                        state = State::Text;
                    } else if run.ch == '"' || run.ch == '\'' {
                        run.set_style(if run.ch == '"' { DOUBLE_STRING } else { SINGLE_STRING });
                        state = State::AttrValue {
                            closing,
                            script,
                            lang_attr: lang_attr && after_eq,
                            quote: run.ch,
                            start: Some(run.pos),
                        };
                        run.forward();
                    } else if run.ch == '=' {
                        run.set_style(DEFAULT);
                        state = State::InTag { closing, script, lang_attr, after_eq: true };
                        run.forward();
                    } else if is_word_start(run.ch) {
                        if after_eq {
                            run.set_style(VALUE);
                            state = State::AttrValueBare {
                                closing,
                                script,
                                lang_attr,
                                start: run.pos,
                            };
                        } else {
                            run.set_style(ATTRIBUTE);
                            state = State::AttrName { closing, script, start: run.pos };
                        }
                        run.forward();
                    } else {
                        run.set_style(DEFAULT);
                        run.forward();
                    }
                }
                State::AttrName { closing, script, start } => {
                    if is_tag_char(run.ch) {
                        run.forward();
                    } else {
                        let name = run.token_since(start);
                        let lang_attr = script
                            && (name.eq_ignore_ascii_case("type")
                                || name.eq_ignore_ascii_case("language"));
                        state = State::InTag { closing, script, lang_attr, after_eq: false };
                    }
                }
                State::AttrValue { closing, script, lang_attr, quote, start } => {
                    if run.ch == quote {
                        if lang_attr {
                            // Deferred commitment: the sublanguage is
                            // only known now that the value has closed
                            chosen_lang = start
                                .and_then(|s| language_from_value(run.text_range(s + 1, run.pos)));
                        }
                        run.forward();
                        run.set_style(DEFAULT);
                        state = State::InTag {
                            closing,
                            script,
                            lang_attr: false,
                            after_eq: false,
                        };
                    } else {
                        run.forward();
                    }
                }
                State::AttrValueBare { closing, script, lang_attr, start } => {
                    if is_blank(run.ch) || run.ch == '>' || is_eol(run.ch) {
                        if lang_attr {
                            chosen_lang = language_from_value(run.token_since(start));
                        }
                        state = State::InTag {
                            closing,
                            script,
                            lang_attr: false,
                            after_eq: false,
                        };
                    } else {
                        run.forward();
                    }
                }
                State::Comment => {
                    if run.matches("-->") {
                        run.forward_n(3);
                        run.set_style(DEFAULT);
                        state = State::Text;
                    } else {
                        run.forward();
                    }
                }
                State::Declaration { depth } => {
                    if run.ch == '<' {
                        state = State::Declaration { depth: depth.saturating_add(1) };
                        run.forward();
                    } else if run.ch == '>' {
                        run.forward();
                        if depth <= 1 {
                            run.set_style(DEFAULT);
                            state = State::Text;
                        } else {
                            state = State::Declaration { depth: depth - 1 };
                        }
                    } else {
                        run.forward();
                    }
                }
                State::Script { lang, inner } => {
                    if run.ch == '<' && run.matches_nocase("</script") {
                        // The close marker always ends the region, even
                        // mid-string, matching browser behaviour
                        run.set_style(TAG);
                        run.forward_n(2);
                        while is_tag_char(run.ch) && run.more() {
                            run.forward();
                        }
                        state = State::InTag {
                            closing: true,
                            script: false,
                            lang_attr: false,
                            after_eq: false,
                        };
                    } else if run.ch == '<'
                        && run.ch_next == '?'
                        && matches!(inner, Inner::Default)
                    {
                        run.set_style(QUESTION);
                        run.forward_n(2);
                        while is_word_char(run.ch) && run.more() {
                            run.forward();
                        }
                        run.set_style(default_script.default_style());
                        state = State::Preproc {
                            lang: default_script,
                            inner: Inner::Default,
                            before: Before::Script(lang),
                        };
                    } else {
                        let next = script_step(&mut run, lang, inner, js_keywords, vb_keywords);
                        state = State::Script { lang, inner: next };
                    }
                }
                State::Preproc { lang, inner, before } => {
                    let can_exit = !matches!(
                        inner,
                        Inner::StringDouble | Inner::StringSingle | Inner::Comment
                    );
                    if run.ch == '?' && run.ch_next == '>' && can_exit {
                        run.set_style(QUESTION);
                        run.forward_n(2);
                        match before {
                            Before::Text => {
                                run.set_style(DEFAULT);
                                state = State::Text;
                            }
                            Before::Script(outer) => {
                                run.set_style(outer.default_style());
                                state = State::Script { lang: outer, inner: Inner::Default };
                            }
                        }
                    } else {
                        let next = script_step(&mut run, lang, inner, js_keywords, vb_keywords);
                        state = State::Preproc { lang, inner: next, before };
                    }
                }
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
        let fold_comment = props.get_bool("fold.comment", true);

        let start = acc.start();
        let end = acc.end();
        let first_line = acc.line_of(start);
        let mut fc = FoldContext::new(acc, first_line, compact);

        for pos in start..end {
            let ch = fc.char_at(pos);
            let style = fc.style_at(pos);

            match style {
                TAG => {
                    if ch == '<' {
                        if fc.char_at(pos + 1) == '/' {
                            fc.decrement();
                        } else {
                            fc.increment();
                        }
                    }
                }
                TAG_END => {
                    // Self-closing cancels the open at '<'
                    if ch == '/' {
                        fc.decrement();
                    }
                }
                QUESTION => {
                    if ch == '<' {
                        fc.increment();
                    } else if ch == '?' && fc.char_at(pos + 1) == '>' {
                        fc.decrement();
                    }
                }
                DECLARATION => {
                    if ch == '<' {
                        fc.increment();
                    } else if ch == '>' {
                        fc.decrement();
                    }
                }
                COMMENT if fold_comment => {
                    if pos == 0 || fc.style_at(pos - 1) != COMMENT {
                        fc.increment();
                    }
                    if fc.style_at(pos + 1) != COMMENT {
                        fc.decrement();
                    }
                }
                JS_OPERATOR => {
                    if ch == '{' {
                        fc.increment();
                    } else if ch == '}' {
                        fc.decrement();
                    }
                }
                _ => {}
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

/// One character step of the embedded script scanner. Styles are per
/// language; the state machine shape is shared.
fn script_step(
    run: &mut Run,
    lang: SubLang,
    inner: Inner,
    js_keywords: &WordList,
    vb_keywords: &WordList,
) -> Inner {
    let (st_default, st_number, st_keyword, st_identifier, st_operator, st_string, st_string_eol) =
        match lang {
            SubLang::Js => (
                JS_DEFAULT,
                JS_NUMBER,
                JS_KEYWORD,
                JS_IDENTIFIER,
                JS_OPERATOR,
                JS_STRING,
                JS_STRING_EOL,
            ),
            SubLang::Basic => (
                VB_DEFAULT,
                VB_NUMBER,
                VB_KEYWORD,
                VB_IDENTIFIER,
                VB_OPERATOR,
                VB_STRING,
                VB_STRING_EOL,
            ),
        };
    let keywords = match lang {
        SubLang::Js => js_keywords,
        SubLang::Basic => vb_keywords,
    };

    match inner {
        Inner::Default => {
            let ch = run.ch;
            if lang == SubLang::Js && ch == '/' && run.ch_next == '/' {
                run.set_style(JS_COMMENT_LINE);
                run.forward_n(2);
                Inner::CommentLine
            } else if lang == SubLang::Js && ch == '/' && run.ch_next == '*' {
                run.set_style(JS_COMMENT);
                run.forward_n(2);
                Inner::Comment
            } else if lang == SubLang::Basic && ch == '\'' {
                run.set_style(VB_COMMENT);
                run.forward();
                Inner::CommentLine
            } else if NumberScanner::starts(ch, run.ch_next) {
                run.set_style(st_number);
                let (scanner, consumed) = NumberScanner::begin(ch, run.ch_next);
                run.forward_n(consumed);
                Inner::Number(scanner)
            } else if is_word_start(ch) {
                run.set_style(st_identifier);
                let start = run.pos;
                run.forward();
                Inner::Word { start }
            } else if ch == '"' {
                run.set_style(st_string);
                run.forward();
                Inner::StringDouble
            } else if lang == SubLang::Js && ch == '\'' {
                run.set_style(JS_CHARACTER);
                run.forward();
                Inner::StringSingle
            } else if is_eol(ch) || is_blank(ch) {
                run.set_style(st_default);
                run.forward();
                Inner::Default
            } else {
                run.set_style(st_operator);
                run.forward();
                Inner::Default
            }
        }
        Inner::Word { start } => {
            if is_word_char(run.ch) {
                run.forward();
                Inner::Word { start }
            } else {
                if keywords.contains(run.token_since(start)) {
                    run.change_style(st_keyword);
                }
                Inner::Default
            }
        }
        Inner::Number(mut scanner) => {
            if scanner.accept(run.ch, run.ch_next) {
                run.forward();
                Inner::Number(scanner)
            } else {
                if !scanner.is_valid() {
                    run.change_style(st_default);
                }
                Inner::Default
            }
        }
        Inner::StringDouble => {
            if lang == SubLang::Js && run.ch == '\\' && !is_eol(run.ch_next) {
                run.forward_n(2);
                Inner::StringDouble
            } else if run.ch == '"' {
                run.forward();
                run.set_style(st_default);
                Inner::Default
            } else if is_eol(run.ch) {
                run.change_style(st_string_eol);
                Inner::Default
            } else {
                run.forward();
                Inner::StringDouble
            }
        }
        Inner::StringSingle => {
            if run.ch == '\\' && !is_eol(run.ch_next) {
                run.forward_n(2);
                Inner::StringSingle
            } else if run.ch == '\'' {
                run.forward();
                run.set_style(st_default);
                Inner::Default
            } else if is_eol(run.ch) {
                run.change_style(st_string_eol);
                Inner::Default
            } else {
                run.forward();
                Inner::StringSingle
            }
        }
        Inner::Comment => {
            if run.ch == '*' && run.ch_next == '/' {
                run.forward_n(2);
                run.set_style(st_default);
                Inner::Default
            } else {
                run.forward();
                Inner::Comment
            }
        }
        Inner::CommentLine => {
            if is_eol(run.ch) {
                Inner::Default
            } else {
                run.forward();
                Inner::CommentLine
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::Document;
    use crate::style;

    fn keyword_sets() -> Vec<WordList> {
        vec![
            WordList::new("script div span html body a br", true),
            WordList::new("var function if else return new", false),
            WordList::new("dim set if then else end sub function", true),
        ]
    }

    fn scan_all(text: &str) -> Document {
        scan_with(text, &PropertySet::new())
    }

    fn scan_with(text: &str, props: &PropertySet) -> Document {
        let mut doc = Document::new(text);
        let words = keyword_sets();
        let len = doc.len();
        let mut acc = Accessor::new(&mut doc, 0, len);
        Markup.scan(style::DEFAULT, &words, props, &mut acc);
        doc
    }

    #[test]
    fn test_plain_tags_and_text() {
        let doc = scan_all("<div>hi</div>\n");
        assert_eq!(doc.style_at(0), TAG); // <
        assert_eq!(doc.style_at(4), TAG); // >
        assert_eq!(doc.style_at(5), DEFAULT); // h
        assert_eq!(doc.style_at(7), TAG); // </
        assert_eq!(doc.style_at(12), TAG); // >
    }

    #[test]
    fn test_attributes_and_values() {
        let doc = scan_all("<a href=\"x\" id=y>\n");
        assert_eq!(doc.style_at(3), ATTRIBUTE); // href
        assert_eq!(doc.style_at(8), DOUBLE_STRING); // "
        assert_eq!(doc.style_at(10), DOUBLE_STRING); // closing "
        assert_eq!(doc.style_at(12), ATTRIBUTE); // id
        assert_eq!(doc.style_at(15), VALUE); // y
        assert_eq!(doc.style_at(16), TAG); // >
    }

    #[test]
    fn test_unknown_tag_name() {
        let doc = scan_all("<foo>x</foo>\n");
        // "<foo" and "</foo" take the unknown style; the '>' stays tag
        for pos in 0..4 {
            assert_eq!(doc.style_at(pos), TAG_UNKNOWN, "pos {pos}");
        }
        assert_eq!(doc.style_at(4), TAG);
        assert_eq!(doc.style_at(5), DEFAULT);
        for pos in 6..11 {
            assert_eq!(doc.style_at(pos), TAG_UNKNOWN, "pos {pos}");
        }
        assert_eq!(doc.style_at(11), TAG);

        // Without a tag list every name is known
        let mut doc = Document::new("<foo>\n");
        let len = doc.len();
        {
            let mut acc = Accessor::new(&mut doc, 0, len);
            Markup.scan(style::DEFAULT, &[], &PropertySet::new(), &mut acc);
        }
        assert_eq!(doc.style_at(1), TAG);
    }

    #[test]
    fn test_entity() {
        let doc = scan_all("a &amp; b\n");
        assert_eq!(doc.style_at(2), ENTITY);
        assert_eq!(doc.style_at(6), ENTITY); // ;
        assert_eq!(doc.style_at(8), DEFAULT);
        // '&' without a closing ';' stays text
        let doc = scan_all("a & b\n");
        assert_eq!(doc.style_at(2), DEFAULT);
    }

    #[test]
    fn test_script_region_end_to_end() {
        let doc = scan_all("<script>var x = 1;</script>\n");
        // Opening tag as tag style
        for pos in 0..8 {
            assert_eq!(doc.style_at(pos), TAG, "pos {pos}");
        }
        assert_eq!(doc.style_at(8), JS_KEYWORD); // var
        assert_eq!(doc.style_at(10), JS_KEYWORD);
        assert_eq!(doc.style_at(12), JS_IDENTIFIER); // x
        assert_eq!(doc.style_at(14), JS_OPERATOR); // =
        assert_eq!(doc.style_at(16), JS_NUMBER); // 1
        assert_eq!(doc.style_at(17), JS_OPERATOR); // ;
        // Closing tag painted back as host tag style
        for pos in 18..27 {
            assert_eq!(doc.style_at(pos), TAG, "pos {pos}");
        }
        // Line state after the line: sublanguage = none
        let rec = LineStateRecord::unpack(doc.line_state(0));
        assert_eq!(rec.sublanguage, 0);
        assert!(!rec.tag_open);
    }

    #[test]
    fn test_language_attribute_selects_basic() {
        let doc = scan_all("<script type=\"text/vbscript\">x = 1 ' c</script>\n");
        let body = 29; // after '>'
        assert_eq!(doc.style_at(body), VB_IDENTIFIER); // x
        assert_eq!(doc.style_at(body + 2), VB_OPERATOR); // =
        assert_eq!(doc.style_at(body + 4), VB_NUMBER); // 1
        assert_eq!(doc.style_at(body + 6), VB_COMMENT); // '
    }

    #[test]
    fn test_multi_line_script_line_state() {
        let doc = scan_all("<script>\nvar a;\n</script>\n");
        let rec0 = LineStateRecord::unpack(doc.line_state(0));
        assert_eq!(rec0.sublanguage, SubLang::Js.id());
        let rec1 = LineStateRecord::unpack(doc.line_state(1));
        assert_eq!(rec1.sublanguage, SubLang::Js.id());
        let rec2 = LineStateRecord::unpack(doc.line_state(2));
        assert_eq!(rec2.sublanguage, 0);
    }

    #[test]
    fn test_preproc_block_inside_text() {
        let doc = scan_all("a <? x ?> b\n");
        assert_eq!(doc.style_at(0), DEFAULT);
        assert_eq!(doc.style_at(2), QUESTION); // <
        assert_eq!(doc.style_at(3), QUESTION); // ?
        assert_eq!(doc.style_at(5), JS_IDENTIFIER); // x
        assert_eq!(doc.style_at(7), QUESTION); // ?
        assert_eq!(doc.style_at(8), QUESTION); // >
        assert_eq!(doc.style_at(10), DEFAULT); // b
    }

    #[test]
    fn test_preproc_pushdown_restores_script() {
        let doc = scan_all("<script>a <? b ?> c</script>\n");
        assert_eq!(doc.style_at(8), JS_IDENTIFIER); // a
        assert_eq!(doc.style_at(13), JS_IDENTIFIER); // b
        // After ?> the script region resumes
        assert_eq!(doc.style_at(18), JS_IDENTIFIER); // c
    }

    #[test]
    fn test_declaration_nesting() {
        let doc = scan_all("<!DOCTYPE x [<!ENTITY y \"z\">]>ok\n");
        assert_eq!(doc.style_at(0), DECLARATION);
        assert_eq!(doc.style_at(13), DECLARATION); // inner <
        assert_eq!(doc.style_at(29), DECLARATION); // final >
        assert_eq!(doc.style_at(30), DEFAULT); // o
    }

    #[test]
    fn test_comment_multi_line() {
        let doc = scan_all("<!-- a\nb -->c\n");
        assert_eq!(doc.style_at(0), COMMENT);
        assert_eq!(doc.style_at(6), COMMENT); // newline inside
        assert_eq!(doc.style_at(11), COMMENT); // >
        assert_eq!(doc.style_at(12), DEFAULT); // c
    }

    #[test]
    fn test_chunked_scan_matches_full_scan() {
        let text = "<script type=\"text/vbscript\">\ndim a\n</script>\n<!-- c\nd -->\n<p>&lt;</p>\n";
        let full = scan_all(text);

        let mut doc = Document::new(text);
        let words = keyword_sets();
        let props = PropertySet::new();
        // Scan line by line, resuming from line states, as an editor would
        let mut pos = 0;
        while pos < doc.len() {
            let line = doc.line_of(pos);
            let next = doc.line_end(line);
            let init = if pos == 0 { style::DEFAULT } else { doc.style_at(pos - 1) };
            {
                let mut acc = Accessor::new(&mut doc, pos, next - pos);
                Markup.scan(init, &words, &props, &mut acc);
            }
            pos = next;
        }
        assert_eq!(doc.styles(), full.styles());
        assert_eq!(doc.line_states(), full.line_states());
    }

    #[test]
    fn test_line_state_record_roundtrip() {
        let rec = LineStateRecord {
            sublanguage: 2,
            tag_open: true,
            tag_closing: false,
            tag_is_script: true,
            default_script: 1,
            before_preproc: 3,
            lang_pending: true,
            decl_depth: 5,
        };
        assert_eq!(LineStateRecord::unpack(rec.pack()), rec);
        assert_eq!(LineStateRecord::unpack(0), LineStateRecord::default());
    }

    #[test]
    fn test_default_script_property() {
        let props = PropertySet::parse("script.default = basic");
        let doc = scan_with("<script>x = 1\n</script>\n", &props);
        assert_eq!(doc.style_at(8), VB_IDENTIFIER);
    }

    #[test]
    fn test_fold_script_region() {
        let mut doc = scan_all("<div>\n<script>\nif (a) {\nb();\n}\n</script>\n</div>\n");
        {
            let words = keyword_sets();
            let props = PropertySet::new();
            let len = doc.len();
            let mut acc = Accessor::new(&mut doc, 0, len);
            Markup.fold(style::DEFAULT, &words, &props, &mut acc);
        }
        use crate::fold::{is_header, level_number, FOLD_BASE};
        assert!(is_header(doc.fold_level(0))); // <div>
        assert!(is_header(doc.fold_level(1))); // <script>
        assert!(is_header(doc.fold_level(2))); // {
        assert_eq!(level_number(doc.fold_level(3)), FOLD_BASE + 3); // b();
        // Each close steps back out
        assert_eq!(level_number(doc.fold_level(6)), FOLD_BASE);
    }
}
