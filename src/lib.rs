//! relex — incremental, resumable lexical analysis
//!
//! An engine for editor-style syntax highlighting and code folding.
//! Scanners are forward character-by-character state machines that
//! paint one style byte per text byte; a packed per-line state makes
//! a scan resumable at any line start, so an edit only needs a bounded
//! rescan instead of a whole-document pass.
//!
//! The pieces:
//! - [`accessor`]: the document, its derived arrays, and the painting
//!   cursor scanners draw through
//! - [`scanner`]: the [`Lexer`] trait and the sweep cursor
//! - [`resync`]: backward walks and heuristics that find a safe
//!   restart point for constructs the line state cannot capture
//! - [`fold`]: packed fold levels and the per-line fold context
//! - [`lang`]: the built-in scanners (C-like, shell, markup host with
//!   embedded sublanguages) and the language registry
//!
//! A [`Highlighter`] ties one language's scanner, keyword sets and
//! properties together; [`Highlighter::restyle`] is what an editor
//! calls after an edit.
//!
//! ```
//! use relex::{Highlighter, Document, LanguageRegistry};
//!
//! let registry = LanguageRegistry::new();
//! let highlighter = Highlighter::for_language(&registry, "c").unwrap();
//! let mut doc = Document::new("int main(void) { return 0; }\n");
//! highlighter.restyle_all(&mut doc);
//! ```

pub mod accessor;
pub mod config;
pub mod error;
pub mod fold;
pub mod lang;
pub mod number;
pub mod resync;
pub mod scanner;
pub mod style;
pub mod words;

pub use accessor::{Accessor, Document};
pub use config::PropertySet;
pub use error::{Error, Result};
pub use lang::{LanguageDefinition, LanguageRegistry};
pub use scanner::Lexer;
pub use style::Style;
pub use words::WordList;

use tracing::{debug, trace};

/// One language's highlighting session: scanner, keyword sets and
/// properties, bound together once and reused across edits.
pub struct Highlighter {
    lexer: Box<dyn Lexer>,
    words: Vec<WordList>,
    props: PropertySet,
}

impl Highlighter {
    pub fn new(lexer: Box<dyn Lexer>, words: Vec<WordList>, props: PropertySet) -> Self {
        Self { lexer, words, props }
    }

    /// Build a session for a registered language
    pub fn for_language(registry: &LanguageRegistry, name: &str) -> Result<Self> {
        let lang = registry
            .get(name)
            .ok_or_else(|| Error::UnknownLanguage(name.to_string()))?;
        let lexer = lang::lexer_by_name(&lang.lexer)?;
        let words = lang
            .keywords
            .iter()
            .map(|set| WordList::new(set, lang.case_insensitive))
            .collect();
        Ok(Self { lexer, words, props: lang.properties.clone() })
    }

    pub fn lexer_name(&self) -> &str {
        self.lexer.name()
    }

    /// Override a property for this session
    pub fn set_property(&mut self, key: &str, value: &str) {
        self.props.set(key, value);
    }

    /// Re-lex after an edit touching `[pos, pos + length)`.
    ///
    /// The start is moved back to a point the scanner can resume from
    /// and the end is extended to a line boundary. If re-scanning
    /// changes the styles or line state at the end of the range, the
    /// rescan continues line by line until it converges or reaches the
    /// end of the document.
    pub fn restyle(&self, doc: &mut Document, pos: usize, length: usize) {
        if doc.is_empty() {
            return;
        }
        let requested_end = pos.saturating_add(length).min(doc.len());
        let (scan_start, scan_init) =
            resync::safe_start(self.lexer.as_ref(), doc, pos.min(doc.len()));

        // Whole lines only: cover through the end of the last touched line
        let anchor = requested_end.max(scan_start + 1).min(doc.len());
        let mut end = doc.line_end(doc.line_of(anchor - 1));
        debug!(lexer = self.lexer.name(), start = scan_start, end, "restyle");

        let mut start = scan_start;
        let mut init_style = scan_init;
        let mut fold_start = scan_start;
        loop {
            let last_line = doc.line_of(end - 1);
            let state_before = doc.line_state(last_line);
            let style_before = doc.style_at(end - 1);
            {
                let mut acc = Accessor::new(doc, start, end - start);
                self.lexer.scan(init_style, &self.words, &self.props, &mut acc);
            }
            if end >= doc.len()
                || (doc.line_state(last_line) == state_before
                    && doc.style_at(end - 1) == style_before)
            {
                break;
            }
            // The edit changed what carries past this line; the next
            // line must be rescanned too. Resynchronize again: the
            // rescan may have opened a construct the scanner can only
            // resume from further back.
            let (next_start, next_init) = resync::safe_start(self.lexer.as_ref(), doc, end);
            start = next_start;
            init_style = next_init;
            fold_start = fold_start.min(start);
            end = doc.line_end(doc.line_of(end));
            trace!(end, "rescan extended past changed line boundary");
        }

        // Fold the rescanned lines, then keep extending while the last
        // folded line changes the level the following line starts at.
        // A brace edit can move every level below it without changing
        // a single style byte there.
        let mut fold_pos = fold_start;
        loop {
            let last_line = doc.line_of(end - 1);
            let next_before = fold::next_level(doc.fold_level(last_line));
            {
                let mut acc = Accessor::new(doc, fold_pos, end - fold_pos);
                self.lexer.fold(scan_init, &self.words, &self.props, &mut acc);
            }
            if end >= doc.len()
                || fold::next_level(doc.fold_level(last_line)) == next_before
            {
                break;
            }
            fold_pos = end;
            end = doc.line_end(doc.line_of(end));
            trace!(end, "fold extended past changed level boundary");
        }
    }

    /// Re-lex the whole document
    pub fn restyle_all(&self, doc: &mut Document) {
        self.restyle(doc, 0, doc.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::{is_header, is_white, level_number, next_level, FOLD_BASE};
    use crate::lang::markup::LineStateRecord;
    use pretty_assertions::assert_eq;

    fn session(name: &str) -> Highlighter {
        let registry = LanguageRegistry::new();
        Highlighter::for_language(&registry, name).unwrap()
    }

    fn snapshot(doc: &Document) -> (Vec<Style>, Vec<i32>, Vec<i32>) {
        (
            doc.styles().to_vec(),
            doc.line_states().to_vec(),
            doc.fold_levels().to_vec(),
        )
    }

    #[test]
    fn test_unknown_language() {
        let registry = LanguageRegistry::new();
        assert!(matches!(
            Highlighter::for_language(&registry, "cobol"),
            Err(Error::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let text = "/* intro */\nint main(void) {\n    return 1 + 2;\n}\n";
        let highlighter = session("c");
        let mut doc = Document::new(text);
        highlighter.restyle_all(&mut doc);
        let first = snapshot(&doc);
        highlighter.restyle_all(&mut doc);
        assert_eq!(snapshot(&doc), first);
    }

    #[test]
    fn test_partial_restyle_matches_full() {
        let text = "int a;\nchar *s = \"x\";\n// done\n";
        let highlighter = session("c");
        let mut full = Document::new(text);
        highlighter.restyle_all(&mut full);

        // Restyle in two arbitrary pieces over a fresh document
        let mut doc = Document::new(text);
        highlighter.restyle(&mut doc, 0, 10);
        highlighter.restyle(&mut doc, 10, text.len() - 10);
        assert_eq!(snapshot(&doc), snapshot(&full));
    }

    #[test]
    fn test_resumable_after_confined_edit() {
        let text = "int alpha;\nint beta;\nint gamma;\n";
        let highlighter = session("c");
        let mut doc = Document::new(text);
        highlighter.restyle_all(&mut doc);

        // Rename "beta" to "delta" and restyle only the edit
        let pos = text.find("beta").unwrap();
        doc.apply_edit(pos, 4, "delta");
        highlighter.restyle(&mut doc, pos, 5);

        let mut fresh = Document::new(doc.text());
        highlighter.restyle_all(&mut fresh);
        assert_eq!(snapshot(&doc), snapshot(&fresh));
    }

    #[test]
    fn test_edit_opening_comment_propagates() {
        let text = "int a;\nint b;\nint c;\n";
        let highlighter = session("c");
        let mut doc = Document::new(text);
        highlighter.restyle_all(&mut doc);

        // Opening a block comment re-styles everything below the edit
        doc.apply_edit(0, 0, "/* ");
        highlighter.restyle(&mut doc, 0, 3);

        let mut fresh = Document::new(doc.text());
        highlighter.restyle_all(&mut fresh);
        assert_eq!(snapshot(&doc), snapshot(&fresh));
    }

    #[test]
    fn test_edit_creating_heredoc_propagates() {
        let text = "cat END\nbody\nEND\nafter\n";
        let highlighter = session("shell");
        let mut doc = Document::new(text);
        highlighter.restyle_all(&mut doc);

        // "cat END" becomes "cat <<END": the following lines turn into
        // a heredoc body and terminator
        doc.apply_edit(4, 0, "<<");
        highlighter.restyle(&mut doc, 4, 2);

        let mut fresh = Document::new(doc.text());
        highlighter.restyle_all(&mut fresh);
        assert_eq!(snapshot(&doc), snapshot(&fresh));
        let body = doc.text().find("body").unwrap();
        assert_eq!(doc.style_at(body), lang::shell::HERE_BODY);
    }

    #[test]
    fn test_edit_opening_brace_updates_folds_below() {
        let text = "a;\nb;\nc;\n";
        let highlighter = session("c");
        let mut doc = Document::new(text);
        highlighter.restyle_all(&mut doc);

        // The brace deepens every line below the edit without changing
        // a single style there
        doc.apply_edit(0, 0, "{");
        highlighter.restyle(&mut doc, 0, 1);

        let mut fresh = Document::new(doc.text());
        highlighter.restyle_all(&mut fresh);
        assert_eq!(snapshot(&doc), snapshot(&fresh));
        assert_eq!(level_number(doc.fold_level(1)), FOLD_BASE + 1);
        assert_eq!(level_number(doc.fold_level(2)), FOLD_BASE + 1);
    }

    #[test]
    fn test_compound_keyword_precedence() {
        let text = "if (a) b(); else if (c) d();\n";
        let highlighter = session("c");
        let mut doc = Document::new(text);
        highlighter.restyle_all(&mut doc);

        // "else if" is one keyword run, not keyword + identifier
        let start = text.find("else").unwrap();
        for pos in start..start + 7 {
            assert_eq!(doc.style_at(pos), lang::clike::KEYWORD, "pos {pos}");
        }
    }

    #[test]
    fn test_fold_else_chain_net_zero() {
        let text = "if (x) {\ny();\n} else {\nz();\n}\n\n";
        let highlighter = session("c");
        let mut doc = Document::new(text);
        highlighter.restyle_all(&mut doc);

        assert!(is_header(doc.fold_level(0)));
        assert_eq!(level_number(doc.fold_level(1)), FOLD_BASE + 1);
        // "} else {" closes and reopens at the same level: one header
        // at the outer level, not a dip
        assert_eq!(level_number(doc.fold_level(2)), FOLD_BASE);
        assert!(is_header(doc.fold_level(2)));
        assert_eq!(next_level(doc.fold_level(2)), FOLD_BASE + 1);
        assert_eq!(level_number(doc.fold_level(4)), FOLD_BASE);
        // The trailing blank line is white, never a header
        assert!(is_white(doc.fold_level(5)));
        assert!(!is_header(doc.fold_level(5)));
    }

    #[test]
    fn test_heredoc_restart_roundtrip() {
        let text = "echo start\ncat <<END\nalpha body\nbeta body\nEND\necho after\n";
        let highlighter = session("shell");
        let mut doc = Document::new(text);
        highlighter.restyle_all(&mut doc);
        let full = snapshot(&doc);

        // Edit inside the body; the restart must back out of the
        // heredoc to its opener line before rescanning
        let pos = text.find("beta").unwrap();
        doc.apply_edit(pos, 4, "gama");
        highlighter.restyle(&mut doc, pos, 4);
        doc.apply_edit(pos, 4, "beta");
        highlighter.restyle(&mut doc, pos, 4);

        assert_eq!(snapshot(&doc), full);
    }

    #[test]
    fn test_script_tag_end_to_end() {
        let text = "<script>var x = 1;</script>\n";
        let highlighter = session("html");
        let mut doc = Document::new(text);
        highlighter.restyle_all(&mut doc);

        use crate::lang::markup;
        assert_eq!(doc.style_at(0), markup::TAG);
        assert_eq!(doc.style_at(8), markup::JS_KEYWORD);
        assert_eq!(doc.style_at(12), markup::JS_IDENTIFIER);
        assert_eq!(doc.style_at(14), markup::JS_OPERATOR);
        assert_eq!(doc.style_at(16), markup::JS_NUMBER);
        assert_eq!(doc.style_at(18), markup::TAG);

        // Both regions opened and closed on this line
        let rec = LineStateRecord::unpack(doc.line_state(0));
        assert_eq!(rec.sublanguage, 0);
        assert!(!rec.tag_open);
    }

    #[test]
    fn test_shebang_detection_to_session() {
        let registry = LanguageRegistry::new();
        let text = "#!/bin/sh\nls\n";
        let name = registry.detect(None, text).unwrap();
        let highlighter = Highlighter::for_language(&registry, name).unwrap();
        assert_eq!(highlighter.lexer_name(), "shell");

        let mut doc = Document::new(text);
        highlighter.restyle_all(&mut doc);
        assert_eq!(doc.style_at(0), lang::shell::COMMENT);
    }

    #[test]
    fn test_property_override() {
        let text = "{\nx;\n}\n";
        let mut highlighter = session("c");
        highlighter.set_property("fold", "0");
        let mut doc = Document::new(text);
        highlighter.restyle_all(&mut doc);
        assert_eq!(doc.fold_level(0), 0);
    }
}
