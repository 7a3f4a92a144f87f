//! Keyword lists
//!
//! A `WordList` is an immutable, optionally case-folded set of tokens
//! built once per language configuration and shared read-only across
//! scan calls. Multi-part entries use `\x01` as a soft separator
//! ("else\x01if" matches the two words "else if" in the text) and are
//! probed longest-first so a compound always wins over its prefix.

use std::collections::HashSet;

/// An immutable set of recognized tokens
#[derive(Debug, Clone, Default)]
pub struct WordList {
    /// Single-word entries, case-folded when insensitive
    words: HashSet<String>,
    /// Multi-part entries as part lists, most parts / longest text first
    compounds: Vec<Vec<String>>,
    case_insensitive: bool,
}

impl WordList {
    /// Build from whitespace-separated tokens, deduplicating and
    /// reordering multi-part entries longest-first.
    pub fn new(tokens: &str, case_insensitive: bool) -> Self {
        let mut words = HashSet::new();
        let mut compounds: Vec<Vec<String>> = Vec::new();

        for token in tokens.split_whitespace() {
            let token = if case_insensitive {
                token.to_lowercase()
            } else {
                token.to_string()
            };
            if token.contains('\x01') {
                let parts: Vec<String> =
                    token.split('\x01').map(|p| p.to_string()).collect();
                if !compounds.contains(&parts) {
                    compounds.push(parts);
                }
            } else {
                words.insert(token);
            }
        }

        // Longer variants probe before shorter prefixes
        compounds.sort_by(|a, b| {
            b.len()
                .cmp(&a.len())
                .then_with(|| total_len(b).cmp(&total_len(a)))
        });

        Self { words, compounds, case_insensitive }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.compounds.is_empty()
    }

    /// Whether a single token is in the list
    pub fn contains(&self, token: &str) -> bool {
        if self.case_insensitive {
            self.words.contains(&token.to_lowercase())
        } else {
            self.words.contains(token)
        }
    }

    /// Longest match at the head of `rest`, which must begin at a word
    /// start. Compound entries are probed first; parts may be separated
    /// by runs of spaces or tabs in the text. Returns the byte length
    /// of the matched text, ending on a word boundary.
    pub fn longest_match(
        &self,
        rest: &str,
        is_word_char: impl Fn(char) -> bool,
    ) -> Option<usize> {
        for parts in &self.compounds {
            if let Some(len) = self.match_parts(rest, parts, &is_word_char) {
                return Some(len);
            }
        }

        let word_len = rest
            .char_indices()
            .find(|&(_, c)| !is_word_char(c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if word_len > 0 && self.contains(&rest[..word_len]) {
            return Some(word_len);
        }
        None
    }

    fn match_parts(
        &self,
        rest: &str,
        parts: &[String],
        is_word_char: &impl Fn(char) -> bool,
    ) -> Option<usize> {
        let mut pos = 0;
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                // Separator: one or more blanks
                let blanks = rest[pos..]
                    .bytes()
                    .take_while(|&b| b == b' ' || b == b'\t')
                    .count();
                if blanks == 0 {
                    return None;
                }
                pos += blanks;
            }
            let candidate = rest.get(pos..pos + part.len())?;
            let matches = if self.case_insensitive {
                candidate.eq_ignore_ascii_case(part)
            } else {
                candidate == part
            };
            if !matches {
                return None;
            }
            pos += part.len();
        }
        // The compound must end on a word boundary
        match rest[pos..].chars().next() {
            Some(c) if is_word_char(c) => None,
            _ => Some(pos),
        }
    }
}

fn total_len(parts: &[String]) -> usize {
    parts.iter().map(|p| p.len()).sum()
}
