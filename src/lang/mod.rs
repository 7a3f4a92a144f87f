//! Language registry and built-in definitions
//!
//! A `LanguageDefinition` binds a scanner (by registry name) to a
//! language: its keyword sets, file extensions, content-detection
//! pattern and default properties. The built-in set covers the three
//! scanner families; further definitions reusing those scanners can be
//! loaded from TOML:
//!
//! ```toml
//! name = "zsh"
//! lexer = "shell"
//! extensions = ["zsh"]
//! first-line = '^#!.*\bzsh\b'
//! keywords = ["if then else elif fi for while do done case esac"]
//!
//! [properties]
//! fold = true
//! ```

pub mod clike;
pub mod markup;
pub mod shell;

pub use clike::CLike;
pub use markup::Markup;
pub use shell::Shell;

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;

use crate::config::PropertySet;
use crate::error::{Error, Result};
use crate::scanner::Lexer;

/// Instantiate a scanner by its registry name
pub fn lexer_by_name(name: &str) -> Result<Box<dyn Lexer>> {
    match name {
        "clike" => Ok(Box::new(CLike)),
        "shell" => Ok(Box::new(Shell)),
        "markup" => Ok(Box::new(Markup)),
        other => Err(Error::UnknownLexer(other.to_string())),
    }
}

/// A language: a scanner plus the data that parameterizes it
pub struct LanguageDefinition {
    pub name: String,
    /// Registry name of the scanner this language uses
    pub lexer: String,
    pub extensions: Vec<String>,
    /// Keyword sets, one space-separated string per set; their order
    /// matches the set indices the scanner consults
    pub keywords: Vec<String>,
    pub case_insensitive: bool,
    /// Default properties, overridable per highlight session
    pub properties: PropertySet,
    /// Pattern matched against a document's first line for
    /// content-based detection (shebangs, XML prologs)
    pub first_line: Option<Regex>,
}

impl LanguageDefinition {
    pub fn new(name: &str, lexer: &str) -> Self {
        Self {
            name: name.to_string(),
            lexer: lexer.to_string(),
            extensions: Vec::new(),
            keywords: Vec::new(),
            case_insensitive: false,
            properties: PropertySet::new(),
            first_line: None,
        }
    }
}

/// Registry of language definitions with extension and content lookup
pub struct LanguageRegistry {
    languages: HashMap<String, LanguageDefinition>,
    extension_map: HashMap<String, String>,
}

impl LanguageRegistry {
    /// Create a registry holding the built-in languages
    pub fn new() -> Self {
        let mut registry = Self {
            languages: HashMap::new(),
            extension_map: HashMap::new(),
        };
        for lang in builtin_languages() {
            registry.add_language(lang);
        }
        registry
    }

    /// Add a definition, replacing any previous one of the same name
    pub fn add_language(&mut self, lang: LanguageDefinition) {
        let name = lang.name.clone();
        for ext in &lang.extensions {
            self.extension_map.insert(ext.to_lowercase(), name.clone());
        }
        self.languages.insert(name, lang);
    }

    /// Load a definition from its TOML form (see module docs)
    pub fn load_definition(&mut self, contents: &str) -> Result<()> {
        let value: toml::Value = contents.parse()?;
        let table = value
            .as_table()
            .ok_or_else(|| Error::Definition("expected a TOML table".into()))?;

        let name = table
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Definition("missing 'name'".into()))?;
        let lexer = table
            .get("lexer")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::Definition("missing 'lexer'".into()))?;
        // Fail early on a scanner name nothing can instantiate
        lexer_by_name(lexer)?;

        let mut lang = LanguageDefinition::new(name, lexer);

        if let Some(exts) = table.get("extensions").and_then(|v| v.as_array()) {
            for ext in exts {
                if let Some(ext) = ext.as_str() {
                    lang.extensions.push(ext.to_string());
                }
            }
        }
        if let Some(sets) = table.get("keywords").and_then(|v| v.as_array()) {
            for set in sets {
                if let Some(set) = set.as_str() {
                    lang.keywords.push(set.to_string());
                }
            }
        }
        if let Some(ci) = table.get("case-insensitive").and_then(|v| v.as_bool()) {
            lang.case_insensitive = ci;
        }
        if let Some(pattern) = table.get("first-line").and_then(|v| v.as_str()) {
            let regex = Regex::new(pattern)
                .map_err(|e| Error::Definition(format!("bad first-line pattern: {e}")))?;
            lang.first_line = Some(regex);
        }
        if let Some(props) = table.get("properties").and_then(|v| v.as_table()) {
            lang.properties = PropertySet::from_table(props);
        }

        self.add_language(lang);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&LanguageDefinition> {
        self.languages.get(name)
    }

    /// Detect a language from a filename's extension
    pub fn detect_by_filename(&self, filename: &Path) -> Option<&str> {
        let ext = filename.extension()?.to_str()?.to_lowercase();
        self.extension_map.get(&ext).map(|s| s.as_str())
    }

    /// Detect a language from a document's first line
    pub fn detect_by_content(&self, text: &str) -> Option<&str> {
        let first_line = text.lines().next().unwrap_or("");
        // Name order keeps detection deterministic
        let mut names: Vec<_> = self.languages.keys().collect();
        names.sort();
        for name in names {
            if let Some(lang) = self.languages.get(name) {
                if let Some(regex) = &lang.first_line {
                    if regex.is_match(first_line) {
                        return Some(lang.name.as_str());
                    }
                }
            }
        }
        None
    }

    /// Filename detection first, then content detection
    pub fn detect(&self, filename: Option<&Path>, text: &str) -> Option<&str> {
        filename
            .and_then(|f| self.detect_by_filename(f))
            .or_else(|| self.detect_by_content(text))
    }

    /// Available language names, sorted
    pub fn list_languages(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.languages.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_languages() -> Vec<LanguageDefinition> {
    vec![c_language(), shell_language(), html_language()]
}

fn c_language() -> LanguageDefinition {
    let mut lang = LanguageDefinition::new("c", "clike");
    for ext in ["c", "h", "cpp", "hpp", "cc", "cxx"] {
        lang.extensions.push(ext.to_string());
    }
    lang.keywords.push(
        "auto break case char const continue default do double else enum \
         extern float for goto if inline int long register return short \
         signed sizeof static struct switch typedef union unsigned void \
         volatile while else\x01if"
            .to_string(),
    );
    lang.keywords.push(
        "size_t ptrdiff_t intptr_t uintptr_t int8_t int16_t int32_t int64_t \
         uint8_t uint16_t uint32_t uint64_t FILE NULL bool true false"
            .to_string(),
    );
    lang
}

fn shell_language() -> LanguageDefinition {
    let mut lang = LanguageDefinition::new("shell", "shell");
    for ext in ["sh", "bash", "ksh", "zsh"] {
        lang.extensions.push(ext.to_string());
    }
    lang.keywords.push(
        "if then else elif fi for while until do done case esac function \
         in select time break continue return exit export local readonly \
         shift unset"
            .to_string(),
    );
    lang.first_line = Regex::new(r"^#!.*\b(ba|da|k|z)?sh\b").ok();
    lang
}

fn html_language() -> LanguageDefinition {
    let mut lang = LanguageDefinition::new("html", "markup");
    for ext in ["html", "htm", "xhtml", "xml"] {
        lang.extensions.push(ext.to_string());
    }
    // Set 0: tag names; sets 1 and 2: embedded script keywords
    lang.keywords.push(
        "a abbr address area article aside audio b base blockquote body br \
         button canvas caption code col div dl dt em embed fieldset figure \
         footer form h1 h2 h3 h4 h5 h6 head header hr html i iframe img \
         input label legend li link main map mark meta nav noscript object \
         ol optgroup option p param pre q script section select small \
         source span strong style sub summary sup table tbody td template \
         textarea tfoot th thead title tr track u ul var video"
            .to_string(),
    );
    lang.keywords.push(
        "break case catch const continue default delete do else finally \
         for function if in instanceof let new return switch this throw \
         try typeof var void while with"
            .to_string(),
    );
    lang.keywords.push(
        "and as boolean byref byval call case class const dim do each else \
         elseif end erase error exit false for function get if in is let \
         loop mod new next not nothing on or private property public redim \
         rem resume select set stop sub then to true until wend while with"
            .to_string(),
    );
    lang.case_insensitive = true;
    lang.first_line = Regex::new(r"(?i)^\s*<(\?xml|!doctype\s+html|html)").ok();
    lang
}
