//! Property configuration support
//!
//! Scanners and folders are tuned by named boolean/integer properties
//! (`fold`, `fold.comment`, `fold.compact`, ...). A `PropertySet` is
//! resolved once per invocation and passed by reference into `scan`
//! and `fold`; it is never consulted between calls.
//!
//! Two text formats are accepted:
//! - simple `key = value` pairs, one per line, `#` comments
//! - a TOML table, with nested tables flattened using dots
//!   (`[fold] comment = true` becomes `fold.comment`)
//!
//! Bad values never abort a scan: typed getters fall back to the
//! caller's default.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// An immutable set of named properties
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    values: HashMap<String, String>,
}

impl PropertySet {
    /// Create an empty property set (all getters return their defaults)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse simple `key = value` lines
    ///
    /// Lines starting with `#` and blank lines are skipped. Later keys
    /// override earlier ones.
    pub fn parse(contents: &str) -> Self {
        let mut values = HashMap::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_lowercase(), value.trim().to_string());
            }
        }

        Self { values }
    }

    /// Parse a TOML table, flattening nested tables with dots
    pub fn from_toml(contents: &str) -> Result<Self> {
        let value: toml::Value = contents.parse()?;
        let table = value
            .as_table()
            .ok_or_else(|| Error::Definition("expected a TOML table".into()))?;

        Ok(Self::from_table(table))
    }

    /// Build from an already-parsed TOML table (language definitions
    /// carry their default properties this way)
    pub(crate) fn from_table(table: &toml::value::Table) -> Self {
        let mut set = Self::new();
        flatten_table(table, "", &mut set.values);
        set
    }

    /// Set a property, overriding any previous value
    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_lowercase(), value.to_string());
    }

    /// Raw string lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Boolean property; unset or unparsable values yield `default`
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(value) => parse_bool(value).unwrap_or(default),
            None => default,
        }
    }

    /// Integer property; unset or unparsable values yield `default`
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(value) => value.trim().parse().unwrap_or(default),
            None => default,
        }
    }
}

fn flatten_table(
    table: &toml::value::Table,
    prefix: &str,
    out: &mut HashMap<String, String>,
) {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key.to_lowercase()
        } else {
            format!("{prefix}.{}", key.to_lowercase())
        };
        match value {
            toml::Value::Table(inner) => flatten_table(inner, &full, out),
            toml::Value::Boolean(b) => {
                out.insert(full, b.to_string());
            }
            toml::Value::Integer(n) => {
                out.insert(full, n.to_string());
            }
            toml::Value::String(s) => {
                out.insert(full, s.clone());
            }
            // Floats, arrays and datetimes have no property meaning; skip
            _ => {}
        }
    }
}

/// Parse a boolean value from a string
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_properties() {
        let props = PropertySet::parse(
            "# folding\n\
             fold = true\n\
             fold.comment = off\n\
             fold.margin.width = 14\n",
        );
        assert!(props.get_bool("fold", false));
        assert!(!props.get_bool("fold.comment", true));
        assert_eq!(props.get_int("fold.margin.width", 0), 14);
    }

    #[test]
    fn test_defaults_on_bad_values() {
        let props = PropertySet::parse("fold = maybe\nfold.compact = \n");
        assert!(props.get_bool("fold", true));
        assert!(!props.get_bool("fold", false));
        assert_eq!(props.get_int("fold.compact", 7), 7);
        // Unset key
        assert!(props.get_bool("fold.comment", true));
    }

    #[test]
    fn test_from_toml() {
        let props = PropertySet::from_toml(
            "fold = true\n\
             [lexer.markup]\n\
             scripts = false\n",
        )
        .unwrap();
        assert!(props.get_bool("fold", false));
        assert!(!props.get_bool("lexer.markup.scripts", true));
    }

    #[test]
    fn test_from_toml_rejects_non_table() {
        assert!(PropertySet::from_toml("= nonsense").is_err());
    }

    #[test]
    fn test_set_overrides() {
        let mut props = PropertySet::parse("fold = false");
        props.set("fold", "true");
        assert!(props.get_bool("fold", false));
    }
}
