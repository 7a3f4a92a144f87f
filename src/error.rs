//! Error types for relex
//!
//! Errors only exist at the configuration surface: language definitions,
//! property files, registry lookups. Scanning itself never fails; lexical
//! defects are recovered in-band with error styles (see `scanner`).

use thiserror::Error;

/// Result type alias for relex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration-surface error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("unknown lexer: {0}")]
    UnknownLexer(String),

    #[error("invalid language definition: {0}")]
    Definition(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
