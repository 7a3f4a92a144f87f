//! Style code space
//!
//! Styles are small non-negative integers stored one per character.
//! 0 is the default/unstyled code. Codes below 128 are built-in and
//! defined per language (see the `lang` modules); 128 and above are
//! reserved for dynamically registered substyles.

/// A per-character style code
pub type Style = u8;

/// The default/unstyled code, reserved across all languages
pub const DEFAULT: Style = 0;

/// First code of the dynamically registered substyle range
pub const SUBSTYLE_BASE: Style = 128;

/// Number of substyle codes available
pub const SUBSTYLE_COUNT: usize = 128;

/// Whether a code lies in the substyle range
pub fn is_substyle(style: Style) -> bool {
    style >= SUBSTYLE_BASE
}
