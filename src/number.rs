//! Numeric literal recognition
//!
//! A small sub-state machine shared by the per-language scanners. It
//! tracks digit groups, a single optional decimal point, an optional
//! radix prefix and an optional signed exponent, with a
//! `between_digits` flag that rejects stray separators. A grammar
//! violation never raises an error: the token is consumed to its end
//! and `is_valid` reports false so the caller can demote its style.

/// Radix of the literal being scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radix {
    Decimal,
    Hex,
    Octal,
    Binary,
}

impl Radix {
    fn accepts(self, ch: char) -> bool {
        match self {
            Radix::Decimal => ch.is_ascii_digit(),
            Radix::Hex => ch.is_ascii_hexdigit(),
            Radix::Octal => ('0'..='7').contains(&ch),
            Radix::Binary => ch == '0' || ch == '1',
        }
    }

    fn exponent_marker(self, ch: char) -> bool {
        match self {
            Radix::Decimal => ch == 'e' || ch == 'E',
            Radix::Hex => ch == 'p' || ch == 'P',
            _ => false,
        }
    }
}

/// State machine for one numeric literal
#[derive(Debug, Clone)]
pub struct NumberScanner {
    radix: Radix,
    seen_digit: bool,
    seen_dot: bool,
    seen_exponent: bool,
    /// True immediately after a digit; separators are only legal here
    between_digits: bool,
    /// Set when the exponent marker was consumed but its first digit
    /// (or sign) has not been seen yet
    exponent_pending: bool,
    valid: bool,
}

impl NumberScanner {
    /// Whether a literal starts at a character pair. A leading digit
    /// always starts one; a leading dot only when a digit follows.
    pub fn starts(ch: char, ch_next: char) -> bool {
        ch.is_ascii_digit() || (ch == '.' && ch_next.is_ascii_digit())
    }

    /// Begin scanning at the first character of the literal.
    /// Returns the scanner plus how many characters it consumed (two
    /// for a radix prefix such as `0x`).
    pub fn begin(ch: char, ch_next: char) -> (Self, usize) {
        let mut scanner = NumberScanner {
            radix: Radix::Decimal,
            seen_digit: false,
            seen_dot: false,
            seen_exponent: false,
            between_digits: false,
            exponent_pending: false,
            valid: true,
        };

        if ch == '0' {
            let radix = match ch_next {
                'x' | 'X' => Some(Radix::Hex),
                'o' | 'O' => Some(Radix::Octal),
                'b' | 'B' => Some(Radix::Binary),
                _ => None,
            };
            if let Some(radix) = radix {
                scanner.radix = radix;
                return (scanner, 2);
            }
        }

        if ch == '.' {
            scanner.seen_dot = true;
        } else {
            scanner.seen_digit = true;
            scanner.between_digits = true;
        }
        (scanner, 1)
    }

    /// Feed the next character. Returns true when it belongs to the
    /// literal and should be consumed.
    pub fn accept(&mut self, ch: char, ch_next: char) -> bool {
        if self.radix.accepts(ch) {
            self.seen_digit = true;
            self.between_digits = true;
            self.exponent_pending = false;
            return true;
        }

        match ch {
            // Digit-group separators are only legal between digits
            '_' | '\'' => {
                if !self.between_digits || !self.radix.accepts(ch_next) {
                    self.valid = false;
                }
                self.between_digits = false;
                true
            }
            '.' => {
                if self.seen_dot || self.seen_exponent || self.radix != Radix::Decimal {
                    // A second dot ends the literal (member access)
                    return false;
                }
                self.seen_dot = true;
                self.between_digits = false;
                true
            }
            '+' | '-' => {
                // Sign is only part of the literal right after the marker
                if self.exponent_pending {
                    self.exponent_pending = false;
                    self.between_digits = false;
                    if !ch_next.is_ascii_digit() {
                        self.valid = false;
                    }
                    true
                } else {
                    false
                }
            }
            _ if self.radix.exponent_marker(ch) => {
                if self.seen_exponent {
                    self.valid = false;
                } else {
                    self.seen_exponent = true;
                    self.exponent_pending = true;
                    self.between_digits = false;
                }
                true
            }
            // Common integer/float suffixes are consumed as part of the
            // token; anything else alphabetic is a malformed tail
            'u' | 'U' | 'l' | 'L' | 'f' | 'F' => true,
            _ if ch.is_ascii_alphanumeric() => {
                self.valid = false;
                true
            }
            _ => false,
        }
    }

    /// Whether the literal obeyed the grammar. Callers demote the
    /// token's style rather than reporting an error when this is false.
    pub fn is_valid(&self) -> bool {
        self.valid && self.seen_digit && !self.exponent_pending
    }
}
