//! Checksum trailer line
//!
//! The last line of a settings file is a carriage return, the decimal
//! checksum of every preceding byte, and a line feed. Data lines never start
//! with a carriage return because keys cannot contain one.

use crate::{FormatError, LINE_TERMINATOR, Result, TRAILER_MARKER};

/// Whether a raw line is a trailer line
pub fn is_trailer(line: &[u8]) -> bool {
    line.first() == Some(&TRAILER_MARKER)
}

/// Parsed trailer line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trailer {
    /// Checksum over all data lines
    pub checksum: u32,
}

impl Trailer {
    /// Create a trailer for a checksum
    pub const fn new(checksum: u32) -> Self {
        Self { checksum }
    }

    /// Format as a terminated trailer line
    pub fn to_line(&self) -> String {
        format!("\r{}\n", self.checksum)
    }

    /// Parse a trailer line
    ///
    /// At least one decimal digit is required between the marker and the
    /// line feed, and the number must fit in 32 bits.
    pub fn parse(line: &[u8]) -> Result<Self> {
        let rest = match line.split_first() {
            Some((&TRAILER_MARKER, rest)) => rest,
            _ => return Err(FormatError::NotATrailer),
        };

        let malformed =
            || FormatError::MalformedTrailer(String::from_utf8_lossy(line).into_owned());

        let digits = match rest.split_last() {
            Some((&LINE_TERMINATOR, digits)) => digits,
            _ => return Err(malformed()),
        };

        if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
            return Err(malformed());
        }

        let text = std::str::from_utf8(digits).map_err(|_| malformed())?;
        let checksum = text.parse::<u32>().map_err(|_| malformed())?;
        Ok(Self { checksum })
    }
}
