//! Value model and persisted text format for setkeep settings
//!
//! A settings file is a sequence of data lines followed by one trailer line:
//!
//! ```text
//! <key><TAB><type-code><TAB><value><LF>
//! ...
//! <CR><crc32-decimal><LF>
//! ```
//!
//! Type codes are `0` (integer), `1` (real) and `2` (string). String values
//! are written verbatim with no escaping, so a value containing a line feed
//! cannot be read back, and an empty string produces a line the parser
//! rejects for its missing value field.
//!
//! This crate only knows the syntax. Checksumming and file I/O live in
//! `setkeep-storage`.
//!
//! # Example
//!
//! ```
//! use setkeep_formats::{SettingLine, SettingValue, Trailer};
//!
//! let line = SettingLine::new("net.timeout", SettingValue::Integer(45));
//! assert_eq!(line.to_line(), "net.timeout\t0\t45\n");
//!
//! let parsed = SettingLine::parse(b"net.timeout\t0\t45\n").expect("valid line");
//! assert_eq!(parsed, line);
//!
//! let trailer = Trailer::parse(b"\r123456\n").expect("valid trailer");
//! assert_eq!(trailer.checksum, 123_456);
//! ```

#![warn(missing_docs)]

pub mod line;
pub mod trailer;
pub mod value;

pub use line::{SettingLine, format_line};
pub use trailer::{Trailer, is_trailer};
pub use value::{SettingValue, ValueType};

use thiserror::Error;

/// Separator between the key, type code and value of a data line.
pub const FIELD_SEPARATOR: char = '\t';

/// Terminator of every line, data and trailer alike.
pub const LINE_TERMINATOR: u8 = b'\n';

/// First byte of the trailer line.
pub const TRAILER_MARKER: u8 = b'\r';

/// Result type for format operations.
pub type Result<T> = std::result::Result<T, FormatError>;

/// Errors raised while parsing persisted settings text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A data line is missing one of its three fields, or the field is empty.
    #[error("Missing {0} field")]
    MissingField(&'static str),

    /// Type code is not a number in the known range.
    #[error("Invalid type code: {0:?}")]
    InvalidTypeCode(String),

    /// Integer value text did not parse as a signed 64-bit integer.
    #[error("Invalid integer value: {0:?}")]
    InvalidInteger(String),

    /// Real value text did not parse as a double.
    #[error("Invalid real value: {0:?}")]
    InvalidReal(String),

    /// Line bytes are not valid UTF-8.
    #[error("Line is not valid UTF-8")]
    InvalidUtf8,

    /// Line does not start with the trailer marker.
    #[error("Not a trailer line")]
    NotATrailer,

    /// Trailer line does not hold a terminated decimal checksum.
    #[error("Malformed trailer: {0:?}")]
    MalformedTrailer(String),
}
