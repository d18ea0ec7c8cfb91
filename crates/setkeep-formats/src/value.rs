//! Typed setting values

use std::fmt;

use crate::{FormatError, Result};

/// Type of a setting, fixed at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Signed 64-bit integer
    Integer,
    /// Double precision float
    Real,
    /// Owned UTF-8 string
    String,
}

impl ValueType {
    /// Number of type codes understood by the file format
    pub const COUNT: i64 = 3;

    /// Type code written to persisted lines
    pub const fn code(self) -> u8 {
        match self {
            Self::Integer => 0,
            Self::Real => 1,
            Self::String => 2,
        }
    }

    /// Look up a type by its persisted code
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Self::Integer),
            1 => Ok(Self::Real),
            2 => Ok(Self::String),
            _ => Err(FormatError::InvalidTypeCode(code.to_string())),
        }
    }

    /// Parse the decimal type code field of a data line
    pub fn parse_code(field: &str) -> Result<Self> {
        let code = field
            .parse::<i64>()
            .map_err(|_| FormatError::InvalidTypeCode(field.to_string()))?;
        Self::from_code(code)
    }

    /// Human readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of a setting, carrying its payload inline
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    /// Integer payload
    Integer(i64),
    /// Real payload
    Real(f64),
    /// String payload
    String(String),
}

impl SettingValue {
    /// Type tag of this value
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Integer(_) => ValueType::Integer,
            Self::Real(_) => ValueType::Real,
            Self::String(_) => ValueType::String,
        }
    }

    /// Integer payload, if this is an integer
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Real payload, if this is a real
    pub const fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Format the value field of a data line, without the terminator
    ///
    /// Reals use the shortest representation that parses back to the same
    /// `f64`, which keeps every significant digit the type can hold.
    pub fn to_text(&self) -> String {
        match self {
            Self::Integer(v) => v.to_string(),
            Self::Real(v) => format!("{v:?}"),
            Self::String(v) => v.clone(),
        }
    }

    /// Parse the value field of a data line as the given type
    ///
    /// Numeric text must be consumed completely; trailing characters are an
    /// error. String text is taken verbatim.
    pub fn parse_text(value_type: ValueType, text: &str) -> Result<Self> {
        match value_type {
            ValueType::Integer => text
                .parse::<i64>()
                .map(Self::Integer)
                .map_err(|_| FormatError::InvalidInteger(text.to_string())),
            ValueType::Real => text
                .parse::<f64>()
                .map(Self::Real)
                .map_err(|_| FormatError::InvalidReal(text.to_string())),
            ValueType::String => Ok(Self::String(text.to_string())),
        }
    }

    /// Whether the value survives a write/read cycle through the text format
    ///
    /// Strings that are empty or contain a line feed do not.
    pub fn is_persistable(&self) -> bool {
        match self {
            Self::String(v) => !v.is_empty() && !v.contains('\n'),
            Self::Integer(_) | Self::Real(_) => true,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}
