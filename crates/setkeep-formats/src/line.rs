//! Data lines of a settings file
//!
//! Each persisted setting occupies one line: key, type code and value text
//! separated by tabs and terminated by a line feed. The value is the
//! remainder of the line, so string values may themselves contain tabs.

use crate::value::{SettingValue, ValueType};
use crate::{FIELD_SEPARATOR, FormatError, Result};

/// One persisted setting
#[derive(Debug, Clone, PartialEq)]
pub struct SettingLine {
    /// Setting key
    pub key: String,
    /// Current value at the time of writing
    pub value: SettingValue,
}

impl SettingLine {
    /// Create a new line
    pub fn new(key: impl Into<String>, value: SettingValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Format as a terminated data line
    pub fn to_line(&self) -> String {
        format_line(&self.key, &self.value)
    }

    /// Parse a data line as read from a settings file
    ///
    /// The trailing line feed is optional. All three fields must be present
    /// and non-empty.
    pub fn parse(line: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(line).map_err(|_| FormatError::InvalidUtf8)?;
        let body = text.strip_suffix('\n').unwrap_or(text);

        let mut fields = body.splitn(3, FIELD_SEPARATOR);
        let key = non_empty(fields.next(), "key")?;
        let code = non_empty(fields.next(), "type code")?;
        let raw_value = non_empty(fields.next(), "value")?;

        let value_type = ValueType::parse_code(code)?;
        let value = SettingValue::parse_text(value_type, raw_value)?;

        Ok(Self {
            key: key.to_string(),
            value,
        })
    }
}

/// Format a data line for `key` without building a [`SettingLine`]
pub fn format_line(key: &str, value: &SettingValue) -> String {
    format!(
        "{key}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}\n",
        value.value_type().code(),
        value.to_text()
    )
}

fn non_empty<'a>(field: Option<&'a str>, name: &'static str) -> Result<&'a str> {
    field
        .filter(|f| !f.is_empty())
        .ok_or(FormatError::MissingField(name))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_format_each_type() {
        assert_eq!(
            format_line("net.timeout", &SettingValue::Integer(30)),
            "net.timeout\t0\t30\n"
        );
        assert_eq!(
            format_line("ctl.gain", &SettingValue::Real(0.25)),
            "ctl.gain\t1\t0.25\n"
        );
        assert_eq!(
            format_line("wifi.ssid", &SettingValue::from("home")),
            "wifi.ssid\t2\thome\n"
        );
    }

    #[test]
    fn test_parse_each_type() {
        let line = SettingLine::parse(b"ctl.gain\t1\t0.25\n").expect("real line");
        assert_eq!(line.key, "ctl.gain");
        assert_eq!(line.value, SettingValue::Real(0.25));

        let line = SettingLine::parse(b"wifi.ssid\t2\thome\n").expect("string line");
        assert_eq!(line.value, SettingValue::from("home"));
    }

    #[test]
    fn test_parse_without_terminator() {
        let line = SettingLine::parse(b"a\t0\t1").expect("unterminated line");
        assert_eq!(line.value, SettingValue::Integer(1));
    }

    #[test]
    fn test_string_value_keeps_tabs() {
        let line = SettingLine::parse(b"motd\t2\thello\tworld\n").expect("tabbed string");
        assert_eq!(line.value.as_str(), Some("hello\tworld"));
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            SettingLine::parse(b"\t0\t1\n"),
            Err(FormatError::MissingField("key"))
        );
        assert_eq!(
            SettingLine::parse(b"key\n"),
            Err(FormatError::MissingField("type code"))
        );
        assert_eq!(
            SettingLine::parse(b"key\t\t1\n"),
            Err(FormatError::MissingField("type code"))
        );
        assert_eq!(
            SettingLine::parse(b"key\t2\t\n"),
            Err(FormatError::MissingField("value"))
        );
        assert_eq!(
            SettingLine::parse(b"key\t0\n"),
            Err(FormatError::MissingField("value"))
        );
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(
            SettingLine::parse(b"k\xff\t0\t1\n"),
            Err(FormatError::InvalidUtf8)
        );
    }

    #[test]
    fn test_type_mismatch_in_text() {
        assert!(matches!(
            SettingLine::parse(b"key\t0\t1.5\n"),
            Err(FormatError::InvalidInteger(_))
        ));
        assert!(matches!(
            SettingLine::parse(b"key\t9\t1\n"),
            Err(FormatError::InvalidTypeCode(_))
        ));
    }
}
