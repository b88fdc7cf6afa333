//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`LibraryName`] - Validated RequireJS module name used as a registry key
//! - [`Delimiter`] - Two-marker placeholder delimiter for script templates
//!
//! # Validation
//!
//! These types enforce validity at construction time. A malformed delimiter
//! or library name is a configuration problem and is reported immediately
//! rather than surfacing later as a broken script.
//!
//! # Examples
//!
//! ```
//! use cellscript::core::types::{Delimiter, LibraryName};
//!
//! let name = LibraryName::new("d3-hierarchy").unwrap();
//! assert_eq!(name.as_str(), "d3-hierarchy");
//!
//! let delimiter = Delimiter::new("$$").unwrap();
//! assert_eq!(delimiter.marker(), '$');
//!
//! assert!(LibraryName::new("has space").is_err());
//! assert!(Delimiter::new("$").is_err());
//! ```

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid library name: {0}")]
    InvalidLibraryName(String),

    #[error("invalid delimiter: {0}")]
    InvalidDelimiter(String),
}

/// A validated library name.
///
/// Library names are the keys RequireJS resolves through `require.config`:
/// - Cannot be empty
/// - Cannot contain whitespace or ASCII control characters
/// - Cannot contain quotes or `\`
///
/// Names may contain `-`, `.` and `/` (e.g. `notebook/js/codecell`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LibraryName(String);

impl LibraryName {
    /// Create a new validated library name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidLibraryName` if the name is empty or
    /// contains characters RequireJS paths cannot carry.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidLibraryName(
                "library name cannot be empty".into(),
            ));
        }

        for c in name.chars() {
            if c.is_whitespace() {
                return Err(TypeError::InvalidLibraryName(format!(
                    "library name '{name}' cannot contain whitespace"
                )));
            }
            if c.is_control() {
                return Err(TypeError::InvalidLibraryName(format!(
                    "library name '{name}' cannot contain control characters"
                )));
            }
            if matches!(c, '\'' | '"' | '`' | '\\') {
                return Err(TypeError::InvalidLibraryName(format!(
                    "library name '{name}' cannot contain '{c}'"
                )));
            }
        }

        Ok(())
    }

    /// Get the library name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LibraryName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LibraryName> for String {
    fn from(name: LibraryName) -> Self {
        name.0
    }
}

impl Borrow<str> for LibraryName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for LibraryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LibraryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Placeholder delimiter for script templates.
///
/// A delimiter is exactly two copies of the same ASCII punctuation marker.
/// Doubling the marker keeps placeholders apart from the single-marker syntax
/// of the target language: with the default `$$`, `$$data` is a placeholder
/// while JavaScript's `${x}` and jQuery's `$(...)` pass through untouched.
///
/// Rejected markers: letters, digits, whitespace, `_` (identifier
/// characters), `{` and `}` (braced placeholders), quotes and `\`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Delimiter {
    marker: char,
}

impl Delimiter {
    /// The default delimiter, `$$`.
    pub const DEFAULT: Delimiter = Delimiter { marker: '$' };

    /// Parse a delimiter from its textual form (e.g. `"$$"`).
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidDelimiter` unless the text is two identical
    /// permitted markers.
    pub fn new(text: &str) -> Result<Self, TypeError> {
        let mut chars = text.chars();
        let (first, second) = match (chars.next(), chars.next(), chars.next()) {
            (Some(a), Some(b), None) => (a, b),
            _ => {
                return Err(TypeError::InvalidDelimiter(format!(
                    "'{text}' must be exactly two marker characters"
                )))
            }
        };

        if first != second {
            return Err(TypeError::InvalidDelimiter(format!(
                "'{text}' must repeat the same marker twice"
            )));
        }

        Self::from_marker(first)
    }

    /// Build a delimiter from a single marker character.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidDelimiter` for markers that would collide
    /// with identifiers, braces or string quoting.
    pub fn from_marker(marker: char) -> Result<Self, TypeError> {
        if !marker.is_ascii_punctuation() {
            return Err(TypeError::InvalidDelimiter(format!(
                "marker '{}' must be ASCII punctuation",
                marker.escape_default()
            )));
        }
        if matches!(marker, '_' | '{' | '}' | '\'' | '"' | '`' | '\\') {
            return Err(TypeError::InvalidDelimiter(format!(
                "marker '{marker}' is reserved"
            )));
        }
        Ok(Self { marker })
    }

    /// The single marker character.
    pub fn marker(&self) -> char {
        self.marker
    }

    /// The two-marker delimiter text.
    pub fn as_string(&self) -> String {
        let mut text = String::with_capacity(2);
        text.push(self.marker);
        text.push(self.marker);
        text
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<String> for Delimiter {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Delimiter> for String {
    fn from(delimiter: Delimiter) -> Self {
        delimiter.as_string()
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{0}{0}", self.marker)
    }
}

/// Length in bytes of the ASCII identifier at the start of `text`.
///
/// Identifiers follow `[A-Za-z_][A-Za-z0-9_]*`. Returns `None` if `text`
/// does not start with one.
pub(crate) fn identifier_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
        _ => return None,
    }
    let len = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
        .count();
    Some(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod library_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(LibraryName::new("d3").is_ok());
            assert!(LibraryName::new("d3-hierarchy").is_ok());
            assert!(LibraryName::new("notebook/js/codecell").is_ok());
            assert!(LibraryName::new("lodash.min").is_ok());
        }

        #[test]
        fn empty_rejected() {
            assert!(LibraryName::new("").is_err());
        }

        #[test]
        fn whitespace_rejected() {
            assert!(LibraryName::new("d3 v5").is_err());
            assert!(LibraryName::new("d3\t").is_err());
        }

        #[test]
        fn quotes_rejected() {
            assert!(LibraryName::new("d3'").is_err());
            assert!(LibraryName::new("\"d3\"").is_err());
            assert!(LibraryName::new("a\\b").is_err());
        }

        #[test]
        fn serde_roundtrip() {
            let name = LibraryName::new("d3-hierarchy").unwrap();
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, "\"d3-hierarchy\"");
            let parsed: LibraryName = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, name);
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<LibraryName, _> = serde_json::from_str("\"a b\"");
            assert!(result.is_err());
        }
    }

    mod delimiter {
        use super::*;

        #[test]
        fn default_is_double_dollar() {
            assert_eq!(Delimiter::default().to_string(), "$$");
            assert_eq!(Delimiter::default().as_string(), "$$");
        }

        #[test]
        fn accepts_repeated_punctuation() {
            assert_eq!(Delimiter::new("%%").unwrap().marker(), '%');
            assert_eq!(Delimiter::new("@@").unwrap().marker(), '@');
        }

        #[test]
        fn rejects_wrong_length() {
            assert!(Delimiter::new("").is_err());
            assert!(Delimiter::new("$").is_err());
            assert!(Delimiter::new("$$$").is_err());
        }

        #[test]
        fn rejects_mixed_markers() {
            assert!(Delimiter::new("$%").is_err());
        }

        #[test]
        fn rejects_reserved_markers() {
            assert!(Delimiter::new("__").is_err());
            assert!(Delimiter::new("{{").is_err());
            assert!(Delimiter::new("aa").is_err());
            assert!(Delimiter::new("11").is_err());
            assert!(Delimiter::new("  ").is_err());
            assert!(Delimiter::new("\"\"").is_err());
        }
    }

    #[test]
    fn identifier_len_scans_ascii_identifiers() {
        assert_eq!(identifier_len("abc def"), Some(3));
        assert_eq!(identifier_len("_x1)"), Some(3));
        assert_eq!(identifier_len("raw_data;"), Some(8));
        assert_eq!(identifier_len("1abc"), None);
        assert_eq!(identifier_len("{x}"), None);
        assert_eq!(identifier_len(""), None);
    }
}
