//! engine::invocation
//!
//! The two ways a script reaches the engine, and the `%require` line form.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvocationError {
    #[error("expected '<name> <path>', got '{0}'")]
    MalformedRequire(String),
}

/// A script invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation<'a> {
    /// Single-line form. Sees the caller's local namespace.
    Line { script: &'a str },
    /// Multi-line form. The line text is ignored.
    Cell { script: &'a str },
}

impl<'a> Invocation<'a> {
    /// The cell form when `cell` is present, the line form otherwise.
    pub fn new(line: &'a str, cell: Option<&'a str>) -> Self {
        match cell {
            Some(script) => Invocation::Cell { script },
            None => Invocation::Line { script: line },
        }
    }

    pub fn script(&self) -> &'a str {
        match self {
            Invocation::Line { script } | Invocation::Cell { script } => script,
        }
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, Invocation::Cell { .. })
    }
}

/// Parse `<name> <path>`.
///
/// # Errors
///
/// Anything other than exactly two whitespace-separated tokens.
pub fn parse_require_line(line: &str) -> Result<(&str, &str), InvocationError> {
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(name), Some(path), None) => Ok((name, path)),
        _ => Err(InvocationError::MalformedRequire(line.trim().to_string())),
    }
}
