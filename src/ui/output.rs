//! ui::output
//!
//! Diagnostics for the command line.
//!
//! # Design
//!
//! Generated scripts are the only thing written to stdout by the script
//! commands, so everything else here goes to stderr unless it is the
//! requested result (listings, config values).

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    #[default]
    Normal,
    /// Also trace the build pipeline
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags. Quiet wins over debug.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a result line on stdout (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a status message on stderr (respects quiet mode).
///
/// Used by commands whose stdout carries a generated script.
pub fn status(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("{}", message);
    }
}

/// Format `(name, value)` pairs as aligned columns.
pub fn format_table<K: Display, V: Display>(rows: &[(K, V)]) -> String {
    let cells: Vec<(String, String)> = rows
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let width = cells.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);

    cells
        .iter()
        .map(|(k, v)| format!("{:width$}  {}", k, v, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn table_aligns_first_column() {
        let rows = [("d3", "https://d3js.org/d3.v5.min"), ("d3-hierarchy", "x")];
        assert_eq!(
            format_table(&rows),
            "d3            https://d3js.org/d3.v5.min\nd3-hierarchy  x"
        );
    }

    #[test]
    fn empty_table() {
        let rows: [(&str, &str); 0] = [];
        assert_eq!(format_table(&rows), "");
    }
}
