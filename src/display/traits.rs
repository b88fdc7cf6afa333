//! display::traits
//!
//! The display surface: where generated scripts are handed off for execution.
//!
//! # Design
//!
//! Displaying is fire-and-forget. A surface accepts a script and schedules
//! it in the browser; nothing is reported back about how the script ran.
//! Errors here only cover failing to hand the script over.

use serde_json::json;
use thiserror::Error;

/// MIME type of executable JavaScript output.
pub const JAVASCRIPT_MIME: &str = "application/javascript";

/// Errors from display operations.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Writing the output failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the output failed.
    #[error("failed to encode output: {0}")]
    Encode(String),

    /// The surface cannot accept output right now.
    #[error("display unavailable: {0}")]
    Unavailable(String),
}

/// Output handed to a display surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOutput {
    /// A script to execute in the browser.
    Javascript(String),
}

impl DisplayOutput {
    pub fn mime_type(&self) -> &'static str {
        match self {
            DisplayOutput::Javascript(_) => JAVASCRIPT_MIME,
        }
    }

    /// The raw payload.
    pub fn content(&self) -> &str {
        match self {
            DisplayOutput::Javascript(script) => script,
        }
    }

    /// The output as a Jupyter `display_data` content object.
    pub fn to_mime_bundle(&self) -> serde_json::Value {
        json!({
            "data": { self.mime_type(): self.content() },
            "metadata": {},
        })
    }
}

/// A surface that executes scripts.
pub trait DisplaySurface: Send + Sync {
    /// Hand `output` over for execution.
    fn display(&self, output: DisplayOutput) -> Result<(), DisplayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn javascript_mime_bundle() {
        let output = DisplayOutput::Javascript("console.log(1);".to_string());

        assert_eq!(output.mime_type(), "application/javascript");
        assert_eq!(
            output.to_mime_bundle(),
            json!({
                "data": {"application/javascript": "console.log(1);"},
                "metadata": {}
            })
        );
    }
}
