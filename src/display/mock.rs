//! display::mock
//!
//! Recording display surface for deterministic testing.
//!
//! # Design
//!
//! Stores every output in memory so tests can inspect what would have been
//! sent to the browser, and can be told to fail to exercise error paths.
//!
//! # Example
//!
//! ```
//! use cellscript::display::mock::RecordingDisplay;
//! use cellscript::display::{DisplayOutput, DisplaySurface};
//!
//! let display = RecordingDisplay::new();
//! display
//!     .display(DisplayOutput::Javascript("console.log(1);".into()))
//!     .unwrap();
//!
//! assert_eq!(display.scripts(), vec!["console.log(1);".to_string()]);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{DisplayError, DisplayOutput, DisplaySurface};

/// Recording display for testing.
///
/// Clones share the same recorded outputs.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    inner: Arc<Mutex<RecordingInner>>,
}

#[derive(Debug, Default)]
struct RecordingInner {
    outputs: Vec<DisplayOutput>,
    /// Reason to refuse the next display calls with.
    fail_with: Option<String>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RecordingInner> {
        // A panicking test thread must not hide the recorded outputs
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every following display call fail with `reason`.
    pub fn fail_with(&self, reason: impl Into<String>) {
        self.lock().fail_with = Some(reason.into());
    }

    /// Stop failing.
    pub fn clear_failure(&self) {
        self.lock().fail_with = None;
    }

    /// All recorded outputs, oldest first.
    pub fn outputs(&self) -> Vec<DisplayOutput> {
        self.lock().outputs.clone()
    }

    /// Payloads of recorded JavaScript outputs.
    pub fn scripts(&self) -> Vec<String> {
        self.lock()
            .outputs
            .iter()
            .map(|o| match o {
                DisplayOutput::Javascript(script) => script.clone(),
            })
            .collect()
    }

    /// The most recent script, if any.
    pub fn last_script(&self) -> Option<String> {
        self.scripts().pop()
    }
}

impl DisplaySurface for RecordingDisplay {
    fn display(&self, output: DisplayOutput) -> Result<(), DisplayError> {
        let mut inner = self.lock();
        if let Some(reason) = &inner.fail_with {
            return Err(DisplayError::Unavailable(reason.clone()));
        }
        inner.outputs.push(output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_outputs() {
        let display = RecordingDisplay::new();
        let other = display.clone();

        other
            .display(DisplayOutput::Javascript("a".into()))
            .unwrap();

        assert_eq!(display.scripts(), vec!["a".to_string()]);
        assert_eq!(display.last_script(), Some("a".to_string()));
    }

    #[test]
    fn configured_failure() {
        let display = RecordingDisplay::new();
        display.fail_with("kernel busy");

        let result = display.display(DisplayOutput::Javascript("a".into()));
        assert!(matches!(result, Err(DisplayError::Unavailable(ref r)) if r == "kernel busy"));
        assert!(display.outputs().is_empty());

        display.clear_failure();
        assert!(display.display(DisplayOutput::Javascript("b".into())).is_ok());
        assert_eq!(display.outputs().len(), 1);
    }
}
