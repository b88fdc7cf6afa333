//! display
//!
//! Abstraction over the notebook's output surface.
//!
//! # Architecture
//!
//! The [`DisplaySurface`] trait is the only way generated scripts leave the
//! crate. Implementations:
//!
//! - [`writer::WriterDisplay`] - writes raw scripts or MIME bundles to any
//!   `io::Write` (the CLI uses stdout)
//! - [`mock::RecordingDisplay`] - records outputs in memory for tests

pub mod mock;
pub mod traits;
pub mod writer;

pub use traits::{DisplayError, DisplayOutput, DisplaySurface, JAVASCRIPT_MIME};
pub use writer::{OutputFormat, WriterDisplay};
