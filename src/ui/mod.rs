//! ui
//!
//! User-facing diagnostics.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware messages and listings

pub mod output;
