//! core
//!
//! Core domain types and the pure parts of the pipeline.
//!
//! # Modules
//!
//! - [`types`] - Strong types: LibraryName, Delimiter
//! - [`namespace`] - Session namespaces and their sanitized form
//! - [`sanitize`] - Namespace filtering rules
//! - [`template`] - Placeholder scanning and substitution
//! - [`registry`] - The shared library registry
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid delimiters and library names
//! - Sanitization and substitution are pure and never touch shared state
//! - Output is deterministic for the same inputs and registration order

pub mod config;
pub mod namespace;
pub mod registry;
pub mod sanitize;
pub mod template;
pub mod types;
