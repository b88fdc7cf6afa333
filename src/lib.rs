//! cellscript - Dependency-gated JavaScript execution for notebook cells
//!
//! cellscript turns a cell's JavaScript plus the host session's variables
//! into a single script for the browser: variables are embedded as JSON at
//! `$$name` placeholders, and the script only runs once the RequireJS
//! modules it needs are loaded. Failures are rendered into the cell output.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Sanitize, build and display pipeline
//! - [`core`] - Namespaces, sanitizer, template, library registry, config
//! - [`display`] - Output surface abstraction
//! - [`ui`] - Diagnostics
//!
//! # Guarantees
//!
//! 1. Only JSON-serializable values are ever embedded in a script
//! 2. Blacklisted, reserved and private names are never embedded unless bound explicitly
//! 3. A script whose requirements are not loaded never runs its body
//! 4. Script failures are shown in the cell, not only in the console

pub mod cli;
pub mod core;
pub mod display;
pub mod engine;
pub mod ui;
