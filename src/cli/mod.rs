//! cli
//!
//! Command-line interface layer for cellscript.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and turn flags into engine settings
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Each invocation is a fresh session: the library
//! registry is rebuilt from configuration, scripts are built by the
//! [`crate::engine`] and written to stdout through a
//! [`crate::display::WriterDisplay`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::display::OutputFormat;
use crate::ui::output::Verbosity;

/// Per-invocation settings from the global flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub cwd: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
    pub format: OutputFormat,
}

impl Context {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// The directory project configuration is read from.
    pub fn project_dir(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Failed to determine current directory"),
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        format: cli.format,
    };

    commands::dispatch(cli.command, &ctx)
}
