//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration for the working directory
//! 2. Builds an [`Engine`] whose display writes to stdout
//! 3. Hands the script to the engine, or prints the requested listing
//!
//! Diagnostics go to stderr so stdout can be piped straight into a notebook
//! frontend.

mod assets;
mod completion;
mod config_cmd;
mod require;
mod run;

// Re-export command functions for testing and direct invocation
pub use assets::{highlight, link_css, link_js, load_script, load_style};
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, path as config_path, set as config_set};
pub use require::{libraries, require};
pub use run::{cell, line};

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::cli::args::{Command, ConfigAction};
use crate::cli::Context;
use crate::core::config::Config;
use crate::core::registry::LibraryRegistry;
use crate::display::WriterDisplay;
use crate::engine::{Engine, EngineSettings};
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Cell { file, args } => run::cell(ctx, file.as_deref(), &args),
        Command::Line {
            script,
            locals,
            args,
        } => run::line(ctx, &script, &locals, &args),

        Command::Require { name, path, save } => require::require(ctx, &name, &path, save),
        Command::Libraries { script } => require::libraries(ctx, script),

        Command::LinkCss { href } => assets::link_css(ctx, &href),
        Command::LinkJs { src } => assets::link_js(ctx, &src),
        Command::LoadStyle { file } => assets::load_style(ctx, file.as_deref()),
        Command::LoadScript { file } => assets::load_script(ctx, file.as_deref()),
        Command::Highlight { magic } => assets::highlight(ctx, &magic),

        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set {
                key,
                value,
                project,
            } => config_cmd::set(ctx, &key, &value, project),
            ConfigAction::List => config_cmd::list(ctx),
            ConfigAction::Path => config_cmd::path(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load configuration for the working directory, reporting load warnings.
pub(crate) fn load_config(ctx: &Context) -> Result<Config> {
    let dir = ctx.project_dir()?;
    let result = Config::load(Some(&dir)).context("Failed to load config")?;

    for warning in &result.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            ctx.verbosity(),
        );
    }

    Ok(result.config)
}

/// Build an engine over the configured libraries, displaying to stdout.
pub(crate) fn build_engine(ctx: &Context, config: &Config, settings: EngineSettings) -> Result<Engine> {
    let registry =
        LibraryRegistry::with_libraries(config.libraries()).context("Invalid library configuration")?;

    output::debug(
        format!("linked libraries: {}", registry.snapshot().len()),
        ctx.verbosity(),
    );

    Ok(Engine::new(
        Arc::new(registry),
        Box::new(WriterDisplay::stdout(ctx.format)),
        settings,
    ))
}

/// Read `file`, or stdin when absent.
pub(crate) fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}
