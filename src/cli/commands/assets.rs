//! asset commands - Attach stylesheets, scripts and styles to the page

use std::path::Path;

use anyhow::Result;

use super::{build_engine, load_config, read_input};
use crate::cli::Context;
use crate::display::{DisplayOutput, DisplaySurface, WriterDisplay};
use crate::engine::{assets, EngineSettings};

fn emit(ctx: &Context, script: String) -> Result<()> {
    WriterDisplay::stdout(ctx.format).display(DisplayOutput::Javascript(script))?;
    Ok(())
}

pub fn link_css(ctx: &Context, href: &str) -> Result<()> {
    emit(ctx, assets::link_css(href))
}

pub fn link_js(ctx: &Context, src: &str) -> Result<()> {
    emit(ctx, assets::link_js(src))
}

pub fn load_style(ctx: &Context, file: Option<&Path>) -> Result<()> {
    let css = read_input(file)?;
    emit(ctx, assets::load_style(&css))
}

pub fn load_script(ctx: &Context, file: Option<&Path>) -> Result<()> {
    let js = read_input(file)?;
    emit(ctx, assets::load_script(&js))
}

/// Print the script enabling highlighting for `%%<magic>` cells.
pub fn highlight(ctx: &Context, magic: &str) -> Result<()> {
    let config = load_config(ctx)?;
    let engine = build_engine(ctx, &config, EngineSettings::from_config(&config, ctx.verbosity()))?;
    engine.activate_syntax_highlight(magic)?;
    Ok(())
}
