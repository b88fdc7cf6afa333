//! require / libraries commands - Link libraries and inspect the registry

use anyhow::{Context as _, Result};
use indexmap::IndexMap;

use super::{build_engine, load_config};
use crate::cli::Context;
use crate::core::config::Config;
use crate::engine::EngineSettings;
use crate::ui::output;

/// Link `name` to `path` and print the loader configuration.
///
/// With `save`, the library is also recorded in the project config.
pub fn require(ctx: &Context, name: &str, path: &str, save: bool) -> Result<()> {
    let config = load_config(ctx)?;
    let engine = build_engine(ctx, &config, EngineSettings::from_config(&config, ctx.verbosity()))?;

    let snapshot = engine
        .register_libraries([(name, path)])
        .with_context(|| format!("Failed to link '{}'", name))?;

    if save {
        let dir = ctx.project_dir()?;
        let mut project = config.project.clone().unwrap_or_default();
        // Store the normalized location
        let location = snapshot.location(name).unwrap_or(path).to_string();
        project
            .libraries
            .get_or_insert_with(IndexMap::new)
            .insert(name.to_string(), location);

        let written = Config::write_project(&dir, &project).context("Failed to write config")?;
        output::status(
            format!("Saved '{}' to {}", name, written.display()),
            ctx.verbosity(),
        );
    }

    Ok(())
}

/// List linked libraries, or print their loader configuration.
pub fn libraries(ctx: &Context, script: bool) -> Result<()> {
    let config = load_config(ctx)?;
    let engine = build_engine(ctx, &config, EngineSettings::from_config(&config, ctx.verbosity()))?;

    if script {
        engine.publish_registry()?;
        return Ok(());
    }

    let snapshot = engine.registry().snapshot();
    let rows: Vec<(&str, &str)> = snapshot.iter().map(|(n, l)| (n.as_str(), l)).collect();
    if !rows.is_empty() {
        println!("{}", output::format_table(&rows));
    }
    Ok(())
}
