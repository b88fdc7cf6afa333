//! cell / line commands - Build and print an executable script

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde_json::Value;

use super::{build_engine, load_config, read_input};
use crate::cli::args::ScriptArgs;
use crate::cli::Context;
use crate::core::config::Config;
use crate::core::namespace::Namespace;
use crate::core::template::SubstitutionMode;
use crate::core::types::Delimiter;
use crate::engine::{DependencySet, EngineSettings, Invocation};

/// Build a script from a cell body read from `file` or stdin.
pub fn cell(ctx: &Context, file: Option<&Path>, args: &ScriptArgs) -> Result<()> {
    let body = read_input(file)?;
    execute(ctx, Invocation::new("", Some(&body)), None, args)
}

/// Build a script from a single line.
pub fn line(ctx: &Context, script: &str, locals: &[String], args: &ScriptArgs) -> Result<()> {
    let local = if locals.is_empty() {
        None
    } else {
        Some(parse_assignments(locals)?)
    };
    execute(ctx, Invocation::new(script, None), local.as_ref(), args)
}

fn execute(
    ctx: &Context,
    invocation: Invocation<'_>,
    local: Option<&Namespace>,
    args: &ScriptArgs,
) -> Result<()> {
    let config = load_config(ctx)?;
    let settings = settings_for(ctx, &config, args)?;
    let engine = build_engine(ctx, &config, settings)?;

    let session = session_namespace(args)?;
    let required = if args.require.is_empty() {
        None
    } else {
        Some(DependencySet::explicit(args.require.iter().cloned()))
    };

    engine
        .run(&invocation, &session, local, required.as_ref())
        .context("Failed to build script")?;
    Ok(())
}

/// Engine settings from configuration, overridden by flags.
fn settings_for(ctx: &Context, config: &Config, args: &ScriptArgs) -> Result<EngineSettings> {
    let mut settings = EngineSettings::from_config(config, ctx.verbosity());

    if let Some(delimiter) = &args.delimiter {
        settings.build.delimiter = Delimiter::new(delimiter).context("Invalid --delimiter")?;
    }
    if args.strict {
        settings.build.mode = SubstitutionMode::Strict;
    }
    if args.warnings {
        settings.warnings = true;
    }
    if args.allow_private {
        settings.sanitize.allow_private = true;
    }
    settings
        .sanitize
        .blacklist
        .extend(args.blacklist.iter().cloned());

    for (name, value) in parse_pairs(&args.bindings)? {
        settings.sanitize.bindings.insert(name, value);
    }

    Ok(settings)
}

/// The session namespace: the `--ns` file with `--var` entries on top.
fn session_namespace(args: &ScriptArgs) -> Result<Namespace> {
    let base = match &args.namespace_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            let value: Value = serde_json::from_str(&text)
                .with_context(|| format!("'{}' is not valid JSON", path.display()))?;
            match value {
                Value::Object(object) => Namespace::from_json_object(object),
                _ => bail!("'{}' must contain a JSON object", path.display()),
            }
        }
        None => Namespace::new(),
    };

    Ok(base.overlay(&parse_assignments(&args.vars)?))
}

fn parse_assignments(items: &[String]) -> Result<Namespace> {
    Ok(parse_pairs(items)?.into_iter().collect())
}

fn parse_pairs(items: &[String]) -> Result<Vec<(String, Value)>> {
    items.iter().map(|item| parse_assignment(item)).collect()
}

/// Parse `NAME=VALUE`. VALUE is JSON, or a plain string if it is not.
fn parse_assignment(item: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = item.split_once('=') else {
        bail!("Expected NAME=VALUE, got '{}'", item);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Missing variable name in '{}'", item);
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}
