//! config command - Get, set, or list configuration values

use anyhow::{bail, Context as _, Result};
use indexmap::IndexMap;

use super::load_config;
use crate::cli::Context;
use crate::core::config::{Config, GlobalConfig, ProjectConfig, SanitizeDefaults};
use crate::core::template::SubstitutionMode;
use crate::ui::output;

const GLOBAL_ONLY: &[&str] = &["warnings", "delimiter", "safe_substitute"];

/// Effective value of `key`, or `None` if it is unset.
fn effective_value(config: &Config, key: &str) -> Result<Option<String>> {
    let value = match key {
        "warnings" => Some(config.warnings().to_string()),
        "delimiter" => Some(config.delimiter().to_string()),
        "safe_substitute" => {
            Some((config.substitution_mode() == SubstitutionMode::Safe).to_string())
        }
        "sanitize.allow_private" => Some(config.allow_private().to_string()),
        "sanitize.blacklist" => Some(config.blacklist().join(",")),
        "sanitize.max_value_bytes" => config.max_value_bytes().map(|n| n.to_string()),
        "require" => config.default_requirements().map(|r| r.join(",")),
        _ => match key.strip_prefix("libraries.") {
            Some(name) => config
                .libraries()
                .into_iter()
                .find(|(n, _)| n == name)
                .map(|(_, location)| location),
            None => bail!("Unknown configuration key: {}", key),
        },
    };
    Ok(value)
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let config = load_config(ctx)?;

    if let Some(value) = effective_value(&config, key)? {
        println!("{}", value);
    }
    Ok(())
}

/// Set a configuration value.
pub fn set(ctx: &Context, key: &str, value: &str, project: bool) -> Result<()> {
    let config = load_config(ctx)?;

    let path = if project {
        let mut updated = config.project.clone().unwrap_or_default();
        apply_project(&mut updated, key, value)?;
        let dir = ctx.project_dir()?;
        Config::write_project(&dir, &updated).context("Failed to write config")?
    } else {
        let mut updated = config.global.clone();
        apply_global(&mut updated, key, value)?;
        let path = config.global_write_path()?;
        Config::write_global(&path, &updated).context("Failed to write config")?;
        path
    };

    output::print(
        format!("Set {} = {} in {}", key, value, path.display()),
        ctx.verbosity(),
    );
    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;

    println!("# Effective Configuration");
    for key in [
        "warnings",
        "delimiter",
        "safe_substitute",
        "sanitize.allow_private",
        "sanitize.blacklist",
        "sanitize.max_value_bytes",
        "require",
    ] {
        let value = effective_value(&config, key)?;
        println!("{} = {}", key, value.as_deref().unwrap_or("(not set)"));
    }

    println!();
    println!("# Libraries");
    for (name, location) in config.libraries() {
        println!("libraries.{} = {}", name, location);
    }

    Ok(())
}

/// Show where configuration is read from and written to.
pub fn path(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;

    let global = match config.global_config_loaded_from() {
        Some(path) => format!("{} (loaded)", path.display()),
        None => format!("{} (not found)", config.global_write_path()?.display()),
    };
    let project = match config.project_config_loaded_from() {
        Some(path) => format!("{} (loaded)", path.display()),
        None => format!(
            "{} (not found)",
            Config::project_config_path(&ctx.project_dir()?).display()
        ),
    };

    println!("global: {}", global);
    println!("project: {}", project);
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .with_context(|| format!("{} expects true or false, got '{}'", key, value))
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn apply_global(config: &mut GlobalConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "warnings" => config.warnings = Some(parse_bool(key, value)?),
        "delimiter" => config.delimiter = Some(value.to_string()),
        "safe_substitute" => config.safe_substitute = Some(parse_bool(key, value)?),
        "require" => bail!("'require' can only be set in the project config (use --project)"),
        _ => {
            if let Some(field) = key.strip_prefix("sanitize.") {
                apply_sanitize(config.sanitize.get_or_insert_with(Default::default), field, value)?;
            } else if let Some(name) = key.strip_prefix("libraries.") {
                config
                    .libraries
                    .get_or_insert_with(IndexMap::new)
                    .insert(name.to_string(), value.to_string());
            } else {
                bail!("Unknown configuration key: {}", key);
            }
        }
    }
    Ok(())
}

fn apply_project(config: &mut ProjectConfig, key: &str, value: &str) -> Result<()> {
    if GLOBAL_ONLY.contains(&key) {
        bail!("'{}' can only be set in the global config", key);
    }

    if key == "require" {
        config.require = Some(parse_list(value));
    } else if let Some(field) = key.strip_prefix("sanitize.") {
        apply_sanitize(config.sanitize.get_or_insert_with(Default::default), field, value)?;
    } else if let Some(name) = key.strip_prefix("libraries.") {
        config
            .libraries
            .get_or_insert_with(IndexMap::new)
            .insert(name.to_string(), value.to_string());
    } else {
        bail!("Unknown configuration key: {}", key);
    }
    Ok(())
}

fn apply_sanitize(sanitize: &mut SanitizeDefaults, field: &str, value: &str) -> Result<()> {
    match field {
        "allow_private" => sanitize.allow_private = Some(parse_bool("sanitize.allow_private", value)?),
        "blacklist" => sanitize.blacklist = Some(parse_list(value)),
        "max_value_bytes" => {
            let limit = value
                .parse()
                .with_context(|| format!("sanitize.max_value_bytes expects a number, got '{}'", value))?;
            sanitize.max_value_bytes = Some(limit);
        }
        _ => bail!("Unknown configuration key: sanitize.{}", field),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_keys_apply() {
        let mut config = GlobalConfig::default();
        apply_global(&mut config, "warnings", "true").unwrap();
        apply_global(&mut config, "delimiter", "%%").unwrap();
        apply_global(&mut config, "sanitize.blacklist", "a, b,,c").unwrap();
        apply_global(&mut config, "libraries.c3", "/static/c3").unwrap();

        assert_eq!(config.warnings, Some(true));
        assert_eq!(config.delimiter.as_deref(), Some("%%"));
        assert_eq!(
            config.sanitize.unwrap().blacklist,
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(config.libraries.unwrap()["c3"], "/static/c3");
    }

    #[test]
    fn project_rejects_global_only_keys() {
        let mut config = ProjectConfig::default();
        assert!(apply_project(&mut config, "delimiter", "%%").is_err());

        apply_project(&mut config, "require", "d3,d3-hierarchy").unwrap();
        assert_eq!(
            config.require,
            Some(vec!["d3".to_string(), "d3-hierarchy".to_string()])
        );
    }

    #[test]
    fn bad_values_rejected() {
        let mut config = GlobalConfig::default();
        assert!(apply_global(&mut config, "warnings", "yes").is_err());
        assert!(apply_global(&mut config, "sanitize.max_value_bytes", "big").is_err());
        assert!(apply_global(&mut config, "nope", "1").is_err());
    }

    #[test]
    fn effective_defaults() {
        let config = Config::default();
        assert_eq!(effective_value(&config, "delimiter").unwrap().as_deref(), Some("$$"));
        assert_eq!(effective_value(&config, "safe_substitute").unwrap().as_deref(), Some("true"));
        assert_eq!(
            effective_value(&config, "libraries.d3").unwrap().as_deref(),
            Some("https://d3js.org/d3.v5.min")
        );
        assert_eq!(effective_value(&config, "require").unwrap(), None);
        assert!(effective_value(&config, "bogus").is_err());
    }
}
