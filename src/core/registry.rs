//! core::registry
//!
//! The library registry: which RequireJS modules are linked, and where from.
//!
//! # Concurrency
//!
//! The registry is shared by every command in a session. Updates build a
//! complete new [`RegistrySnapshot`] and publish it with a compare-and-swap,
//! so readers always hold either the previous or the next snapshot. Every
//! entry of an update is validated before anything is published.
//!
//! # Example
//!
//! ```
//! use cellscript::core::registry::LibraryRegistry;
//!
//! let registry = LibraryRegistry::new();
//! registry
//!     .merge([("d3", "https://d3js.org/d3.v5.min")])
//!     .unwrap();
//!
//! let snapshot = registry.snapshot();
//! assert_eq!(snapshot.location("d3"), Some("https://d3js.org/d3.v5.min"));
//! ```

use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use indexmap::IndexMap;
use thiserror::Error;

use super::types::{LibraryName, TypeError};

/// Errors from registry updates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error("library '{0}' has an empty location")]
    EmptyLocation(String),
}

/// An immutable view of the registry at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    libraries: IndexMap<LibraryName, String>,
}

impl RegistrySnapshot {
    /// Location registered for `name`.
    pub fn location(&self, name: &str) -> Option<&str> {
        self.libraries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }

    /// Library names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &LibraryName> {
        self.libraries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LibraryName, &str)> {
        self.libraries.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// The `require.config` script linking every registered library.
    pub fn require_config_script(&self) -> String {
        let paths = self
            .libraries
            .iter()
            .map(|(name, location)| {
                format!(
                    "        {}: {}",
                    js_string(name.as_str()),
                    js_string(location)
                )
            })
            .collect::<Vec<_>>()
            .join(",\n");

        if paths.is_empty() {
            return "require.config({\n    paths: {}\n});\n".to_string();
        }

        format!("require.config({{\n    paths: {{\n{}\n    }}\n}});\n", paths)
    }
}

/// JSON-encode a string for use as a JavaScript literal.
fn js_string(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

/// Validate one `(name, location)` pair.
fn validate_entry(name: &str, location: &str) -> Result<(LibraryName, String), RegistryError> {
    let name = LibraryName::new(name)?;
    let location = location.trim();
    // RequireJS appends the extension itself
    let location = location.strip_suffix(".js").unwrap_or(location);
    if location.is_empty() {
        return Err(RegistryError::EmptyLocation(name.to_string()));
    }
    Ok((name, location.to_string()))
}

fn validate_all<I, N, L>(entries: I) -> Result<Vec<(LibraryName, String)>, RegistryError>
where
    I: IntoIterator<Item = (N, L)>,
    N: AsRef<str>,
    L: AsRef<str>,
{
    entries
        .into_iter()
        .map(|(name, location)| validate_entry(name.as_ref(), location.as_ref()))
        .collect()
}

/// Shared, atomically updated library registry.
#[derive(Debug, Default)]
pub struct LibraryRegistry {
    current: ArcSwap<RegistrySnapshot>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with `entries`.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry.
    pub fn with_libraries<I, N, L>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (N, L)>,
        N: AsRef<str>,
        L: AsRef<str>,
    {
        let registry = Self::new();
        registry.replace(entries)?;
        Ok(registry)
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.load_full()
    }

    /// Merge `entries` into the registry.
    ///
    /// Existing names keep their position and take the new location; new
    /// names are appended in the given order. Returns the published snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry; the registry is left unchanged.
    pub fn merge<I, N, L>(&self, entries: I) -> Result<Arc<RegistrySnapshot>, RegistryError>
    where
        I: IntoIterator<Item = (N, L)>,
        N: AsRef<str>,
        L: AsRef<str>,
    {
        let updates = validate_all(entries)?;
        Ok(self.update(|snapshot| {
            for (name, location) in &updates {
                snapshot
                    .libraries
                    .insert(name.clone(), location.clone());
            }
        }))
    }

    /// Replace the whole registry with `entries`.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry; the registry is left unchanged.
    pub fn replace<I, N, L>(&self, entries: I) -> Result<Arc<RegistrySnapshot>, RegistryError>
    where
        I: IntoIterator<Item = (N, L)>,
        N: AsRef<str>,
        L: AsRef<str>,
    {
        let libraries = validate_all(entries)?.into_iter().collect();
        let next = Arc::new(RegistrySnapshot { libraries });
        self.current.store(Arc::clone(&next));
        Ok(next)
    }

    /// Register a single library.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or location is invalid.
    pub fn register(
        &self,
        name: &str,
        location: &str,
    ) -> Result<Arc<RegistrySnapshot>, RegistryError> {
        self.merge([(name, location)])
    }

    /// Apply `change` to a copy of the current snapshot and publish it,
    /// retrying if another update won the race.
    fn update<F>(&self, change: F) -> Arc<RegistrySnapshot>
    where
        F: Fn(&mut RegistrySnapshot),
    {
        let mut current = self.current.load_full();
        loop {
            let mut next = (*current).clone();
            change(&mut next);
            let next = Arc::new(next);

            let previous = self.current.compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&*previous, &current) {
                return next;
            }
            current = Guard::into_inner(previous);
        }
    }
}
