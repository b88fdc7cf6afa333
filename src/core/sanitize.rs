//! core::sanitize
//!
//! Filters a session namespace down to the variables that can be embedded
//! into generated script text.
//!
//! # Rules
//!
//! Applied per entry, in namespace order:
//!
//! 1. A name present in [`SanitizeOptions::bindings`] takes the binding's
//!    value and bypasses rules 3-5.
//! 2. The value must convert to JSON (and fit `max_value_bytes`, if set).
//! 3. Blacklisted names are dropped.
//! 4. Reserved session-history names ([`RESERVED_NAMES`]) are dropped.
//! 5. Private names (leading `_`) are dropped unless `allow_private` is set.
//!
//! Bindings that do not occur in the namespace are appended afterwards,
//! subject only to rule 2.
//!
//! Nothing here fails: a bad entry is recorded in
//! [`SanitizeOutcome::skipped`] and the pass moves on.

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::sync::Arc;

use serde_json::Value;

use super::namespace::{Bindable, Namespace, SanitizedNamespace};

/// Session names holding the full input and output history.
pub const RESERVED_NAMES: &[&str] = &["In", "Out"];

/// Prefix marking a name as private to the session.
pub const PRIVATE_PREFIX: char = '_';

/// Options controlling which entries survive sanitization.
#[derive(Debug, Clone, Default)]
pub struct SanitizeOptions {
    /// Explicit bindings; always win over the exclusion rules.
    pub bindings: Namespace,
    /// Names that are never embedded unless bound explicitly.
    pub blacklist: HashSet<String>,
    /// Keep `_`-prefixed names.
    pub allow_private: bool,
    /// Upper bound on the compact JSON size of a single value.
    pub max_value_bytes: Option<usize>,
}

/// Why an entry was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The value has no JSON form.
    NotSerializable(String),
    /// The JSON form exceeds the configured size limit.
    TooLarge { size: usize, limit: usize },
    Blacklisted,
    Reserved,
    Private,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotSerializable(message) => write!(f, "not serializable: {}", message),
            SkipReason::TooLarge { size, limit } => {
                write!(f, "serialized size {} exceeds limit {}", size, limit)
            }
            SkipReason::Blacklisted => f.write_str("blacklisted"),
            SkipReason::Reserved => f.write_str("reserved session variable"),
            SkipReason::Private => f.write_str("private name"),
        }
    }
}

/// An entry that did not make it into the sanitized namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub name: String,
    pub reason: SkipReason,
}

impl SkippedEntry {
    /// Serialization problems are reported to the user; policy exclusions
    /// are silent.
    pub fn is_warning(&self) -> bool {
        matches!(
            self.reason,
            SkipReason::NotSerializable(_) | SkipReason::TooLarge { .. }
        )
    }
}

/// Result of sanitizing a namespace.
#[derive(Debug, Clone, Default)]
pub struct SanitizeOutcome {
    /// The entries that may be embedded.
    pub namespace: SanitizedNamespace,
    /// Everything that was dropped, in encounter order.
    pub skipped: Vec<SkippedEntry>,
}

impl SanitizeOutcome {
    /// Skipped entries that warrant a warning.
    pub fn warnings(&self) -> impl Iterator<Item = &SkippedEntry> {
        self.skipped.iter().filter(|s| s.is_warning())
    }
}

/// Check whether `name` is excluded by the policy rules (3-5).
fn policy_exclusion(name: &str, options: &SanitizeOptions) -> Option<SkipReason> {
    if options.blacklist.contains(name) {
        return Some(SkipReason::Blacklisted);
    }
    if RESERVED_NAMES.contains(&name) {
        return Some(SkipReason::Reserved);
    }
    if name.starts_with(PRIVATE_PREFIX) && !options.allow_private {
        return Some(SkipReason::Private);
    }
    None
}

/// Byte sink that only counts what is written to it.
#[derive(Debug, Default)]
struct ByteCount(usize);

impl io::Write for ByteCount {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Compact JSON size of `json`, without building the text.
fn compact_size(json: &Value) -> Result<usize, serde_json::Error> {
    let mut count = ByteCount::default();
    serde_json::to_writer(&mut count, json)?;
    Ok(count.0)
}

/// Serialize a single value, enforcing the size limit.
fn serialize_value(value: &dyn Bindable, limit: Option<usize>) -> Result<Value, SkipReason> {
    let json = value
        .to_json()
        .map_err(|e| SkipReason::NotSerializable(e.to_string()))?;

    if let Some(limit) = limit {
        let size = compact_size(&json).map_err(|e| SkipReason::NotSerializable(e.to_string()))?;
        if size > limit {
            return Err(SkipReason::TooLarge { size, limit });
        }
    }

    Ok(json)
}

/// Filter `namespace` according to `options`.
///
/// The input is never modified.
///
/// # Example
///
/// ```
/// use cellscript::core::namespace::Namespace;
/// use cellscript::core::sanitize::{sanitize, SanitizeOptions};
///
/// let ns = Namespace::new().with("_secret", 1).with("visible", 2);
/// let outcome = sanitize(&ns, &SanitizeOptions::default());
///
/// let names: Vec<_> = outcome.namespace.names().collect();
/// assert_eq!(names, vec!["visible"]);
/// ```
pub fn sanitize(namespace: &Namespace, options: &SanitizeOptions) -> SanitizeOutcome {
    let mut outcome = SanitizeOutcome::default();

    for (name, value) in namespace.iter() {
        let binding = options.bindings.get(name);
        let candidate: &Arc<dyn Bindable> = binding.unwrap_or(value);

        let json = match serialize_value(candidate.as_ref(), options.max_value_bytes) {
            Ok(json) => json,
            Err(reason) => {
                outcome.skipped.push(SkippedEntry {
                    name: name.to_string(),
                    reason,
                });
                continue;
            }
        };

        if binding.is_none() {
            if let Some(reason) = policy_exclusion(name, options) {
                outcome.skipped.push(SkippedEntry {
                    name: name.to_string(),
                    reason,
                });
                continue;
            }
        }

        outcome.namespace.insert(name, json);
    }

    for (name, value) in options.bindings.iter() {
        if namespace.contains_key(name) {
            continue;
        }
        match serialize_value(value.as_ref(), options.max_value_bytes) {
            Ok(json) => outcome.namespace.insert(name, json),
            Err(reason) => outcome.skipped.push(SkippedEntry {
                name: name.to_string(),
                reason,
            }),
        }
    }

    outcome
}
