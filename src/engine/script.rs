//! engine::script
//!
//! Builds the executable script: dependency gate, error boundary and the
//! substituted cell body.
//!
//! # Generated Layout
//!
//! ```text
//! (function () {
//!     const cellscriptRequirements = [<names>];
//!     const cellscriptRenderError = function (err) { ... };
//!     try {
//!         <log + require.defined() check per requirement>
//!         require(cellscriptRequirements, function (<identifiers>) {
//!             try {
//! <body, verbatim>
//!             } catch (err) { render; rethrow }
//!         }, function (err) { render; rethrow });
//!     } catch (err) { render; rethrow }
//! })();
//! ```
//!
//! The body runs inside the RequireJS callback, after the synchronous `try`
//! has already returned, so it carries its own boundary. Every failure is
//! appended to the cell's `element` as a `div.js-error` and then re-thrown so
//! the browser console sees it too.

use std::collections::HashSet;

use crate::core::namespace::SanitizedNamespace;
use crate::core::registry::RegistrySnapshot;
use crate::core::template::{ScriptTemplate, SubstitutionMode, TemplateError};
use crate::core::types::Delimiter;

/// `name` of the error thrown when a requirement is not loaded.
pub const UNSATISFIED_REQUIREMENT: &str = "UnsatisfiedRequirement";

/// Names the generated script defines around the body.
const INTERNAL_NAMES: &[&str] = &["cellscriptRequirements", "cellscriptRenderError"];

/// JavaScript reserved words and strict-mode restricted names.
const JS_RESERVED: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
    "default", "delete", "do", "else", "enum", "eval", "export", "extends", "false", "finally",
    "for", "function", "if", "implements", "import", "in", "instanceof", "interface", "let",
    "new", "null", "package", "private", "protected", "public", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// The libraries a script requires.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DependencySet {
    /// Every registered library, in registration order.
    #[default]
    All,
    /// Exactly these names, in this order.
    Explicit(Vec<String>),
}

impl DependencySet {
    pub fn explicit<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DependencySet::Explicit(names.into_iter().map(Into::into).collect())
    }

    /// Resolve to a concrete list of names against `registry`.
    ///
    /// Explicit names are not checked against the registry; a name that is
    /// not linked fails the browser-side check instead. Duplicates are
    /// dropped, keeping the first occurrence.
    pub fn resolve(&self, registry: &RegistrySnapshot) -> Vec<String> {
        match self {
            DependencySet::All => registry.names().map(|n| n.to_string()).collect(),
            DependencySet::Explicit(names) => {
                let mut seen = HashSet::new();
                names
                    .iter()
                    .filter(|n| seen.insert(n.as_str()))
                    .cloned()
                    .collect()
            }
        }
    }
}

/// Options for [`build_executable_script`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    pub delimiter: Delimiter,
    pub mode: SubstitutionMode,
}

/// Turn a library name into the parameter name bound to its module.
///
/// Characters outside `[A-Za-z0-9_]` become `_`; a leading digit or an
/// empty result gets a `_` prefix; reserved words get a `_` suffix.
///
/// ```
/// use cellscript::engine::script::js_identifier;
///
/// assert_eq!(js_identifier("d3"), "d3");
/// assert_eq!(js_identifier("d3-hierarchy"), "d3_hierarchy");
/// assert_eq!(js_identifier("notebook/js/codecell"), "notebook_js_codecell");
/// ```
pub fn js_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if JS_RESERVED.contains(&ident.as_str()) || INTERNAL_NAMES.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// Parameter names for `requirements`, made unique.
fn parameter_names(requirements: &[String]) -> Vec<String> {
    let mut used = HashSet::new();
    requirements
        .iter()
        .map(|name| {
            let base = js_identifier(name);
            let mut candidate = base.clone();
            let mut n = 2;
            while !used.insert(candidate.clone()) {
                candidate = format!("{}_{}", base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

/// A JavaScript string literal for `text` that never contains the
/// delimiter marker.
fn js_string_literal(text: &str, delimiter: Delimiter) -> String {
    let marker = delimiter.marker();
    let escaped = format!("\\u{:04x}", marker as u32);
    serde_json::Value::from(text)
        .to_string()
        .replace(marker, &escaped)
}

/// Wrap `body` in the dependency gate and error boundary.
///
/// Returns the wrapped text and the byte offset at which `body` starts.
pub fn wrap_script(body: &str, requirements: &[String], delimiter: Delimiter) -> (String, usize) {
    let literals = requirements
        .iter()
        .map(|r| js_string_literal(r, delimiter))
        .collect::<Vec<_>>()
        .join(", ");
    let parameters = parameter_names(requirements).join(", ");

    let head = format!(
        r#"(function () {{
    const cellscriptRequirements = [{literals}];

    const cellscriptRenderError = function (err) {{
        const stack = (err && err.stack) ? String(err.stack) : String(err);
        const div = document.createElement('div');
        div.className = 'js-error';
        div.style.whiteSpace = 'pre-wrap';
        div.textContent = stack;
        div.appendChild(document.createElement('hr'));
        element.append(div);
    }};

    try {{
        console.log('Checking required libraries: ', cellscriptRequirements);

        cellscriptRequirements.forEach(function (lib) {{
            const isDefined = require.defined(lib);
            console.log('Checking library: ' + lib, isDefined ? '✓' : 'x');

            if (!isDefined) {{
                const err = new Error("Requirement could not be satisfied: '" + lib + "'");
                err.name = '{error_name}';
                throw err;
            }}
        }});

        require(cellscriptRequirements, function ({parameters}) {{
            try {{
"#,
        literals = literals,
        parameters = parameters,
        error_name = UNSATISFIED_REQUIREMENT,
    );

    let tail = r#"
            } catch (err) {
                cellscriptRenderError(err);
                throw err;
            }
        }, function (err) {
            cellscriptRenderError(err);
            throw err;
        });
    } catch (err) {
        cellscriptRenderError(err);
        throw err;
    }
})();
"#;

    let body_start = head.len();
    let mut script = String::with_capacity(head.len() + body.len() + tail.len());
    script.push_str(&head);
    script.push_str(body);
    script.push_str(tail);
    (script, body_start)
}

/// Build the final script for `raw`.
///
/// Wraps `raw` with [`wrap_script`] and substitutes `namespace` into the
/// result.
///
/// # Errors
///
/// In strict mode, returns `TemplateError::UnresolvedPlaceholder` with the
/// offset relative to `raw`.
pub fn build_executable_script(
    raw: &str,
    requirements: &[String],
    namespace: &SanitizedNamespace,
    options: &BuildOptions,
) -> Result<String, TemplateError> {
    let (wrapped, body_start) = wrap_script(raw, requirements, options.delimiter);

    ScriptTemplate::new(wrapped, options.delimiter)
        .render(namespace, options.mode)
        .map_err(|e| match e {
            TemplateError::UnresolvedPlaceholder { name, offset } => {
                TemplateError::UnresolvedPlaceholder {
                    name,
                    offset: offset.saturating_sub(body_start),
                }
            }
        })
}
