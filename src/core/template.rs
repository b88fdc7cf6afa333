//! core::template
//!
//! Placeholder substitution for script text.
//!
//! # Syntax
//!
//! With the default delimiter `$$`:
//!
//! - `$$name` and `$${name}` are placeholders (`name` is an ASCII
//!   identifier, `[A-Za-z_][A-Za-z0-9_]*`)
//! - `$$$$` is an escaped delimiter and renders as `$$`
//! - a delimiter followed by anything else is literal text
//! - single markers (`${x}`, `$(el)`) are always literal
//!
//! The scanner turns the source into [`Token`]s once; rendering is a single
//! pass over them.

use thiserror::Error;

use super::namespace::SanitizedNamespace;
use super::types::{identifier_len, Delimiter};

/// Errors from template rendering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unresolved placeholder '{name}' at byte {offset}")]
    UnresolvedPlaceholder { name: String, offset: usize },
}

/// How unresolved placeholders are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubstitutionMode {
    /// Leave unresolved placeholders in the output verbatim.
    #[default]
    Safe,
    /// Fail on the first unresolved placeholder.
    Strict,
}

impl SubstitutionMode {
    pub fn from_safe_flag(safe: bool) -> Self {
        if safe {
            SubstitutionMode::Safe
        } else {
            SubstitutionMode::Strict
        }
    }
}

/// A piece of scanned template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Text copied to the output as-is.
    Literal(&'a str),
    /// A placeholder to resolve against the namespace.
    Placeholder {
        /// The identifier between delimiter and end (braces excluded).
        name: &'a str,
        /// The full source text of the placeholder.
        raw: &'a str,
        /// Byte offset of the placeholder in the source.
        offset: usize,
    },
}

/// Split `source` into literal and placeholder tokens.
pub fn tokenize(source: &str, delimiter: Delimiter) -> Vec<Token<'_>> {
    let delim = delimiter.as_string();
    let dlen = delim.len();
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while let Some(found) = source[pos..].find(&delim) {
        let at = pos + found;
        let after = at + dlen;
        let rest = &source[after..];

        // Escaped delimiter: emit a single delimiter
        if rest.starts_with(&delim) {
            push_literal(&mut tokens, &source[literal_start..at]);
            push_literal(&mut tokens, &source[at..after]);
            pos = after + dlen;
            literal_start = pos;
            continue;
        }

        let placeholder = if let Some(len) = identifier_len(rest) {
            Some((&rest[..len], after + len))
        } else if let Some(inner) = rest.strip_prefix('{') {
            identifier_len(inner)
                .filter(|&len| inner[len..].starts_with('}'))
                .map(|len| (&inner[..len], after + len + 2))
        } else {
            None
        };

        match placeholder {
            Some((name, end)) => {
                push_literal(&mut tokens, &source[literal_start..at]);
                tokens.push(Token::Placeholder {
                    name,
                    raw: &source[at..end],
                    offset: at,
                });
                pos = end;
                literal_start = end;
            }
            // Malformed: the delimiter stays literal
            None => pos = after,
        }
    }

    push_literal(&mut tokens, &source[literal_start..]);
    tokens
}

fn push_literal<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str) {
    if !text.is_empty() {
        tokens.push(Token::Literal(text));
    }
}

/// An immutable script template.
///
/// Created per invocation and consumed by [`ScriptTemplate::render`].
///
/// # Example
///
/// ```
/// use cellscript::core::namespace::SanitizedNamespace;
/// use cellscript::core::template::{ScriptTemplate, SubstitutionMode};
/// use cellscript::core::types::Delimiter;
///
/// let mut ns = SanitizedNamespace::new();
/// ns.insert("x", serde_json::json!(42));
///
/// let template = ScriptTemplate::new("console.log($$x, `${y}`)", Delimiter::default());
/// let script = template.render(&ns, SubstitutionMode::Safe).unwrap();
/// assert_eq!(script, "console.log(42, `${y}`)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTemplate {
    source: String,
    delimiter: Delimiter,
}

impl ScriptTemplate {
    pub fn new(source: impl Into<String>, delimiter: Delimiter) -> Self {
        Self {
            source: source.into(),
            delimiter,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    /// Names of all placeholders, in source order (repeats included).
    pub fn placeholders(&self) -> Vec<&str> {
        tokenize(&self.source, self.delimiter)
            .into_iter()
            .filter_map(|token| match token {
                Token::Placeholder { name, .. } => Some(name),
                Token::Literal(_) => None,
            })
            .collect()
    }

    /// Substitute `namespace` into the template.
    ///
    /// # Errors
    ///
    /// In [`SubstitutionMode::Strict`], returns
    /// `TemplateError::UnresolvedPlaceholder` for the first placeholder with
    /// no matching entry. Safe mode never fails.
    pub fn render(
        self,
        namespace: &SanitizedNamespace,
        mode: SubstitutionMode,
    ) -> Result<String, TemplateError> {
        let mut output = String::with_capacity(self.source.len());

        for token in tokenize(&self.source, self.delimiter) {
            match token {
                Token::Literal(text) => output.push_str(text),
                Token::Placeholder { name, raw, offset } => match namespace.render(name) {
                    Some(value) => output.push_str(&value),
                    None if mode == SubstitutionMode::Safe => output.push_str(raw),
                    None => {
                        return Err(TemplateError::UnresolvedPlaceholder {
                            name: name.to_string(),
                            offset,
                        })
                    }
                },
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ns(pairs: &[(&str, serde_json::Value)]) -> SanitizedNamespace {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn render_safe(source: &str, namespace: &SanitizedNamespace) -> String {
        ScriptTemplate::new(source, Delimiter::default())
            .render(namespace, SubstitutionMode::Safe)
            .unwrap()
    }

    mod tokenize {
        use super::*;

        #[test]
        fn plain_text_is_one_literal() {
            let tokens = tokenize("let a = 1;", Delimiter::default());
            assert_eq!(tokens, vec![Token::Literal("let a = 1;")]);
        }

        #[test]
        fn empty_source_has_no_tokens() {
            assert!(tokenize("", Delimiter::default()).is_empty());
        }

        #[test]
        fn named_placeholder() {
            let tokens = tokenize("f($$data);", Delimiter::default());
            assert_eq!(
                tokens,
                vec![
                    Token::Literal("f("),
                    Token::Placeholder {
                        name: "data",
                        raw: "$$data",
                        offset: 2
                    },
                    Token::Literal(");"),
                ]
            );
        }

        #[test]
        fn braced_placeholder() {
            let tokens = tokenize("$${a}b", Delimiter::default());
            assert_eq!(
                tokens,
                vec![
                    Token::Placeholder {
                        name: "a",
                        raw: "$${a}",
                        offset: 0
                    },
                    Token::Literal("b"),
                ]
            );
        }

        #[test]
        fn escaped_delimiter() {
            let tokens = tokenize("a$$$$b", Delimiter::default());
            assert_eq!(
                tokens,
                vec![
                    Token::Literal("a"),
                    Token::Literal("$$"),
                    Token::Literal("b")
                ]
            );
        }

        #[test]
        fn single_markers_are_literal() {
            let source = "`${x}` + $(el) + $y";
            assert_eq!(
                tokenize(source, Delimiter::default()),
                vec![Token::Literal(source)]
            );
        }

        #[test]
        fn malformed_delimiter_is_literal() {
            let source = "cost: $$ 5 and $${ x } and $$1 and $$";
            assert_eq!(
                tokenize(source, Delimiter::default()),
                vec![Token::Literal(source)]
            );
        }

        #[test]
        fn triple_marker_stays_literal() {
            let source = "$$$x";
            assert_eq!(
                tokenize(source, Delimiter::default()),
                vec![Token::Literal(source)]
            );
        }

        #[test]
        fn custom_delimiter() {
            let tokens = tokenize("$$a %%b", Delimiter::new("%%").unwrap());
            assert_eq!(
                tokens,
                vec![
                    Token::Literal("$$a "),
                    Token::Placeholder {
                        name: "b",
                        raw: "%%b",
                        offset: 4
                    },
                ]
            );
        }

        #[test]
        fn non_ascii_text_around_placeholders() {
            let tokens = tokenize("✓ $$x ✗", Delimiter::default());
            assert_eq!(
                tokens,
                vec![
                    Token::Literal("✓ "),
                    Token::Placeholder {
                        name: "x",
                        raw: "$$x",
                        offset: 4
                    },
                    Token::Literal(" ✗"),
                ]
            );
        }
    }

    #[test]
    fn substitutes_json_values() {
        let values = ns(&[
            ("x", json!(42)),
            ("name", json!("d3")),
            ("rows", json!([{"a": 1}])),
        ]);

        assert_eq!(render_safe("console.log($$x)", &values), "console.log(42)");
        assert_eq!(render_safe("select($$name)", &values), "select(\"d3\")");
        assert_eq!(render_safe("data($${rows})", &values), "data([{\"a\":1}])");
    }

    #[test]
    fn identifier_ends_at_first_non_identifier_char() {
        let values = ns(&[("x", json!(1))]);
        assert_eq!(render_safe("$$x.y $$xy", &values), "1.y $$xy");
    }

    #[test]
    fn safe_mode_keeps_unresolved() {
        let values = ns(&[]);
        assert_eq!(render_safe("f($$missing, $${other})", &values), "f($$missing, $${other})");
    }

    #[test]
    fn strict_mode_reports_first_unresolved() {
        let values = ns(&[("a", json!(1))]);
        let err = ScriptTemplate::new("$$a + $$b + $$c", Delimiter::default())
            .render(&values, SubstitutionMode::Strict)
            .unwrap_err();

        assert_eq!(
            err,
            TemplateError::UnresolvedPlaceholder {
                name: "b".into(),
                offset: 6
            }
        );
    }

    #[test]
    fn strict_mode_ignores_malformed_delimiters() {
        let values = ns(&[]);
        let out = ScriptTemplate::new("price $$ 5", Delimiter::default())
            .render(&values, SubstitutionMode::Strict)
            .unwrap();
        assert_eq!(out, "price $$ 5");
    }

    #[test]
    fn escaped_delimiter_renders_once() {
        let values = ns(&[("x", json!(1))]);
        assert_eq!(render_safe("$$$$x", &values), "$$x");
    }

    #[test]
    fn template_literals_untouched() {
        let values = ns(&[("x", json!(300))]);
        assert_eq!(
            render_safe("const x = $$x; `translate(${x}, ${x})`", &values),
            "const x = 300; `translate(${x}, ${x})`"
        );
    }

    #[test]
    fn placeholders_listed_in_order() {
        let template = ScriptTemplate::new("$$b $$a $${b}", Delimiter::default());
        assert_eq!(template.placeholders(), vec!["b", "a", "b"]);
    }

    #[test]
    fn mode_from_flag() {
        assert_eq!(SubstitutionMode::from_safe_flag(true), SubstitutionMode::Safe);
        assert_eq!(SubstitutionMode::from_safe_flag(false), SubstitutionMode::Strict);
    }
}
