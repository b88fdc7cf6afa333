//! Property-based tests for the sanitizer and the script builder.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated namespaces and scripts.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use serde_json::{json, Value};

use cellscript::core::namespace::{Namespace, Opaque, SanitizedNamespace};
use cellscript::core::sanitize::{sanitize, SanitizeOptions};
use cellscript::core::template::SubstitutionMode;
use cellscript::engine::script::{build_executable_script, wrap_script, BuildOptions};

/// A namespace value: plain data, a float with no JSON form, or a host
/// object with no JSON form.
#[derive(Debug, Clone)]
enum Val {
    Num(i64),
    NonFinite(f64),
    Host,
}

impl Val {
    fn json(&self) -> Option<Value> {
        match self {
            Val::Num(n) => Some(json!(n)),
            Val::NonFinite(_) | Val::Host => None,
        }
    }

    fn bind(&self, ns: &mut Namespace, name: &str) {
        match self {
            Val::Num(n) => ns.insert(name, *n),
            Val::NonFinite(f) => ns.insert(name, *f),
            Val::Host => ns.insert(name, Opaque::new("Figure")),
        }
    }
}

fn value_strategy() -> impl Strategy<Value = Val> {
    prop_oneof![
        4 => any::<i64>().prop_map(Val::Num),
        1 => prop::sample::select(vec![f64::NAN, f64::INFINITY, f64::NEG_INFINITY])
            .prop_map(Val::NonFinite),
        1 => Just(Val::Host),
    ]
}

/// Names drawn from a small pool so rules overlap often.
fn name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "In", "Out", "_", "_private", "__dunder", "data", "width", "token", "x", "y",
    ])
    .prop_map(String::from)
}

fn entries_strategy() -> impl Strategy<Value = Vec<(String, Val)>> {
    prop::collection::hash_map(name_strategy(), value_strategy(), 0..8)
        .prop_map(|m| m.into_iter().collect())
}

fn build_namespace(entries: &[(String, Val)]) -> Namespace {
    let mut ns = Namespace::new();
    for (name, value) in entries {
        value.bind(&mut ns, name);
    }
    ns
}

/// The sanitizer rules, restated directly.
fn expected(
    entries: &[(String, Val)],
    bindings: &[(String, Val)],
    blacklist: &HashSet<String>,
    allow_private: bool,
) -> Vec<(String, Value)> {
    let bound: HashMap<&str, &Val> = bindings.iter().map(|(n, v)| (n.as_str(), v)).collect();
    let mut out = Vec::new();

    for (name, value) in entries {
        match bound.get(name.as_str()) {
            Some(binding) => {
                if let Some(json) = binding.json() {
                    out.push((name.clone(), json));
                }
            }
            None => {
                let excluded = blacklist.contains(name)
                    || name == "In"
                    || name == "Out"
                    || (name.starts_with('_') && !allow_private);
                if let (false, Some(json)) = (excluded, value.json()) {
                    out.push((name.clone(), json));
                }
            }
        }
    }

    let present: HashSet<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    for (name, value) in bindings {
        if !present.contains(name.as_str()) {
            if let Some(json) = value.json() {
                out.push((name.clone(), json));
            }
        }
    }
    out
}

fn as_pairs(ns: &SanitizedNamespace) -> Vec<(String, Value)> {
    ns.iter().map(|(n, v)| (n.to_string(), v.clone())).collect()
}

proptest! {
    /// The sanitizer excludes exactly what the rules exclude and keeps
    /// everything else with identical values.
    #[test]
    fn sanitize_exclusion_set_is_exact(
        entries in entries_strategy(),
        bindings in entries_strategy(),
        blacklist in prop::collection::hash_set(name_strategy(), 0..4),
        allow_private in any::<bool>(),
    ) {
        let mut options = SanitizeOptions {
            blacklist: blacklist.clone(),
            allow_private,
            ..SanitizeOptions::default()
        };
        for (name, value) in &bindings {
            value.bind(&mut options.bindings, name);
        }

        let outcome = sanitize(&build_namespace(&entries), &options);

        prop_assert_eq!(
            as_pairs(&outcome.namespace),
            expected(&entries, &bindings, &blacklist, allow_private)
        );
    }

    /// Sanitizing a sanitized namespace again changes nothing.
    #[test]
    fn sanitize_is_idempotent(
        entries in entries_strategy(),
        bindings in entries_strategy(),
        blacklist in prop::collection::hash_set(name_strategy(), 0..4),
        allow_private in any::<bool>(),
    ) {
        let mut options = SanitizeOptions {
            blacklist,
            allow_private,
            ..SanitizeOptions::default()
        };
        for (name, value) in &bindings {
            value.bind(&mut options.bindings, name);
        }

        let once = sanitize(&build_namespace(&entries), &options).namespace;
        let twice = sanitize(&once.clone().into_namespace(), &options).namespace;

        prop_assert_eq!(once, twice);
    }

    /// A script without the doubled marker passes through verbatim.
    #[test]
    fn script_without_delimiter_is_verbatim(
        body in "([^$]|\\$[^$]){0,80}",
        value in any::<i64>(),
    ) {
        let mut ns = SanitizedNamespace::new();
        ns.insert("x", json!(value));
        let requirements = vec!["d3".to_string()];

        let script = build_executable_script(&body, &requirements, &ns, &BuildOptions::default())
            .unwrap();
        let (wrapped, start) = wrap_script(&body, &requirements, Default::default());

        prop_assert_eq!(&script, &wrapped);
        prop_assert_eq!(&script[start..start + body.len()], body.as_str());
    }

    /// A placeholder for a present key is replaced by its JSON value and
    /// single-marker syntax around it is untouched.
    #[test]
    fn placeholder_replaced_by_json_value(
        key in "[a-z][a-z0-9_]{0,8}",
        value in any::<i64>(),
        prefix in "[a-z ;(){}]{0,20}",
        suffix in "[a-z ;(){}]{0,20}",
        braced in any::<bool>(),
    ) {
        let placeholder = if braced { format!("$${{{}}}", key) } else { format!("$${}", key) };
        let body = format!("{prefix} ${{y}} $(el) f({placeholder}) {suffix}");
        let expected_body = format!("{prefix} ${{y}} $(el) f({value}) {suffix}");

        let mut ns = SanitizedNamespace::new();
        ns.insert(key.clone(), json!(value));

        for mode in [SubstitutionMode::Safe, SubstitutionMode::Strict] {
            let options = BuildOptions { mode, ..BuildOptions::default() };
            let script = build_executable_script(&body, &[], &ns, &options).unwrap();
            let (_, start) = wrap_script(&expected_body, &[], options.delimiter);

            prop_assert_eq!(&script[start..start + expected_body.len()], expected_body.as_str());
        }
    }
}
