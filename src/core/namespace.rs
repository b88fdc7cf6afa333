//! core::namespace
//!
//! Variable namespaces handed to the script builder.
//!
//! # Overview
//!
//! A [`Namespace`] is the caller's view of the interactive session: an
//! ordered mapping from variable name to an arbitrary host value. The core
//! only ever reads it. Values are stored as [`Bindable`] trait objects so any
//! `Serialize` type can be bound, and so can values that will fail to
//! serialize (see [`Opaque`]).
//!
//! A [`SanitizedNamespace`] is what survives sanitization: every value has
//! already been converted to JSON, so it can be embedded in script text
//! without further checks.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{self, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// A host value that can be offered for embedding into a script.
///
/// Implemented for every `Serialize + Debug` type. The conversion is the
/// serializability check: a value is embeddable iff `to_json` succeeds.
/// Non-finite floats are refused rather than turned into `null`.
pub trait Bindable: fmt::Debug + Send + Sync {
    /// Convert the value into JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error when the value has no JSON form
    /// (non-string map keys, `NaN` or infinite floats, custom serializers
    /// that refuse, ...).
    fn to_json(&self) -> Result<Value, serde_json::Error>;
}

impl<T> Bindable for T
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn to_json(&self) -> Result<Value, serde_json::Error> {
        self.serialize(FiniteCheck)
            .map_err(<serde_json::Error as ser::Error>::custom)?;
        serde_json::to_value(self)
    }
}

/// Error raised by [`FiniteCheck`].
#[derive(Debug, Error)]
#[error("{0}")]
struct FiniteCheckError(String);

impl ser::Error for FiniteCheckError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        FiniteCheckError(msg.to_string())
    }
}

/// A serializer that only walks a value, failing on non-finite floats.
///
/// `serde_json` writes `NaN` and the infinities as `null`, which would change
/// the value silently.
#[derive(Debug, Clone, Copy)]
struct FiniteCheck;

type CheckResult = Result<(), FiniteCheckError>;

fn check_float(value: f64) -> CheckResult {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FiniteCheckError(format!(
            "non-finite float {} has no JSON form",
            value
        )))
    }
}

impl Serializer for FiniteCheck {
    type Ok = ();
    type Error = FiniteCheckError;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _: bool) -> CheckResult {
        Ok(())
    }

    fn serialize_i8(self, _: i8) -> CheckResult {
        Ok(())
    }

    fn serialize_i16(self, _: i16) -> CheckResult {
        Ok(())
    }

    fn serialize_i32(self, _: i32) -> CheckResult {
        Ok(())
    }

    fn serialize_i64(self, _: i64) -> CheckResult {
        Ok(())
    }

    fn serialize_i128(self, _: i128) -> CheckResult {
        Ok(())
    }

    fn serialize_u8(self, _: u8) -> CheckResult {
        Ok(())
    }

    fn serialize_u16(self, _: u16) -> CheckResult {
        Ok(())
    }

    fn serialize_u32(self, _: u32) -> CheckResult {
        Ok(())
    }

    fn serialize_u64(self, _: u64) -> CheckResult {
        Ok(())
    }

    fn serialize_u128(self, _: u128) -> CheckResult {
        Ok(())
    }

    fn serialize_f32(self, value: f32) -> CheckResult {
        check_float(f64::from(value))
    }

    fn serialize_f64(self, value: f64) -> CheckResult {
        check_float(value)
    }

    fn serialize_char(self, _: char) -> CheckResult {
        Ok(())
    }

    fn serialize_str(self, _: &str) -> CheckResult {
        Ok(())
    }

    fn serialize_bytes(self, _: &[u8]) -> CheckResult {
        Ok(())
    }

    fn serialize_none(self) -> CheckResult {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> CheckResult {
        value.serialize(self)
    }

    fn serialize_unit(self) -> CheckResult {
        Ok(())
    }

    fn serialize_unit_struct(self, _: &'static str) -> CheckResult {
        Ok(())
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> CheckResult {
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> CheckResult {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> CheckResult {
        value.serialize(self)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self, FiniteCheckError> {
        Ok(self)
    }

    fn serialize_tuple(self, _: usize) -> Result<Self, FiniteCheckError> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self, FiniteCheckError> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, FiniteCheckError> {
        Ok(self)
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self, FiniteCheckError> {
        Ok(self)
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self, FiniteCheckError> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, FiniteCheckError> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteCheck {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteCheck {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteCheck {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteCheck {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> CheckResult {
        key.serialize(FiniteCheck)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _: &'static str, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = FiniteCheckError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _: &'static str, value: &T) -> CheckResult {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> CheckResult {
        Ok(())
    }
}

/// A host object with no JSON representation.
///
/// Stands in for session values such as modules, functions or open handles.
/// Serializing it always fails, naming the host type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque {
    type_name: String,
}

impl Opaque {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl Serialize for Opaque {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(ser::Error::custom(format!(
            "object of type '{}' is not JSON serializable",
            self.type_name
        )))
    }
}

/// The interactive session's variables.
///
/// Iteration follows insertion order. Re-inserting an existing name replaces
/// the value in place.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    entries: IndexMap<String, Arc<dyn Bindable>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value under `name`.
    pub fn insert<V>(&mut self, name: impl Into<String>, value: V)
    where
        V: Bindable + 'static,
    {
        self.entries.insert(name.into(), Arc::new(value));
    }

    /// Bind an already shared value under `name`.
    pub fn insert_shared(&mut self, name: impl Into<String>, value: Arc<dyn Bindable>) {
        self.entries.insert(name.into(), value);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with<V>(mut self, name: impl Into<String>, value: V) -> Self
    where
        V: Bindable + 'static,
    {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Bindable>> {
        self.entries.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Bindable>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a namespace from the members of a JSON object.
    pub fn from_json_object(object: serde_json::Map<String, Value>) -> Self {
        object.into_iter().collect()
    }

    /// Return a copy of `self` with `local` layered on top.
    ///
    /// Names bound in both keep their position from `self` and take the
    /// value from `local`; names only in `local` are appended.
    pub fn overlay(&self, local: &Namespace) -> Namespace {
        let mut merged = self.clone();
        for (name, value) in local.iter() {
            merged.insert_shared(name, Arc::clone(value));
        }
        merged
    }
}

impl FromIterator<(String, Value)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut namespace = Namespace::new();
        for (name, value) in iter {
            namespace.insert(name, value);
        }
        namespace
    }
}

/// Variables that passed sanitization, already in JSON form.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct SanitizedNamespace {
    entries: IndexMap<String, Value>,
}

impl SanitizedNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Script text for the value bound to `name`: compact JSON, which is
    /// also a valid JavaScript expression.
    pub fn render(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(Value::to_string)
    }

    /// Convert back into a plain namespace, e.g. to sanitize again.
    pub fn into_namespace(self) -> Namespace {
        self.entries.into_iter().collect()
    }
}

impl FromIterator<(String, Value)> for SanitizedNamespace {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn serializable_values_convert() {
        assert_eq!(42_i32.to_json().unwrap(), json!(42));
        assert_eq!("text".to_json().unwrap(), json!("text"));
        assert_eq!(vec![1_i32, 2, 3].to_json().unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn opaque_values_fail() {
        let err = Opaque::new("module").to_json().unwrap_err();
        assert!(err.to_string().contains("'module' is not JSON serializable"));
    }

    #[test]
    fn non_string_keys_fail() {
        let mut map = HashMap::new();
        map.insert((1_i32, 2_i32), "point");
        assert!(map.to_json().is_err());
    }

    #[test]
    fn non_finite_floats_fail() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = value.to_json().unwrap_err();
            assert!(err.to_string().contains("non-finite float"), "{}", err);
        }
        assert!(vec![1.0_f64, f64::NAN].to_json().is_err());
        assert!(Some(f32::INFINITY).to_json().is_err());
        assert_eq!(vec![1.5_f64, -0.25].to_json().unwrap(), json!([1.5, -0.25]));
    }

    #[test]
    fn insertion_order_preserved() {
        let ns = Namespace::new().with("b", 1).with("a", 2).with("c", 3);
        let names: Vec<_> = ns.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn overlay_replaces_and_appends() {
        let base = Namespace::new().with("x", 1).with("y", 2);
        let local = Namespace::new().with("y", 20).with("z", 30);

        let merged = base.overlay(&local);

        let pairs: Vec<_> = merged
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_json().unwrap()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("x".to_string(), json!(1)),
                ("y".to_string(), json!(20)),
                ("z".to_string(), json!(30)),
            ]
        );
        // The base namespace is untouched
        assert_eq!(base.get("y").unwrap().to_json().unwrap(), json!(2));
    }

    #[test]
    fn from_json_object_keeps_order() {
        let value = json!({"zeta": 1, "alpha": [1, 2]});
        let ns = Namespace::from_json_object(value.as_object().unwrap().clone());
        let names: Vec<_> = ns.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn sanitized_render_is_json() {
        let ns: SanitizedNamespace = vec![
            ("n".to_string(), json!(42)),
            ("s".to_string(), json!("it's \"quoted\"")),
            ("o".to_string(), json!({"a": [1, null]})),
        ]
        .into_iter()
        .collect();

        assert_eq!(ns.render("n").unwrap(), "42");
        assert_eq!(ns.render("s").unwrap(), r#""it's \"quoted\"""#);
        assert_eq!(ns.render("o").unwrap(), r#"{"a":[1,null]}"#);
        assert!(ns.render("missing").is_none());
    }
}
