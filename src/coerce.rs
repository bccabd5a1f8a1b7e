//! Best-effort conversion of raw query values into JSON values.
//!
//! Every raw string is offered to the JSON parser. Anything that parses
//! becomes the parsed value (`"42"` is a number, `"false"` a boolean,
//! `"null"` null, `"[1,2]"` an array); anything else stays the raw string.
//! Coercion never fails.
//!
//! Coercion is deliberately blind to the target schema: a string field given
//! `"42"` receives a number and is rejected by the schema's own type check.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::params::SearchParams;

/// A single coerced query value.
///
/// `Many` only ever appears at the top level of a key, when the key carried
/// more than one raw value. Its elements are never `Many` themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CoercedValue {
    /// JSON `null`
    Null,
    /// JSON `true` / `false`
    Bool(bool),
    /// Any JSON number
    Number(Number),
    /// A JSON string literal, or a raw value that was not JSON
    String(String),
    /// A JSON array
    Array(Vec<Value>),
    /// A JSON object
    Object(Map<String, Value>),
    /// Every value of a repeated key, in retrieval order
    Many(Vec<CoercedValue>),
}

impl CoercedValue {
    /// Parses `raw` as JSON, falling back to the raw string.
    ///
    /// # Examples
    ///
    /// ```
    /// use query_schema::CoercedValue;
    ///
    /// assert_eq!(CoercedValue::parse("true"), CoercedValue::Bool(true));
    /// assert_eq!(CoercedValue::parse("foo"), CoercedValue::String("foo".into()));
    /// assert_eq!(CoercedValue::parse(""), CoercedValue::String(String::new()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => value.into(),
            Err(_) => CoercedValue::String(raw.to_string()),
        }
    }

    /// The value's type name as reported in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            CoercedValue::Null => "null",
            CoercedValue::Bool(_) => "boolean",
            CoercedValue::Number(_) => "number",
            CoercedValue::String(_) => "string",
            CoercedValue::Array(_) | CoercedValue::Many(_) => "array",
            CoercedValue::Object(_) => "object",
        }
    }

    /// Converts into a plain JSON value. `Many` becomes an array.
    pub fn into_json(self) -> Value {
        match self {
            CoercedValue::Null => Value::Null,
            CoercedValue::Bool(b) => Value::Bool(b),
            CoercedValue::Number(n) => Value::Number(n),
            CoercedValue::String(s) => Value::String(s),
            CoercedValue::Array(items) => Value::Array(items),
            CoercedValue::Object(map) => Value::Object(map),
            CoercedValue::Many(values) => {
                Value::Array(values.into_iter().map(CoercedValue::into_json).collect())
            }
        }
    }
}

impl From<Value> for CoercedValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CoercedValue::Null,
            Value::Bool(b) => CoercedValue::Bool(b),
            Value::Number(n) => CoercedValue::Number(n),
            Value::String(s) => CoercedValue::String(s),
            Value::Array(items) => CoercedValue::Array(items),
            Value::Object(map) => CoercedValue::Object(map),
        }
    }
}

impl From<CoercedValue> for Value {
    fn from(value: CoercedValue) -> Self {
        value.into_json()
    }
}

/// Ordered mapping from query key to coerced value.
///
/// A key can be present with no value (`None`): that is a field the schema
/// declares but the query did not carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoercedMapping {
    entries: Vec<(String, Option<CoercedValue>)>,
    // key -> position in `entries`
    index: HashMap<String, usize>,
}

impl CoercedMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value for `key`. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<CoercedValue>) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Returns the value for `key`. Absent keys and undefined values both give `None`.
    pub fn get(&self, key: &str) -> Option<&CoercedValue> {
        self.index
            .get(key)
            .and_then(|&i| self.entries[i].1.as_ref())
    }

    /// Returns true if `key` is in the mapping, even when its value is undefined.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&CoercedValue>)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Number of keys, undefined ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the mapping has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts into a JSON object. Undefined values are left out.
    pub fn to_json(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.clone().map(|v| (k.clone(), v.into_json())))
            .collect()
    }
}

/// Coerces `params` into a mapping.
///
/// With `keys`, exactly those keys are visited, in that order, whether or not
/// the params carry them. Without, the params' distinct keys are visited in
/// order of first appearance.
///
/// Per key: no raw value gives undefined, one raw value gives that value
/// coerced, several give [`CoercedValue::Many`] in retrieval order.
///
/// # Examples
///
/// ```
/// use query_schema::{coerce, CoercedValue, SearchParams};
///
/// let params = SearchParams::parse("n=42&tag=a&tag=true");
/// let mapping = coerce(&params, None);
///
/// assert_eq!(mapping.get("n"), Some(&CoercedValue::Number(42.into())));
/// assert_eq!(
///     mapping.get("tag"),
///     Some(&CoercedValue::Many(vec![
///         CoercedValue::String("a".into()),
///         CoercedValue::Bool(true),
///     ]))
/// );
/// ```
pub fn coerce(params: &SearchParams, keys: Option<&[String]>) -> CoercedMapping {
    // One pass over the pairs: raw values grouped per key, keys in first-appearance order
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&str>> = HashMap::new();
    for (key, value) in params.iter() {
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(value);
    }

    let mut mapping = CoercedMapping::new();
    let visit = |mapping: &mut CoercedMapping, key: &str| {
        let raw = groups.get(key).map_or(&[][..], Vec::as_slice);
        mapping.insert(key, coerce_key(key, raw));
    };

    match keys {
        Some(keys) => {
            for key in keys {
                visit(&mut mapping, key.as_str());
            }
        }
        None => {
            for &key in &order {
                visit(&mut mapping, key);
            }
        }
    }

    mapping
}

fn coerce_key(key: &str, raw: &[&str]) -> Option<CoercedValue> {
    let mut values: Vec<CoercedValue> = raw.iter().map(|r| CoercedValue::parse(r)).collect();

    tracing::trace!(key = %key, values = values.len(), "coerced search param");

    match values.len() {
        0 => None,
        1 => values.pop(),
        _ => Some(CoercedValue::Many(values)),
    }
}
