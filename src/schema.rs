//! Object-shape schemas and the contract the search params adapter relies on.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

use crate::coerce::CoercedMapping;
use crate::error::{FieldErrors, Issue, IssueKind};

/// What a schema does with keys it does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UnknownKeys {
    /// Fail validation with an unrecognized-keys error
    Strict,
    /// Drop them from the output
    #[default]
    Strip,
    /// Keep them in the output unchanged
    Passthrough,
}

impl fmt::Display for UnknownKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownKeys::Strict => write!(f, "strict"),
            UnknownKeys::Strip => write!(f, "strip"),
            UnknownKeys::Passthrough => write!(f, "passthrough"),
        }
    }
}

/// An object schema that can validate a coerced query mapping.
///
/// Implementations describe their declared fields and unknown-key policy, and
/// validate a [`CoercedMapping`] into their output type or a [`FieldErrors`]
/// report.
///
/// # Invariants
///
/// Implementations MUST:
/// - Return the same field names from `shape_keys` for the schema's lifetime
/// - Treat a key whose value is undefined exactly like a missing key
/// - Not panic on any input
///
/// # Examples
///
/// ```
/// use query_schema::{CoercedMapping, FieldErrors, Schema, UnknownKeys};
///
/// struct Everything;
///
/// impl Schema for Everything {
///     type Output = usize;
///
///     fn shape_keys(&self) -> Vec<String> {
///         Vec::new()
///     }
///
///     fn unknown_keys(&self) -> UnknownKeys {
///         UnknownKeys::Passthrough
///     }
///
///     fn validate(&self, input: &CoercedMapping) -> Result<usize, FieldErrors> {
///         Ok(input.len())
///     }
/// }
///
/// assert_eq!(Everything.strip_keys(), None);
/// ```
pub trait Schema {
    /// Value produced by successful validation.
    type Output;

    /// The declared field names, in declaration order.
    fn shape_keys(&self) -> Vec<String>;

    /// The schema's policy for undeclared keys.
    fn unknown_keys(&self) -> UnknownKeys;

    /// Validates a coerced mapping.
    ///
    /// # Errors
    ///
    /// Returns `FieldErrors` describing every failing field.
    fn validate(&self, input: &CoercedMapping) -> Result<Self::Output, FieldErrors>;

    /// The declared field names if, and only if, the schema strips unknown keys.
    fn strip_keys(&self) -> Option<Vec<String>> {
        (self.unknown_keys() == UnknownKeys::Strip).then(|| self.shape_keys())
    }
}

impl<S: Schema + ?Sized> Schema for &S {
    type Output = S::Output;

    fn shape_keys(&self) -> Vec<String> {
        (**self).shape_keys()
    }

    fn unknown_keys(&self) -> UnknownKeys {
        (**self).unknown_keys()
    }

    fn validate(&self, input: &CoercedMapping) -> Result<Self::Output, FieldErrors> {
        (**self).validate(input)
    }
}

/// The type a single field must have.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// A JSON string
    String,
    /// Any finite JSON number
    Number,
    /// A JSON number without a fractional part
    Integer,
    /// `true` or `false`
    Boolean,
    /// JSON `null`
    Null,
    /// Any present value
    Any,
    /// An array whose elements all match the inner type
    Array(Box<FieldType>),
    /// A nested object
    Object(ObjectSchema),
    /// The inner type, or missing
    Optional(Box<FieldType>),
}

impl FieldType {
    /// Shorthand for `FieldType::Array(Box::new(inner))`.
    pub fn array(inner: FieldType) -> Self {
        FieldType::Array(Box::new(inner))
    }

    /// Shorthand for `FieldType::Optional(Box::new(inner))`.
    pub fn optional(inner: FieldType) -> Self {
        FieldType::Optional(Box::new(inner))
    }

    fn name(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Number | FieldType::Integer => "number".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Null => "null".to_string(),
            FieldType::Any => "any".to_string(),
            FieldType::Array(_) => "array".to_string(),
            FieldType::Object(_) => "object".to_string(),
            FieldType::Optional(inner) => inner.name(),
        }
    }

    fn check(
        &self,
        path: &[String],
        value: Option<&Value>,
        issues: &mut Vec<Issue>,
    ) -> Option<Value> {
        let value = match (self, value) {
            (FieldType::Optional(_), None) => return None,
            (FieldType::Optional(inner), Some(v)) => return inner.check(path, Some(v), issues),
            (_, None) => {
                issues.push(Issue::new(path.to_vec(), IssueKind::Required));
                return None;
            }
            (_, Some(v)) => v,
        };

        match (self, value) {
            (FieldType::Any, v) => Some(v.clone()),
            (FieldType::String, Value::String(_))
            | (FieldType::Number, Value::Number(_))
            | (FieldType::Boolean, Value::Bool(_))
            | (FieldType::Null, Value::Null) => Some(value.clone()),
            (FieldType::Integer, Value::Number(n)) => match whole_number(n) {
                Some(whole) => Some(Value::Number(whole)),
                None => {
                    issues.push(Issue::new(path.to_vec(), IssueKind::NotInteger));
                    None
                }
            },
            (FieldType::Array(inner), Value::Array(items)) => {
                let before = issues.len();
                let mut checked = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    if let Some(v) = inner.check(&child(path, &i.to_string()), Some(item), issues) {
                        checked.push(v);
                    }
                }
                (issues.len() == before).then_some(Value::Array(checked))
            }
            (FieldType::Object(schema), Value::Object(map)) => {
                schema.check_map(path, map, issues).map(Value::Object)
            }
            _ => {
                issues.push(Issue::new(
                    path.to_vec(),
                    IssueKind::InvalidType {
                        expected: self.name(),
                        received: json_type_name(value),
                    },
                ));
                None
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn child(path: &[String], segment: &str) -> Vec<String> {
    let mut path = path.to_vec();
    path.push(segment.to_string());
    path
}

// Integers pass as they are. Floats without a fractional part (`3.0`, `1e3`)
// are normalized to an integer when they fit in `i64`, and kept as floats
// beyond that range.
fn whole_number(n: &Number) -> Option<Number> {
    if n.is_i64() || n.is_u64() {
        return Some(n.clone());
    }
    let f = n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0)?;
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Number::from(f as i64))
    } else {
        Some(n.clone())
    }
}

/// A schema describing an object with named, typed fields.
///
/// Fields are declared with the builder methods and checked in declaration
/// order. The unknown-key policy defaults to [`UnknownKeys::Strip`].
///
/// # Examples
///
/// ```
/// use query_schema::{FieldType, ObjectSchema, Schema, UnknownKeys};
///
/// let schema = ObjectSchema::new()
///     .field("page", FieldType::Integer)
///     .field("q", FieldType::optional(FieldType::String))
///     .strict();
///
/// assert_eq!(schema.unknown_keys(), UnknownKeys::Strict);
/// assert_eq!(schema.shape_keys(), vec!["page", "q"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    fields: Vec<(String, FieldType)>,
    unknown_keys: UnknownKeys,
}

impl ObjectSchema {
    /// Creates an empty schema that strips unknown keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a field. Declaring a name again replaces its type in place.
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = ty,
            None => self.fields.push((name, ty)),
        }
        self
    }

    /// Rejects undeclared keys.
    pub fn strict(self) -> Self {
        self.with_unknown_keys(UnknownKeys::Strict)
    }

    /// Drops undeclared keys from the output.
    pub fn strip(self) -> Self {
        self.with_unknown_keys(UnknownKeys::Strip)
    }

    /// Keeps undeclared keys in the output.
    pub fn passthrough(self) -> Self {
        self.with_unknown_keys(UnknownKeys::Passthrough)
    }

    /// Sets the unknown-key policy.
    pub fn with_unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown_keys = policy;
        self
    }

    /// Returns the declared type of `name`.
    pub fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, ty)| ty)
    }

    /// Validates a plain JSON object.
    ///
    /// # Errors
    ///
    /// Returns every issue found across all fields.
    pub fn validate_json(
        &self,
        input: &Map<String, Value>,
    ) -> Result<Map<String, Value>, FieldErrors> {
        let mut issues = Vec::new();
        match self.check_map(&[], input, &mut issues) {
            Some(output) if issues.is_empty() => Ok(output),
            _ => Err(issues.into_iter().collect()),
        }
    }

    fn check_map(
        &self,
        path: &[String],
        input: &Map<String, Value>,
        issues: &mut Vec<Issue>,
    ) -> Option<Map<String, Value>> {
        let before = issues.len();
        let mut output = Map::new();

        for (name, ty) in &self.fields {
            if let Some(value) = ty.check(&child(path, name), input.get(name), issues) {
                output.insert(name.clone(), value);
            }
        }

        let declared: HashSet<&str> = self.fields.iter().map(|(n, _)| n.as_str()).collect();
        let unknown: Vec<String> = input
            .keys()
            .filter(|k| !declared.contains(k.as_str()))
            .cloned()
            .collect();

        match self.unknown_keys {
            UnknownKeys::Strict if !unknown.is_empty() => {
                issues.push(Issue::new(path.to_vec(), IssueKind::UnrecognizedKeys(unknown)));
            }
            UnknownKeys::Passthrough => {
                for key in unknown {
                    if let Some(value) = input.get(&key) {
                        output.insert(key, value.clone());
                    }
                }
            }
            _ => {}
        }

        (issues.len() == before).then_some(output)
    }
}

impl Schema for ObjectSchema {
    type Output = Map<String, Value>;

    fn shape_keys(&self) -> Vec<String> {
        self.fields.iter().map(|(name, _)| name.clone()).collect()
    }

    fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    fn validate(&self, input: &CoercedMapping) -> Result<Self::Output, FieldErrors> {
        self.validate_json(&input.to_json())
    }
}

/// Validates with an [`ObjectSchema`], then decodes the result into `T`.
///
/// # Examples
///
/// ```
/// use query_schema::{use_search_params, Decode, FieldType, ObjectSchema, SearchParams};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Paging {
///     page: u32,
///     sort: Option<String>,
/// }
///
/// let schema = use_search_params(Decode::<Paging>::new(
///     ObjectSchema::new()
///         .field("page", FieldType::Integer)
///         .field("sort", FieldType::optional(FieldType::String)),
/// ));
///
/// let paging = schema.parse(&SearchParams::parse("page=3")).unwrap();
/// assert_eq!(paging.page, 3);
/// assert!(paging.sort.is_none());
/// ```
pub struct Decode<T> {
    schema: ObjectSchema,
    _target: PhantomData<fn() -> T>,
}

impl<T> Decode<T> {
    /// Wraps `schema`, decoding its output into `T`.
    pub fn new(schema: ObjectSchema) -> Self {
        Self {
            schema,
            _target: PhantomData,
        }
    }

    /// The wrapped object schema.
    pub fn schema(&self) -> &ObjectSchema {
        &self.schema
    }
}

impl<T> fmt::Debug for Decode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decode")
            .field("schema", &self.schema)
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Clone for Decode<T> {
    fn clone(&self) -> Self {
        Self::new(self.schema.clone())
    }
}

impl<T: DeserializeOwned> Schema for Decode<T> {
    type Output = T;

    fn shape_keys(&self) -> Vec<String> {
        self.schema.shape_keys()
    }

    fn unknown_keys(&self) -> UnknownKeys {
        self.schema.unknown_keys
    }

    fn validate(&self, input: &CoercedMapping) -> Result<T, FieldErrors> {
        let map = self.schema.validate(input)?;
        serde_json::from_value(Value::Object(map)).map_err(|e| {
            std::iter::once(Issue::root(IssueKind::Decode(e.to_string()))).collect()
        })
    }
}
