//! Adapting an object schema so it validates search params.

use std::any::Any;

use crate::coerce::{coerce, CoercedMapping};
use crate::error::ValidationError;
use crate::params::SearchParams;
use crate::schema::Schema;

const CONTAINER: &str = "SearchParams";

/// A schema adapted to take [`SearchParams`] instead of a plain object.
///
/// Validation coerces the params (see [`coerce`]) and hands the resulting
/// mapping to the wrapped schema. Every success or field failure is exactly
/// what the wrapped schema reports; the adapter adds nothing and suppresses
/// nothing.
///
/// When the wrapped schema strips unknown keys, its declared field names are
/// captured at construction and only those keys are coerced. Declared fields
/// missing from the query are then seen as undefined, and extra keys in the
/// query are never looked at. Under any other policy the query's own keys are
/// coerced, so the wrapped schema decides what happens to extras.
///
/// # Examples
///
/// ```
/// use query_schema::{use_search_params, FieldType, ObjectSchema, SearchParams};
/// use serde_json::json;
///
/// let schema = use_search_params(
///     ObjectSchema::new()
///         .field("string", FieldType::String)
///         .field("number", FieldType::Number)
///         .field("boolean", FieldType::Boolean),
/// );
///
/// let ok = schema
///     .parse(&SearchParams::from([("string", "foo"), ("number", "42"), ("boolean", "false")]))
///     .unwrap();
/// assert_eq!(
///     serde_json::Value::Object(ok),
///     json!({ "string": "foo", "number": 42, "boolean": false })
/// );
///
/// let err = schema
///     .parse(&SearchParams::from([("string", "42"), ("number", "false"), ("boolean", "foo")]))
///     .unwrap_err()
///     .flatten();
/// assert_eq!(err.field_errors["string"], vec!["Expected string, received number"]);
/// assert_eq!(err.field_errors["number"], vec!["Expected number, received boolean"]);
/// assert_eq!(err.field_errors["boolean"], vec!["Expected boolean, received string"]);
/// ```
#[derive(Debug, Clone)]
pub struct SearchParamsSchema<S> {
    schema: S,
    keys: Option<Vec<String>>,
}

impl<S: Schema> SearchParamsSchema<S> {
    /// Adapts `schema`, capturing its field names if it strips unknown keys.
    pub fn new(schema: S) -> Self {
        let keys = schema.strip_keys();

        tracing::debug!(
            policy = %schema.unknown_keys(),
            fixed_keys = keys.as_ref().map_or(0, Vec::len),
            "adapted schema to search params"
        );

        Self { schema, keys }
    }

    /// The wrapped schema.
    pub fn inner(&self) -> &S {
        &self.schema
    }

    /// Unwraps the adapter, returning the wrapped schema.
    pub fn into_inner(self) -> S {
        self.schema
    }

    /// The fixed key list used for coercion, if the wrapped schema strips.
    pub fn keys(&self) -> Option<&[String]> {
        self.keys.as_deref()
    }

    /// Coerces `params` exactly as validation would, without validating.
    pub fn coerce(&self, params: &SearchParams) -> CoercedMapping {
        coerce(params, self.keys())
    }

    /// Validates `params` against the wrapped schema.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Fields`] carrying the wrapped schema's report.
    pub fn parse(&self, params: &SearchParams) -> Result<S::Output, ValidationError> {
        let mapping = self.coerce(params);
        self.schema.validate(&mapping).map_err(|errors| {
            tracing::debug!(
                errors = errors.len(),
                "search params failed schema validation"
            );
            ValidationError::Fields(errors)
        })
    }

    /// Validates an arbitrary value, accepting only a [`SearchParams`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TypeMismatch`] before any coercion if `input`
    /// is not a `SearchParams`, otherwise whatever [`parse`](Self::parse) returns.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use query_schema::{use_search_params, ObjectSchema, SearchParams, ValidationError};
    ///
    /// let schema = use_search_params(ObjectSchema::new());
    ///
    /// let plain: HashMap<String, String> = HashMap::new();
    /// assert!(matches!(
    ///     schema.safe_parse(&plain),
    ///     Err(ValidationError::TypeMismatch { .. })
    /// ));
    ///
    /// assert!(schema.safe_parse(&SearchParams::new()).is_ok());
    /// ```
    pub fn safe_parse(&self, input: &dyn Any) -> Result<S::Output, ValidationError> {
        match input.downcast_ref::<SearchParams>() {
            Some(params) => self.parse(params),
            None => {
                tracing::debug!(expected = CONTAINER, "input is not search params");
                Err(ValidationError::TypeMismatch {
                    expected: CONTAINER,
                })
            }
        }
    }

    /// Decodes a raw query string and validates it.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse).
    pub fn parse_str(&self, query: &str) -> Result<S::Output, ValidationError> {
        self.parse(&SearchParams::parse(query))
    }
}

/// Adapts `schema` to validate [`SearchParams`].
///
/// Shorthand for [`SearchParamsSchema::new`].
pub fn use_search_params<S: Schema>(schema: S) -> SearchParamsSchema<S> {
    SearchParamsSchema::new(schema)
}
