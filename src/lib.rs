//! Validate URL query strings against object schemas.
//!
//! Query strings carry nothing but strings, and a key may repeat. This crate
//! adapts an object schema so it can validate a query directly:
//! - **Coercion**: each raw value is parsed as JSON when it can be
//!   (`"42"`, `"true"`, `"null"`, `"[1,2]"`), and kept as a string otherwise
//! - **Repeated keys**: several values for one key become an ordered array
//! - **Unknown keys**: the wrapped schema's strict/strip/passthrough policy is
//!   honoured, and under strip its declared fields drive which keys are read
//!
//! # Core Types
//!
//! - [`SearchParams`]: Ordered multi-valued query parameter container
//! - [`Schema`]: The contract a wrapped schema fulfils
//! - [`ObjectSchema`]: Object shape with typed fields and an unknown-key policy
//! - [`SearchParamsSchema`]: A schema adapted to take `SearchParams`
//! - [`ValidationError`]: Type mismatch or the wrapped schema's field errors
//!
//! # Examples
//!
//! ```
//! use query_schema::{use_search_params, FieldType, ObjectSchema, SearchParams};
//!
//! let schema = use_search_params(
//!     ObjectSchema::new()
//!         .field("q", FieldType::String)
//!         .field("page", FieldType::Integer)
//!         .field("tags", FieldType::optional(FieldType::array(FieldType::String))),
//! );
//!
//! let query = SearchParams::parse("?q=rust&page=2&tags=cli&tags=parser");
//! let parsed = schema.parse(&query).expect("query is valid");
//! assert_eq!(parsed["page"], 2);
//! assert_eq!(parsed["tags"][1], "parser");
//!
//! let errors = schema.parse_str("q=rust&page=two").unwrap_err().flatten();
//! assert_eq!(errors.field_errors["page"], vec!["Expected number, received string"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod coerce;
mod error;
mod params;
mod schema;

pub use adapter::{use_search_params, SearchParamsSchema};
pub use coerce::{coerce, CoercedMapping, CoercedValue};
pub use error::{FieldErrors, Issue, IssueKind, ValidationError};
pub use params::SearchParams;
pub use schema::{Decode, FieldType, ObjectSchema, Schema, UnknownKeys};
