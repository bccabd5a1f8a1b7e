use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// Errors returned when validating search params through an adapted schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The input was not a [`SearchParams`](crate::SearchParams) container.
    #[error("Input not instance of {expected}")]
    TypeMismatch {
        /// Name of the container type that was expected
        expected: &'static str,
    },

    /// The coerced params failed the wrapped schema's checks.
    #[error("{0}")]
    Fields(FieldErrors),
}

impl ValidationError {
    /// Flattens the error into form-level messages and per-field messages.
    ///
    /// A type mismatch has no field path, so it lands in `form_errors`.
    ///
    /// # Examples
    ///
    /// ```
    /// use query_schema::ValidationError;
    ///
    /// let err = ValidationError::TypeMismatch { expected: "SearchParams" };
    /// let flat = err.flatten();
    /// assert_eq!(flat.form_errors, vec!["Input not instance of SearchParams"]);
    /// assert!(flat.field_errors.is_empty());
    /// ```
    pub fn flatten(&self) -> FieldErrors {
        match self {
            ValidationError::TypeMismatch { .. } => FieldErrors {
                form_errors: vec![self.to_string()],
                ..FieldErrors::default()
            },
            ValidationError::Fields(errors) => errors.clone(),
        }
    }

    /// Returns the field errors if this is a field validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ValidationError::Fields(errors) => Some(errors),
            ValidationError::TypeMismatch { .. } => None,
        }
    }
}

impl From<FieldErrors> for ValidationError {
    fn from(errors: FieldErrors) -> Self {
        ValidationError::Fields(errors)
    }
}

/// Structured error report produced by a schema.
///
/// `form_errors` holds messages that do not belong to a single field (for
/// example unrecognized keys at the root). `field_errors` maps a dot-joined
/// field path to the ordered messages reported for it. The issues themselves,
/// with their unjoined paths, are kept and available from
/// [`issues`](FieldErrors::issues).
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[error("{}", render(.form_errors, .field_errors))]
pub struct FieldErrors {
    /// Messages not tied to a field path
    pub form_errors: Vec<String>,
    /// Messages keyed by field path
    pub field_errors: BTreeMap<String, Vec<String>>,
    #[serde(skip)]
    issues: Vec<Issue>,
}

impl FieldErrors {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an issue under its path, or as a form error when it sits at the root.
    pub fn push(&mut self, issue: Issue) {
        let message = issue.kind.to_string();
        if issue.is_root() {
            self.form_errors.push(message);
        } else {
            self.field_errors
                .entry(issue.path.join("."))
                .or_default()
                .push(message);
        }
        self.issues.push(issue);
    }

    /// Appends every message from `other`, keeping per-field order.
    pub fn merge(&mut self, other: FieldErrors) {
        self.form_errors.extend(other.form_errors);
        for (path, messages) in other.field_errors {
            self.field_errors.entry(path).or_default().extend(messages);
        }
        self.issues.extend(other.issues);
    }

    /// Returns the messages recorded for `path`.
    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.field_errors.get(path).map(Vec::as_slice)
    }

    /// The recorded issues, in the order they were pushed.
    ///
    /// Unlike the dot-joined keys of `field_errors`, each issue's path keeps
    /// its segments, so a field named `"a.b"` and a field `b` nested under
    /// `a` stay distinguishable.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Total number of messages in the report.
    pub fn len(&self) -> usize {
        self.form_errors.len() + self.field_errors.values().map(Vec::len).sum::<usize>()
    }

    /// Returns true if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Issue> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = Issue>>(iter: I) -> Self {
        let mut errors = FieldErrors::new();
        for issue in iter {
            errors.push(issue);
        }
        errors
    }
}

// One "path: message" line per message, form errors first under "(root)"
fn render(form_errors: &[String], field_errors: &BTreeMap<String, Vec<String>>) -> String {
    let form = form_errors.iter().map(|m| ("(root)", m));
    let fields = field_errors
        .iter()
        .flat_map(|(path, messages)| messages.iter().map(move |m| (path.as_str(), m)));

    form.chain(fields)
        .map(|(path, message)| format!("{}: {}", path, message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A single validation failure at a field path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: {kind}", path_label(.path))]
pub struct Issue {
    /// Segments of the path to the field (field names and array indexes),
    /// empty for form-level issues
    pub path: Vec<String>,
    /// What went wrong
    pub kind: IssueKind,
}

impl Issue {
    /// Creates a new issue at `path`.
    pub fn new(path: Vec<String>, kind: IssueKind) -> Self {
        Self { path, kind }
    }

    /// Creates a form-level issue.
    pub fn root(kind: IssueKind) -> Self {
        Self::new(Vec::new(), kind)
    }

    /// Creates an issue on the top-level field `name`.
    pub fn field(name: impl Into<String>, kind: IssueKind) -> Self {
        Self::new(vec![name.into()], kind)
    }

    /// Returns true if the issue is not tied to any field.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }
}

fn path_label(path: &[String]) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.join(".")
    }
}

/// The kind of validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The value had the wrong type
    #[error("Expected {expected}, received {received}")]
    InvalidType {
        /// Type the field declares
        expected: String,
        /// Type the value actually had
        received: &'static str,
    },
    /// A declared field was missing
    #[error("Required")]
    Required,
    /// A number field that must be an integer received a fraction
    #[error("Expected integer, received float")]
    NotInteger,
    /// Keys not declared by a strict schema
    #[error("Unrecognized key(s) in object: {}", quote_keys(.0))]
    UnrecognizedKeys(Vec<String>),
    /// The validated map could not be decoded into the target type
    #[error("Failed to decode: {0}")]
    Decode(String),
}

fn quote_keys(keys: &[String]) -> String {
    keys.iter()
        .map(|k| format!("'{}'", k))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_display() {
        let err = ValidationError::TypeMismatch {
            expected: "SearchParams",
        };
        assert_eq!(err.to_string(), "Input not instance of SearchParams");
        assert!(err.field_errors().is_none());
    }

    #[test]
    fn push_routes_by_path() {
        let mut errors = FieldErrors::new();
        errors.push(Issue::field("count", IssueKind::Required));
        errors.push(Issue::root(IssueKind::UnrecognizedKeys(vec![
            "a".to_string(),
            "b".to_string(),
        ])));

        assert_eq!(errors.get("count"), Some(&["Required".to_string()][..]));
        assert_eq!(
            errors.form_errors,
            vec!["Unrecognized key(s) in object: 'a', 'b'"]
        );
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn messages_keep_order_per_field() {
        let errors: FieldErrors = vec![
            Issue::field("x", IssueKind::Required),
            Issue::field("x", IssueKind::NotInteger),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            errors.get("x").unwrap(),
            &["Required", "Expected integer, received float"]
        );
    }

    #[test]
    fn invalid_type_message() {
        let kind = IssueKind::InvalidType {
            expected: "string".to_string(),
            received: "number",
        };
        assert_eq!(kind.to_string(), "Expected string, received number");
    }

    #[test]
    fn display_lists_root_then_fields() {
        let mut errors = FieldErrors::new();
        errors.push(Issue::field("b", IssueKind::Required));
        errors.push(Issue::root(IssueKind::Decode("bad".to_string())));

        let output = errors.to_string();
        assert_eq!(output, "(root): Failed to decode: bad\nb: Required");
    }

    #[test]
    fn merge_appends() {
        let mut left: FieldErrors = std::iter::once(Issue::field("a", IssueKind::Required)).collect();
        let right: FieldErrors = std::iter::once(Issue::field("a", IssueKind::NotInteger)).collect();
        left.merge(right);
        assert_eq!(left.get("a").unwrap().len(), 2);
    }

    #[test]
    fn field_errors_serialize() {
        let errors: FieldErrors = std::iter::once(Issue::field("n", IssueKind::Required)).collect();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "form_errors": [], "field_errors": { "n": ["Required"] } })
        );
    }

    #[test]
    fn empty_field_name_is_not_form_level() {
        let errors: FieldErrors =
            std::iter::once(Issue::field("", IssueKind::Required)).collect();

        assert!(errors.form_errors.is_empty());
        assert_eq!(errors.get(""), Some(&["Required".to_string()][..]));
        assert!(!errors.issues()[0].is_root());
    }

    #[test]
    fn dotted_names_keep_their_segments() {
        let errors: FieldErrors = vec![
            Issue::field("a.b", IssueKind::Required),
            Issue::new(vec!["a".to_string(), "b".to_string()], IssueKind::NotInteger),
        ]
        .into_iter()
        .collect();

        assert_eq!(errors.get("a.b").unwrap().len(), 2);
        assert_eq!(errors.issues()[0].path, vec!["a.b"]);
        assert_eq!(errors.issues()[1].path, vec!["a", "b"]);
    }

    #[test]
    fn issue_display_names_its_path() {
        let nested = Issue::new(vec!["ids".to_string(), "1".to_string()], IssueKind::Required);
        assert_eq!(nested.to_string(), "ids.1: Required");
        assert_eq!(
            Issue::root(IssueKind::NotInteger).to_string(),
            "(root): Expected integer, received float"
        );
    }
}
