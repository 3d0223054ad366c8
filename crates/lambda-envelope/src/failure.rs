//! Structured description of a validation failure.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// What went wrong at a single location in a payload.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The value has the wrong JSON type.
    TypeMismatch,
    /// A required property is absent.
    MissingRequiredField,
    /// A string does not match the required pattern.
    PatternMismatch,
    /// A string payload could not be decoded as JSON.
    InvalidJson,
    /// A change-log record carries neither an old nor a new image.
    MissingImage,
    /// Any other schema constraint (bounds, enums, formats, encodings).
    Constraint,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::TypeMismatch => "type_mismatch",
            IssueKind::MissingRequiredField => "missing_required_field",
            IssueKind::PatternMismatch => "pattern_mismatch",
            IssueKind::InvalidJson => "invalid_json",
            IssueKind::MissingImage => "missing_image",
            IssueKind::Constraint => "constraint",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// JSON pointer to the offending value (`""` is the payload root).
    pub path: String,
    /// The shape the schema required.
    pub expected: String,
    /// The shape that was actually found.
    pub actual: String,
}

impl Issue {
    pub fn new(
        kind: IssueKind,
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(
            f,
            "{} at `{}`: expected {}, found {}",
            self.kind, path, self.expected, self.actual
        )
    }
}

/// Why a payload did not satisfy its schema.
///
/// Always carries at least one [`Issue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{}", render_issues(.issues))]
pub struct ValidationFailure {
    issues: Vec<Issue>,
}

impl ValidationFailure {
    pub fn new(issue: Issue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    /// Builds a failure from collected issues, or `None` if there are none.
    pub fn from_issues(issues: Vec<Issue>) -> Option<Self> {
        if issues.is_empty() {
            None
        } else {
            Some(Self { issues })
        }
    }

    /// A string payload that is not valid JSON.
    pub fn invalid_json(err: &serde_json::Error) -> Self {
        Self::new(Issue::new(
            IssueKind::InvalidJson,
            "",
            "a JSON document",
            err.to_string(),
        ))
    }

    /// Kind of the first issue.
    pub fn kind(&self) -> IssueKind {
        self.issues[0].kind
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Paths of all issues, in the order they were reported.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().map(|issue| issue.path.as_str())
    }

    /// Prefixes every issue path, e.g. to locate an issue inside `/NewImage`.
    pub fn prefixed(mut self, prefix: &str) -> Self {
        for issue in &mut self.issues {
            issue.path = format!("{prefix}{}", issue.path);
        }
        self
    }

    /// Appends the issues of another failure.
    pub fn merge(mut self, other: ValidationFailure) -> Self {
        self.issues.extend(other.issues);
        self
    }
}

fn render_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Names the JSON type of a value for `expected`/`actual` descriptions.
pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
