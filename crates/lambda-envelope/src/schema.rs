//! Schema validators.
//!
//! A [`Schema`] turns an unwrapped payload into a validated value or a
//! [`ValidationFailure`]. Mappings and strings are separate entry points:
//! a string payload is decoded as JSON first, and a decode error is reported
//! as [`IssueKind::InvalidJson`] rather than as a type mismatch.
//!
//! Validators hold no mutable state. A compiled [`JsonSchema`] is read-only
//! and can be shared across invocations and threads.

use crate::envelope::Payload;
use crate::error::SchemaError;
use crate::failure::{Issue, IssueKind, ValidationFailure, describe};
use jsonschema::error::ValidationErrorKind;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Validates a payload and produces a typed result.
pub trait Schema: Send + Sync {
    /// The validated representation handed to the handler.
    type Output;

    /// Validates an already-deserialized payload.
    fn validate(&self, value: &Value) -> Result<Self::Output, ValidationFailure>;

    /// Decodes a JSON string, then validates it.
    fn validate_str(&self, text: &str) -> Result<Self::Output, ValidationFailure> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ValidationFailure::invalid_json(&e))?;
        self.validate(&value)
    }

    /// Dispatches on the payload representation.
    fn validate_payload(&self, payload: &Payload) -> Result<Self::Output, ValidationFailure> {
        match payload {
            Payload::Json(value) => self.validate(value),
            Payload::Text(text) => self.validate_str(text),
        }
    }
}

impl<S: Schema + ?Sized> Schema for &S {
    type Output = S::Output;

    fn validate(&self, value: &Value) -> Result<Self::Output, ValidationFailure> {
        (**self).validate(value)
    }

    fn validate_str(&self, text: &str) -> Result<Self::Output, ValidationFailure> {
        (**self).validate_str(text)
    }
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
    type Output = S::Output;

    fn validate(&self, value: &Value) -> Result<Self::Output, ValidationFailure> {
        (**self).validate(value)
    }

    fn validate_str(&self, text: &str) -> Result<Self::Output, ValidationFailure> {
        (**self).validate_str(text)
    }
}

/// The identity schema: every payload is accepted unchanged.
///
/// String payloads stay strings; they are not decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Passthrough;

impl Schema for Passthrough {
    type Output = Value;

    fn validate(&self, value: &Value) -> Result<Value, ValidationFailure> {
        Ok(value.clone())
    }

    fn validate_str(&self, text: &str) -> Result<Value, ValidationFailure> {
        Ok(Value::String(text.to_string()))
    }
}

/// A JSON Schema document, compiled once.
///
/// Every violation is reported, not just the first. `format` keywords are
/// asserted, not treated as annotations, so `{"format": "email"}` rejects a
/// string that is not an address.
#[derive(Clone)]
pub struct JsonSchema {
    document: Arc<Value>,
    validator: Arc<jsonschema::Validator>,
}

impl JsonSchema {
    /// Compiles a schema document.
    pub fn new(document: &Value) -> Result<Self, SchemaError> {
        Self::with_formats(document, std::iter::empty::<(String, fn(&str) -> bool)>())
    }

    /// Compiles a schema document with additional named formats.
    ///
    /// Each checker receives the string instance and returns whether it is
    /// in that format. A name that is also a built-in format replaces it.
    ///
    /// ```
    /// use lambda_envelope::{JsonSchema, Schema};
    /// use serde_json::json;
    ///
    /// let schema = JsonSchema::with_formats(
    ///     &json!({"type": "string", "format": "order-id"}),
    ///     [("order-id", |s: &str| s.starts_with("ord_"))],
    /// )?;
    /// assert!(schema.validate(&json!("ord_42")).is_ok());
    /// assert!(schema.validate(&json!("42")).is_err());
    /// # Ok::<(), lambda_envelope::SchemaError>(())
    /// ```
    pub fn with_formats<I, N, F>(document: &Value, formats: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (N, F)>,
        N: Into<String>,
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let mut base = jsonschema::options();
        let options = formats.into_iter().fold(
            base.should_validate_formats(true),
            |options, (name, check)| options.with_format(name, check),
        );
        let validator = options
            .build(document)
            .map_err(|e| SchemaError::Invalid(e.to_string()))?;

        Ok(Self {
            document: Arc::new(document.clone()),
            validator: Arc::new(validator),
        })
    }

    /// Loads and compiles a schema file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value = serde_json::from_str(&text).map_err(|source| SchemaError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "compiled schema file");
        Self::new(&document)
    }

    /// Returns the schema document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Returns true if the value satisfies the schema.
    pub fn is_valid(&self, value: &Value) -> bool {
        self.validator.is_valid(value)
    }
}

impl FromStr for JsonSchema {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let document: Value =
            serde_json::from_str(s).map_err(|e| SchemaError::Invalid(e.to_string()))?;
        Self::new(&document)
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl Schema for JsonSchema {
    type Output = Value;

    fn validate(&self, value: &Value) -> Result<Value, ValidationFailure> {
        let issues: Vec<Issue> = self
            .validator
            .iter_errors(value)
            .map(|error| schema_issue(&error))
            .collect();

        match ValidationFailure::from_issues(issues) {
            Some(failure) => Err(failure),
            None => Ok(value.clone()),
        }
    }
}

fn schema_issue(error: &jsonschema::ValidationError<'_>) -> Issue {
    let path = error.instance_path.to_string();
    let actual = describe(&error.instance);

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property.as_str().map_or_else(|| property.to_string(), str::to_string);
            let escaped = name.replace('~', "~0").replace('/', "~1");
            Issue::new(
                IssueKind::MissingRequiredField,
                format!("{path}/{escaped}"),
                format!("required property `{name}`"),
                "absent",
            )
        }
        ValidationErrorKind::Type { .. } => {
            Issue::new(IssueKind::TypeMismatch, path, error.to_string(), actual)
        }
        ValidationErrorKind::Pattern { pattern } => Issue::new(
            IssueKind::PatternMismatch,
            path,
            format!("a string matching `{pattern}`"),
            error.instance.to_string(),
        ),
        ValidationErrorKind::Format { format } => Issue::new(
            IssueKind::PatternMismatch,
            path,
            format!("a string in `{format}` format"),
            error.instance.to_string(),
        ),
        _ => Issue::new(IssueKind::Constraint, path, error.to_string(), actual),
    }
}

/// A typed model deserialized with serde.
///
/// Missing fields and type errors are reported as
/// [`IssueKind::MissingRequiredField`] and [`IssueKind::TypeMismatch`];
/// anything else a `Deserialize` impl rejects is a
/// [`IssueKind::Constraint`].
pub struct Model<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Model<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Model<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Model<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Model<T> {}

impl<T> fmt::Debug for Model<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Model<{}>", std::any::type_name::<T>())
    }
}

impl<T: DeserializeOwned> Schema for Model<T> {
    type Output = T;

    fn validate(&self, value: &Value) -> Result<T, ValidationFailure> {
        T::deserialize(value).map_err(|e| ValidationFailure::new(serde_issue(&e, value)))
    }
}

// serde only reports messages, so the issue kind is recovered from the
// standard wording used by serde's derive.
fn serde_issue(err: &serde_json::Error, value: &Value) -> Issue {
    let message = err.to_string();

    if let Some(rest) = message.strip_prefix("missing field `")
        && let Some(field) = rest.split('`').next()
    {
        let path = match value.as_object() {
            Some(map) if !map.contains_key(field) => format!("/{field}"),
            _ => String::new(),
        };
        return Issue::new(
            IssueKind::MissingRequiredField,
            path,
            format!("required field `{field}`"),
            "absent",
        );
    }

    if let Some(rest) = message.strip_prefix("invalid type: ")
        && let Some((actual, expected)) = rest.split_once(", expected ")
    {
        return Issue::new(IssueKind::TypeMismatch, "", expected, actual);
    }

    Issue::new(IssueKind::Constraint, "", message, describe(value))
}

/// JSON Schema validation followed by typed deserialization.
pub struct Validated<T> {
    schema: JsonSchema,
    model: Model<T>,
}

impl<T> Validated<T> {
    pub fn new(schema: JsonSchema) -> Self {
        Self {
            schema,
            model: Model::new(),
        }
    }
}

impl<T> Clone for Validated<T> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            model: self.model,
        }
    }
}

impl<T> fmt::Debug for Validated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validated")
            .field("schema", &self.schema)
            .field("model", &self.model)
            .finish()
    }
}

impl<T: DeserializeOwned> Schema for Validated<T> {
    type Output = T;

    fn validate(&self, value: &Value) -> Result<T, ValidationFailure> {
        let value = self.schema.validate(value)?;
        self.model.validate(&value)
    }
}

/// A schema selected at runtime, as loaded from configuration.
#[derive(Debug, Clone, Default)]
pub enum ConfiguredSchema {
    #[default]
    Passthrough,
    Json(JsonSchema),
}

impl ConfiguredSchema {
    /// Loads the schema file if one is configured.
    pub fn load(path: Option<&Path>) -> Result<Self, SchemaError> {
        match path {
            Some(path) => JsonSchema::from_path(path).map(ConfiguredSchema::Json),
            None => Ok(ConfiguredSchema::Passthrough),
        }
    }
}

impl From<JsonSchema> for ConfiguredSchema {
    fn from(schema: JsonSchema) -> Self {
        ConfiguredSchema::Json(schema)
    }
}

impl Schema for ConfiguredSchema {
    type Output = Value;

    fn validate(&self, value: &Value) -> Result<Value, ValidationFailure> {
        match self {
            ConfiguredSchema::Passthrough => Passthrough.validate(value),
            ConfiguredSchema::Json(schema) => schema.validate(value),
        }
    }

    fn validate_str(&self, text: &str) -> Result<Value, ValidationFailure> {
        match self {
            ConfiguredSchema::Passthrough => Passthrough.validate_str(text),
            ConfiguredSchema::Json(schema) => schema.validate_str(text),
        }
    }
}
