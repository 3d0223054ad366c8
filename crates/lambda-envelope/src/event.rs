//! Read-only view over a raw Lambda event.
//!
//! Envelope strategies walk the raw JSON through [`RawEvent`], whose
//! accessors fail with a [`MalformedEnvelopeError`] naming the key path that
//! was expected, rather than a generic key-not-found.

use crate::error::MalformedEnvelopeError;
use serde_json::{Map, Value};

/// A borrowed position inside a raw event, tracking its key path.
#[derive(Debug, Clone)]
pub struct RawEvent<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> RawEvent<'a> {
    /// Wraps the root of an event.
    pub fn new(value: &'a Value) -> Self {
        Self {
            value,
            path: String::new(),
        }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Key path of this position, e.g. `Records[0].dynamodb`.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn malformed(&self, key: &str, expected: &'static str) -> MalformedEnvelopeError {
        MalformedEnvelopeError::new(self.child_path(key), expected)
    }

    /// Returns the object at this position.
    pub fn as_object(&self) -> Result<&'a Map<String, Value>, MalformedEnvelopeError> {
        self.value
            .as_object()
            .ok_or_else(|| MalformedEnvelopeError::new(self.path.clone(), "a mapping"))
    }

    /// Returns the string at this position.
    pub fn as_str(&self) -> Result<&'a str, MalformedEnvelopeError> {
        self.value
            .as_str()
            .ok_or_else(|| MalformedEnvelopeError::new(self.path.clone(), "a string"))
    }

    /// Returns a required, non-null field.
    pub fn field(&self, key: &str) -> Result<RawEvent<'a>, MalformedEnvelopeError> {
        self.opt_field(key)
            .ok_or_else(|| self.malformed(key, "a value"))
    }

    /// Returns a field if it is present and not null.
    pub fn opt_field(&self, key: &str) -> Option<RawEvent<'a>> {
        match self.value.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(RawEvent {
                value,
                path: self.child_path(key),
            }),
        }
    }

    /// Returns a required string field.
    pub fn str_field(&self, key: &str) -> Result<&'a str, MalformedEnvelopeError> {
        self.value
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| self.malformed(key, "a string"))
    }

    /// Returns an optional string field.
    pub fn opt_str_field(&self, key: &str) -> Option<&'a str> {
        self.value.get(key).and_then(Value::as_str)
    }

    /// Returns a required mapping field.
    pub fn object_field(&self, key: &str) -> Result<RawEvent<'a>, MalformedEnvelopeError> {
        match self.value.get(key) {
            Some(value @ Value::Object(_)) => Ok(RawEvent {
                value,
                path: self.child_path(key),
            }),
            _ => Err(self.malformed(key, "a mapping")),
        }
    }

    /// Returns the elements of a required sequence field, each carrying its
    /// indexed path (`Records[3]`).
    pub fn array_field(&self, key: &str) -> Result<Vec<RawEvent<'a>>, MalformedEnvelopeError> {
        let items = self
            .value
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| self.malformed(key, "a sequence"))?;

        let base = self.child_path(key);
        Ok(items
            .iter()
            .enumerate()
            .map(|(index, value)| RawEvent {
                value,
                path: format!("{base}[{index}]"),
            })
            .collect())
    }

    /// Shorthand for the `Records` sequence most batch sources use.
    pub fn records(&self) -> Result<Vec<RawEvent<'a>>, MalformedEnvelopeError> {
        self.array_field("Records")
    }
}
