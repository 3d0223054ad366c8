//! Decoding of DynamoDB attribute-tagged values into plain JSON.
//!
//! Stream images carry every attribute as a single-key mapping naming its
//! type, e.g. `{"S": "text"}` or `{"N": "123"}`. Schemas are written against
//! the plain shape, so images are decoded before validation:
//!
//! | Tag    | Decoded as                         |
//! |--------|------------------------------------|
//! | `S`    | string                             |
//! | `N`    | number, digits kept exactly        |
//! | `B`    | base64 string, unchanged           |
//! | `BOOL` | boolean                            |
//! | `NULL` | null                               |
//! | `M`    | object, decoded recursively        |
//! | `L`    | array, decoded recursively         |
//! | `SS`   | array of strings                   |
//! | `NS`   | array of numbers                   |
//! | `BS`   | array of base64 strings            |

use crate::failure::{Issue, IssueKind, ValidationFailure, describe};
use serde_json::{Map, Number, Value};
use std::str::FromStr;

/// Decodes an item image (attribute name to tagged value).
///
/// Issue paths are JSON pointers relative to the image.
pub fn decode_image(image: &Map<String, Value>) -> Result<Value, ValidationFailure> {
    let mut decoded = Map::with_capacity(image.len());
    for (name, tagged) in image {
        decoded.insert(name.clone(), decode_attribute(tagged, &pointer("", name))?);
    }
    Ok(Value::Object(decoded))
}

/// Decodes a single tagged attribute value located at `path`.
pub fn decode_attribute(tagged: &Value, path: &str) -> Result<Value, ValidationFailure> {
    let Some((tag, inner)) = tagged
        .as_object()
        .filter(|map| map.len() == 1)
        .and_then(|map| map.iter().next())
    else {
        return Err(mismatch(path, "a single-key attribute value", describe(tagged)));
    };

    match tag.as_str() {
        "S" | "B" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| mismatch(path, "string", describe(inner))),
        "N" => {
            let raw = inner
                .as_str()
                .ok_or_else(|| mismatch(path, "numeric string", describe(inner)))?;
            parse_number(raw, path)
        }
        "BOOL" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| mismatch(path, "boolean", describe(inner))),
        "NULL" => Ok(Value::Null),
        "M" => {
            let map = inner
                .as_object()
                .ok_or_else(|| mismatch(path, "object", describe(inner)))?;
            let mut decoded = Map::with_capacity(map.len());
            for (name, value) in map {
                decoded.insert(name.clone(), decode_attribute(value, &pointer(path, name))?);
            }
            Ok(Value::Object(decoded))
        }
        "L" => {
            let items = inner
                .as_array()
                .ok_or_else(|| mismatch(path, "array", describe(inner)))?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_attribute(item, &pointer(path, &i.to_string())))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "SS" | "BS" => string_set(inner, path).map(|items| {
            Value::Array(items.into_iter().map(|s| Value::String(s.to_string())).collect())
        }),
        "NS" => string_set(inner, path)?
            .into_iter()
            .enumerate()
            .map(|(i, raw)| parse_number(raw, &pointer(path, &i.to_string())))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Err(ValidationFailure::new(Issue::new(
            IssueKind::Constraint,
            path,
            "a DynamoDB attribute type",
            format!("unknown tag `{other}`"),
        ))),
    }
}

fn string_set<'v>(inner: &'v Value, path: &str) -> Result<Vec<&'v str>, ValidationFailure> {
    let items = inner
        .as_array()
        .ok_or_else(|| mismatch(path, "array of strings", describe(inner)))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .ok_or_else(|| mismatch(&pointer(path, &i.to_string()), "string", describe(item)))
        })
        .collect()
}

fn parse_number(raw: &str, path: &str) -> Result<Value, ValidationFailure> {
    Number::from_str(raw.trim())
        .map(Value::Number)
        .map_err(|_| {
            ValidationFailure::new(Issue::new(
                IssueKind::Constraint,
                path,
                "a numeric string",
                format!("`{raw}`"),
            ))
        })
}

fn mismatch(path: &str, expected: &str, actual: &str) -> ValidationFailure {
    ValidationFailure::new(Issue::new(IssueKind::TypeMismatch, path, expected, actual))
}

/// Appends a JSON pointer segment, escaping `~` and `/`.
fn pointer(base: &str, segment: &str) -> String {
    format!("{base}/{}", segment.replace('~', "~0").replace('/', "~1"))
}
