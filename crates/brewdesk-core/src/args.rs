// ── Operation arguments ──
//
// Arguments are a flat JSON object. Their canonical serialization (keys
// sorted at every depth) is half of a cache key, so two calls with the same
// arguments in a different order share one entry.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Arguments for one operation invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(Map<String, Value>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical JSON: object keys sorted recursively.
    pub fn canonical(&self) -> String {
        canonical_value(&Value::Object(self.0.clone())).to_string()
    }

    // ── Extraction helpers for resource definitions ─────────────────

    /// A scalar argument rendered as a string (strings, numbers, bools).
    pub fn string(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// A required identifier that will be embedded in a URL path.
    pub fn path_segment(&self, operation: &str, key: &str) -> Result<String, CoreError> {
        let value = self
            .string(key)
            .ok_or_else(|| CoreError::invalid_args(operation, format!("missing '{key}'")))?;

        if value.is_empty() {
            return Err(CoreError::invalid_args(operation, format!("'{key}' is empty")));
        }
        if value
            .chars()
            .any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace())
        {
            return Err(CoreError::invalid_args(
                operation,
                format!("'{key}' is not a valid path segment: {value:?}"),
            ));
        }
        Ok(value)
    }

    /// Every argument except `exclude`, as a JSON object body.
    pub fn body_without(&self, exclude: &[&str]) -> Value {
        Value::Object(
            self.0
                .iter()
                .filter(|(k, _)| !exclude.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Fail if `operation` got none of the fields it needs in its body.
    pub fn require_any(&self, operation: &str, keys: &[&str]) -> Result<(), CoreError> {
        if keys.iter().any(|k| self.0.contains_key(*k)) {
            Ok(())
        } else {
            Err(CoreError::invalid_args(
                operation,
                format!("expected at least one of: {}", keys.join(", ")),
            ))
        }
    }
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl TryFrom<Value> for Args {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(CoreError::invalid_args(
                "(arguments)",
                format!("expected a JSON object, got {other}"),
            )),
        }
    }
}

impl From<Map<String, Value>> for Args {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn canonical_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<&String, Value> =
                map.iter().map(|(k, v)| (k, canonical_value(v))).collect();
            Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_value).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn canonical_form_ignores_insertion_order() {
        let a = Args::new().with("page", 1).with("search", "ana");
        let b = Args::new().with("search", "ana").with("page", 1);
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a.canonical(), r#"{"page":1,"search":"ana"}"#);
    }

    #[test]
    fn path_segment_validation() {
        let args = Args::new().with("id", 42).with("slug", "a/b").with("blank", "");
        assert_eq!(args.path_segment("users.get", "id").unwrap(), "42");
        assert!(matches!(
            args.path_segment("users.get", "slug"),
            Err(CoreError::InvalidArguments { .. })
        ));
        assert!(args.path_segment("users.get", "blank").is_err());
        assert!(args.path_segment("users.get", "missing").is_err());
    }

    #[test]
    fn body_without_drops_path_fields() {
        let args = Args::new().with("id", "7").with("name", "Espresso Lab");
        assert_eq!(args.body_without(&["id"]), json!({ "name": "Espresso Lab" }));
    }

    #[test]
    fn try_from_value() {
        assert!(Args::try_from(json!({ "page": 2 })).is_ok());
        assert!(Args::try_from(Value::Null).unwrap().is_empty());
        assert!(Args::try_from(json!([1, 2])).is_err());
    }
}
