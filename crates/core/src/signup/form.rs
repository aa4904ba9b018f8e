//! Accumulated wizard answers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::fields;

/// Field-name to value mapping accumulated across wizard steps.
///
/// Values are arbitrary JSON so each step view can contribute its own shape
/// (strings, booleans, arrays of item ids). Key order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(Map<String, Value>);

impl FormData {
    /// Create empty form data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow-merge `partial` into this form: new keys are added and
    /// existing keys are overwritten. Nested objects are replaced, not merged.
    pub fn merge(&mut self, partial: Self) {
        self.0.extend(partial.0);
    }

    /// Set a single field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Get a raw field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a field as a string slice if it is a JSON string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Get a field as a bool if it is a JSON boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Whether a field is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The trimmed email field, if present and non-empty.
    ///
    /// Drafts are keyed by this value; nothing is persisted without it.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.get_str(fields::EMAIL)
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no fields have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over field names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<Map<String, Value>> for FormData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for FormData {
    type Error = Value;

    /// Accepts only JSON objects; anything else is handed back unchanged.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FormData {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_merge_adds_and_overwrites() {
        let mut form: FormData = [("paymentOption", "oneTime"), ("name", "J")]
            .into_iter()
            .collect();
        let partial: FormData = [("paymentOption", "installment"), ("city", "Newark")]
            .into_iter()
            .collect();

        form.merge(partial);

        assert_eq!(form.get_str("paymentOption"), Some("installment"));
        assert_eq!(form.get_str("name"), Some("J"));
        assert_eq!(form.get_str("city"), Some("Newark"));
        assert_eq!(form.len(), 3);
    }

    #[test]
    fn test_merge_replaces_nested_values() {
        let mut form = FormData::new();
        form.insert("merchandise", json!(["tshirt", "hat"]));
        form.merge([("merchandise", json!(["vinyl"]))].into_iter().collect());
        assert_eq!(form.get("merchandise"), Some(&json!(["vinyl"])));
    }

    #[test]
    fn test_email_requires_non_blank() {
        let mut form = FormData::new();
        assert_eq!(form.email(), None);

        form.insert("email", "   ");
        assert_eq!(form.email(), None);

        form.insert("email", " a@b.com ");
        assert_eq!(form.email(), Some("a@b.com"));
    }

    #[test]
    fn test_try_from_rejects_non_objects() {
        assert!(FormData::try_from(json!([1, 2])).is_err());
        assert!(FormData::try_from(json!({"name": "A"})).is_ok());
    }
}
