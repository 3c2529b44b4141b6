//! Record snapshot - canonical flat view of a study record
//!
//! Record APIs sometimes return a single object and sometimes a list of
//! objects for the same record. Both shapes are normalized here, before any
//! workflow step sees the data.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};

/// Flat field → string mapping for one record
///
/// Missing fields read as the empty string, matching how record exports
/// represent blank fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSnapshot {
    fields: BTreeMap<String, String>,
}

impl RecordSnapshot {
    /// Build a snapshot from explicit field pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Normalize a raw JSON payload (object, or list whose first entry is used)
    pub fn from_json(payload: &Value) -> CoreResult<Self> {
        let object = match payload {
            Value::Object(map) => map,
            Value::Array(items) => {
                if items.len() > 1 {
                    tracing::warn!(
                        entries = items.len(),
                        "Record payload has multiple entries; using the first"
                    );
                }
                match items.first() {
                    Some(Value::Object(map)) => map,
                    Some(other) => {
                        return Err(CoreError::InvalidRecordShape(json_kind(other).to_string()))
                    }
                    None => return Err(CoreError::EmptyRecord),
                }
            }
            other => return Err(CoreError::InvalidRecordShape(json_kind(other).to_string())),
        };

        let fields = object
            .iter()
            .map(|(k, v)| (k.clone(), scalar_to_string(v)))
            .collect();

        Ok(Self { fields })
    }

    /// Field value, or "" if absent
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    /// Whether the field is present and non-empty
    pub fn has(&self, name: &str) -> bool {
        !self.field(name).is_empty()
    }

    /// Set a field value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_from_object() {
        let snapshot = RecordSnapshot::from_json(&json!({
            "record_id": "12",
            "mrn": "123",
            "other_enrollment": 1,
            "withdrawal_date": null
        }))
        .unwrap();

        assert_eq!(snapshot.field("mrn"), "123");
        assert_eq!(snapshot.field("other_enrollment"), "1");
        assert_eq!(snapshot.field("withdrawal_date"), "");
        assert!(!snapshot.has("withdrawal_date"));
        assert_eq!(snapshot.field("missing"), "");
    }

    #[test]
    fn test_snapshot_from_list_uses_first_entry() {
        let snapshot = RecordSnapshot::from_json(&json!([
            {"record_id": "12", "mrn": "first"},
            {"record_id": "12", "mrn": "second"}
        ]))
        .unwrap();

        assert_eq!(snapshot.field("mrn"), "first");
    }

    #[test]
    fn test_snapshot_rejects_bad_shapes() {
        assert_eq!(
            RecordSnapshot::from_json(&json!([])).unwrap_err(),
            CoreError::EmptyRecord
        );
        assert!(matches!(
            RecordSnapshot::from_json(&json!("nope")).unwrap_err(),
            CoreError::InvalidRecordShape(kind) if kind == "string"
        ));
        assert!(matches!(
            RecordSnapshot::from_json(&json!([1, 2])).unwrap_err(),
            CoreError::InvalidRecordShape(kind) if kind == "number"
        ));
    }

    #[test]
    fn test_empty_field_not_present() {
        let mut snapshot = RecordSnapshot::from_pairs([("mrn", "")]);
        assert!(!snapshot.has("mrn"));

        snapshot.set("mrn", "123");
        assert!(snapshot.has("mrn"));
        assert_eq!(snapshot.len(), 1);
    }
}
