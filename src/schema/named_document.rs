//! Documents keyed by field name, for JSON interchange.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::field::FieldValue;

/// A document whose values are grouped under their field names.
///
/// Serializes to JSON with no envelope: a plain object mapping each field
/// name to an array of scalar values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamedFieldDocument {
    /// Values grouped by field name.
    pub fields_by_name: BTreeMap<String, Vec<FieldValue>>,
}

impl NamedFieldDocument {
    /// Create an empty named-field document.
    pub fn new() -> Self {
        NamedFieldDocument::default()
    }

    /// Append a value under the given field name.
    pub fn push<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.fields_by_name.entry(name.into()).or_default().push(value);
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let mut doc = NamedFieldDocument::new();
        doc.push("title", FieldValue::Text("Hello".to_string()));
        doc.push("count", FieldValue::U32(42));
        doc.push("count", FieldValue::U32(43));

        let json = doc.to_json().unwrap();
        assert_eq!(json, r#"{"count":[42,43],"title":["Hello"]}"#);

        let decoded = NamedFieldDocument::from_json(&json).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_empty_document() {
        let doc = NamedFieldDocument::new();
        assert_eq!(doc.to_json().unwrap(), "{}");
        assert_eq!(NamedFieldDocument::from_json("{}").unwrap(), doc);
    }
}
