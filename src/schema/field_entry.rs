//! Field entries: a field name paired with its typed options.

use serde::{Deserialize, Serialize};

use crate::schema::options::{NumericOptions, TextOptions};

/// The type of a schema field, wrapping the options that describe how the
/// field should be indexed and stored.
///
/// Serializes as `{"field": "text"|"numeric", "options": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "options", rename_all = "lowercase")]
pub enum FieldType {
    /// A UTF-8 text field.
    Text(TextOptions),
    /// An unsigned numeric field.
    Numeric(NumericOptions),
}

impl FieldType {
    /// True if this is a text field.
    pub fn is_text(&self) -> bool {
        matches!(self, FieldType::Text(_))
    }

    /// True if this is a numeric field.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Numeric(_))
    }

    /// True if the field participates in the inverted index.
    pub fn is_indexed(&self) -> bool {
        match self {
            FieldType::Text(options) => options.indexing().is_indexed(),
            FieldType::Numeric(options) => options.is_indexed(),
        }
    }

    /// True if the field value is persisted in the document store.
    pub fn is_stored(&self) -> bool {
        match self {
            FieldType::Text(options) => options.is_stored(),
            FieldType::Numeric(options) => options.is_stored(),
        }
    }
}

/// A field entry represents a field and its configuration; a schema is a
/// collection of field entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
}

impl FieldEntry {
    /// Create a text field entry.
    pub fn new_text<S: Into<String>>(name: S, options: TextOptions) -> Self {
        FieldEntry {
            name: name.into(),
            field_type: FieldType::Text(options),
        }
    }

    /// Create a numeric field entry.
    pub fn new_numeric<S: Into<String>>(name: S, options: NumericOptions) -> Self {
        FieldEntry {
            name: name.into(),
            field_type: FieldType::Numeric(options),
        }
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field type with its options.
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// True if the field participates in the inverted index.
    pub fn is_indexed(&self) -> bool {
        self.field_type.is_indexed()
    }

    /// True if the field value is persisted in the document store.
    pub fn is_stored(&self) -> bool {
        self.field_type.is_stored()
    }

    /// True if the field supports fast columnar access.
    pub fn is_numeric_fast(&self) -> bool {
        match &self.field_type {
            FieldType::Numeric(options) => options.is_fast(),
            FieldType::Text(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::options::{FAST, STORED, STRING, TEXT};

    #[test]
    fn test_field_type_queries() {
        let text = FieldType::Text(TEXT);
        assert!(text.is_text());
        assert!(!text.is_numeric());
        assert!(text.is_indexed());
        assert!(!text.is_stored());

        let numeric = FieldType::Numeric(FAST.stored());
        assert!(numeric.is_numeric());
        assert!(!numeric.is_indexed());
        assert!(numeric.is_stored());
    }

    #[test]
    fn test_field_entry_creation() {
        let entry = FieldEntry::new_text("title", STRING | STORED);
        assert_eq!(entry.name(), "title");
        assert!(entry.is_indexed());
        assert!(entry.is_stored());
        assert!(!entry.is_numeric_fast());

        let entry = FieldEntry::new_numeric("count", FAST);
        assert!(entry.is_numeric_fast());
        assert!(!entry.is_indexed());
    }

    #[test]
    fn test_field_entry_json() {
        let entry = FieldEntry::new_text("title", STRING);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "title",
                "type": {
                    "field": "text",
                    "options": {"indexing": "untokenized", "stored": false}
                }
            })
        );

        let decoded: FieldEntry = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, entry);
    }
}
