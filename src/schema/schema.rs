//! The schema: an immutable, ordered catalog of field entries.

use std::collections::HashMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BridgeError, Result};
use crate::schema::document::Document;
use crate::schema::field::{Field, FieldId};
use crate::schema::field_entry::FieldEntry;
use crate::schema::named_document::NamedFieldDocument;
use crate::schema::options::{NumericOptions, TextOptions};

/// A schema defines the structure of documents in an index: which fields
/// exist, how they are indexed, and how they are stored.
///
/// Like Tantivy, the schema is strict: every field must be declared up
/// front, and the schema is immutable once built.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Field entries, ordered by field id.
    field_entries: Vec<FieldEntry>,
    /// Map of field names to their ids.
    field_ids: HashMap<String, FieldId>,
}

impl Schema {
    fn from_entries(field_entries: Vec<FieldEntry>) -> Result<Self> {
        let mut builder = SchemaBuilder::new();
        for entry in field_entries {
            builder.add_field(entry)?;
        }
        Ok(builder.build())
    }

    /// Get a field entry given its id.
    pub fn field_entry(&self, field_id: FieldId) -> Option<&FieldEntry> {
        self.field_entries.get(field_id as usize)
    }

    /// Get a field name given its id.
    pub fn field_name(&self, field_id: FieldId) -> Option<&str> {
        self.field_entry(field_id).map(FieldEntry::name)
    }

    /// Get the id associated with a field name.
    pub fn field_id(&self, field_name: &str) -> Option<FieldId> {
        self.field_ids.get(field_name).copied()
    }

    /// All field entries, in id order.
    pub fn fields(&self) -> &[FieldEntry] {
        &self.field_entries
    }

    /// The number of fields.
    pub fn len(&self) -> usize {
        self.field_entries.len()
    }

    /// True if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.field_entries.is_empty()
    }

    /// Serialize the schema to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a schema from a JSON string.
    pub fn from_json(json: &str) -> Result<Schema> {
        Ok(serde_json::from_str(json)?)
    }

    /// Group a document's values under their field names.
    ///
    /// Fails with a schema mismatch if the document references an id this
    /// schema does not define.
    pub fn to_named_doc(&self, doc: &Document) -> Result<NamedFieldDocument> {
        let mut named = NamedFieldDocument::new();
        for field in doc.fields() {
            let name = self.field_name(field.id()).ok_or_else(|| {
                BridgeError::schema_mismatch(format!(
                    "document references unknown field id {}",
                    field.id()
                ))
            })?;
            named.push(name, field.value().clone());
        }
        Ok(named)
    }

    /// Rebuild a document from a named-field document.
    ///
    /// Fails with a schema mismatch on unknown field names. Fields are
    /// emitted grouped by name, in name order.
    pub fn from_named_doc(&self, named: &NamedFieldDocument) -> Result<Document> {
        let mut doc = Document::new();
        for (name, values) in &named.fields_by_name {
            let field_id = self.field_id(name).ok_or_else(|| {
                BridgeError::schema_mismatch(format!("unknown field name '{name}'"))
            })?;
            for value in values {
                doc.add(Field::new(field_id, value.clone()));
            }
        }
        Ok(doc)
    }

    /// Serialize a document to its named-field JSON form.
    pub fn doc_to_json(&self, doc: &Document) -> Result<String> {
        self.to_named_doc(doc)?.to_json()
    }

    /// Deserialize a document from its named-field JSON form.
    pub fn doc_from_json(&self, json: &str) -> Result<Document> {
        self.from_named_doc(&NamedFieldDocument::from_json(json)?)
    }

    /// Create a builder for constructing schemas.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Schema) -> bool {
        self.field_entries == other.field_entries
    }
}

impl Eq for Schema {}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Schema", 1)?;
        state.serialize_field("fields", &self.field_entries)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct SchemaJson {
            fields: Vec<FieldEntry>,
        }

        let json = SchemaJson::deserialize(deserializer)?;
        Schema::from_entries(json.fields).map_err(serde::de::Error::custom)
    }
}

/// A builder that assigns field ids in insertion order, starting at 0.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    field_entries: Vec<FieldEntry>,
    field_ids: HashMap<String, FieldId>,
}

impl SchemaBuilder {
    /// Create a new schema builder.
    pub fn new() -> Self {
        SchemaBuilder::default()
    }

    /// Add a text field, returning its assigned id.
    pub fn add_text_field<S: Into<String>>(
        &mut self,
        name: S,
        options: TextOptions,
    ) -> Result<FieldId> {
        self.add_field(FieldEntry::new_text(name, options))
    }

    /// Add a numeric field, returning its assigned id.
    pub fn add_numeric_field<S: Into<String>>(
        &mut self,
        name: S,
        options: NumericOptions,
    ) -> Result<FieldId> {
        self.add_field(FieldEntry::new_numeric(name, options))
    }

    /// Add a field entry, returning its assigned id.
    pub fn add_field(&mut self, entry: FieldEntry) -> Result<FieldId> {
        if entry.name().is_empty() {
            return Err(BridgeError::schema("field name cannot be empty"));
        }
        if self.field_ids.contains_key(entry.name()) {
            return Err(BridgeError::schema(format!(
                "field '{}' already exists",
                entry.name()
            )));
        }
        if self.field_entries.len() > FieldId::MAX as usize {
            return Err(BridgeError::schema("field id space exhausted"));
        }

        let field_id = self.field_entries.len() as FieldId;
        self.field_ids.insert(entry.name().to_string(), field_id);
        self.field_entries.push(entry);
        Ok(field_id)
    }

    /// Build the final schema.
    pub fn build(self) -> Schema {
        Schema {
            field_entries: self.field_entries,
            field_ids: self.field_ids,
        }
    }
}
