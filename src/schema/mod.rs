//! Schema management for document structure definition.

pub mod document;
pub mod field;
pub mod field_entry;
pub mod named_document;
pub mod options;
pub mod schema;
pub mod term;

pub use document::Document;
pub use field::{Field, FieldId, FieldValue};
pub use field_entry::{FieldEntry, FieldType};
pub use named_document::NamedFieldDocument;
pub use options::{
    FAST, NUMERIC, NumericOptions, STORED, STRING, TEXT, TextIndexing, TextOptions,
};
pub use schema::{Schema, SchemaBuilder};
pub use term::Term;
