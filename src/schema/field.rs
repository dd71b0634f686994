//! Fields: a field id paired with a typed value.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::codec::{BinaryCodec, BinaryReader, BinaryWriter};
use crate::error::{BridgeError, Result};

/// Identifier of a field within a schema, assigned in insertion order.
pub type FieldId = u8;

/// Wire tag for text values.
const TEXT_TAG: u8 = 0;
/// Wire tag for u32 values.
const U32_TAG: u8 = 1;

/// The value of a document field.
///
/// Serializes to JSON without an envelope: text as a string, numbers as
/// plain numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A UTF-8 text value.
    Text(String),
    /// An unsigned 32-bit value.
    U32(u32),
}

impl FieldValue {
    /// The text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::U32(_) => None,
        }
    }

    /// The numeric content, if this is a u32 value.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            FieldValue::U32(value) => Some(*value),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::U32(value)
    }
}

impl BinaryCodec for FieldValue {
    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        match self {
            FieldValue::Text(text) => {
                writer.write_u8(TEXT_TAG)?;
                writer.write_string(text)
            }
            FieldValue::U32(value) => {
                writer.write_u8(U32_TAG)?;
                writer.write_u32(*value)
            }
        }
    }

    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        match reader.read_u8()? {
            TEXT_TAG => Ok(FieldValue::Text(reader.read_string()?)),
            U32_TAG => Ok(FieldValue::U32(reader.read_u32()?)),
            tag => Err(BridgeError::serialization(format!(
                "unknown field value tag: {tag}"
            ))),
        }
    }
}

/// A field holds together a [`FieldId`] and its [`FieldValue`].
///
/// Equality, ordering, and hashing consider the id only.
#[derive(Debug, Clone)]
pub struct Field {
    id: FieldId,
    value: FieldValue,
}

impl Field {
    /// Create a field from any value convertible into a [`FieldValue`].
    pub fn new<V: Into<FieldValue>>(id: FieldId, value: V) -> Self {
        Field {
            id,
            value: value.into(),
        }
    }

    /// Create a text field.
    pub fn text<S: Into<String>>(id: FieldId, value: S) -> Self {
        Field::new(id, FieldValue::Text(value.into()))
    }

    /// Create a u32 field.
    pub fn u32(id: FieldId, value: u32) -> Self {
        Field::new(id, FieldValue::U32(value))
    }

    /// The field id.
    pub fn id(&self) -> FieldId {
        self.id
    }

    /// The field value.
    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Consume the field, returning its value.
    pub fn into_value(self) -> FieldValue {
        self.value
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Field) -> bool {
        self.id == other.id
    }
}

impl Eq for Field {}

impl PartialOrd for Field {
    fn partial_cmp(&self, other: &Field) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Field {
    fn cmp(&self, other: &Field) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl BinaryCodec for Field {
    // Wire layout: tag:u8 || field_id:u8 || value payload.
    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        match &self.value {
            FieldValue::Text(text) => {
                writer.write_u8(TEXT_TAG)?;
                writer.write_u8(self.id)?;
                writer.write_string(text)
            }
            FieldValue::U32(value) => {
                writer.write_u8(U32_TAG)?;
                writer.write_u8(self.id)?;
                writer.write_u32(*value)
            }
        }
    }

    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        let tag = reader.read_u8()?;
        let id = reader.read_u8()?;
        let value = match tag {
            TEXT_TAG => FieldValue::Text(reader.read_string()?),
            U32_TAG => FieldValue::U32(reader.read_u32()?),
            tag => {
                return Err(BridgeError::serialization(format!(
                    "unknown field tag: {tag}"
                )));
            }
        };
        Ok(Field { id, value })
    }
}
