//! Error types for the Bridge library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`BridgeError`] enum below.
//!
//! # Examples
//!
//! ```
//! use bridge::error::{BridgeError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(BridgeError::schema("field 'title' already exists"))
//! }
//!
//! assert!(example_operation().is_err());
//! ```

use std::io;

use thiserror::Error;

use crate::DocId;
use crate::directory::DirectoryError;

/// The main error type for Bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// I/O errors surfaced by the operating system.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Binary encode/decode failures (short reads, unknown tags,
    /// lengths exceeding the available input).
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Schema construction or lookup errors.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A document referenced a field the schema does not know about,
    /// or vice versa.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Text analysis errors (invalid tokenizer patterns, etc.).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Directory-level failures.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A document id that no block of the store contains.
    #[error("Invalid doc id: {0}")]
    InvalidDocId(DocId),

    /// An operation was attempted on a store writer after `close()`.
    #[error("Store writer is closed")]
    WriterClosed,

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with [`BridgeError`].
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        BridgeError::Serialization(msg.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        BridgeError::Schema(msg.into())
    }

    /// Create a new schema-mismatch error.
    pub fn schema_mismatch<S: Into<String>>(msg: S) -> Self {
        BridgeError::SchemaMismatch(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        BridgeError::Analysis(msg.into())
    }
}
