//! The document store: schema-typed documents packed into compressed,
//! addressable blocks.
//!
//! [`StoreWriter`] appends documents into block buffers and seals each
//! block once it crosses [`BLOCK_SIZE`]; [`StoreReader`] parses the
//! trailing offset index and fetches any document by id, keeping the last
//! decoded block cached.

pub mod compression;
pub mod reader;
pub mod writer;

use std::io::{Read, Write};

use crate::DocId;
use crate::codec::{BinaryCodec, BinaryReader, BinaryWriter};
use crate::error::Result;

pub use compression::{CompressionStrategy, Lz4Compression, Uncompressed};
pub use reader::StoreReader;
pub use writer::StoreWriter;

/// Soft threshold for the uncompressed size of a block buffer. A block is
/// sealed by the write that pushes it past this size.
pub const BLOCK_SIZE: usize = 16_384;

/// One past the largest assignable document id.
pub const MAX_DOC_ID: DocId = 1 << 31;

/// One entry of the outer offset index.
///
/// As written, `offset` is the cumulative number of payload bytes after
/// emitting the block, and `doc_id` is the id of the *next* document; the
/// reader shift-normalizes the list so each entry carries the starting
/// offset of its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetIndex {
    doc_id: DocId,
    offset: u64,
}

impl OffsetIndex {
    /// Create a new offset-index entry.
    pub fn new(doc_id: DocId, offset: u64) -> Self {
        OffsetIndex { doc_id, offset }
    }

    /// The document id recorded for the block.
    pub fn doc_id(&self) -> DocId {
        self.doc_id
    }

    /// The byte offset recorded for the block.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl BinaryCodec for OffsetIndex {
    fn encode<W: Write>(&self, writer: &mut BinaryWriter<W>) -> Result<()> {
        writer.write_u32(self.doc_id)?;
        writer.write_u64(self.offset)
    }

    fn decode<R: Read>(reader: &mut BinaryReader<R>) -> Result<Self> {
        let doc_id = reader.read_u32()?;
        let offset = reader.read_u64()?;
        Ok(OffsetIndex { doc_id, offset })
    }
}
