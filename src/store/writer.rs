//! The store writer: packs documents into sealed, compressed blocks.

use std::collections::BTreeMap;

use crate::DocId;
use crate::codec::{BinaryCodec, BinaryWriter, marshall};
use crate::directory::WriteStream;
use crate::error::{BridgeError, Result};
use crate::schema::Field;
use crate::store::compression::{CompressionStrategy, Uncompressed};
use crate::store::{BLOCK_SIZE, MAX_DOC_ID, OffsetIndex};

/// Writes documents into a store file.
///
/// Documents are encoded into an in-memory block buffer; once the buffer
/// crosses [`BLOCK_SIZE`] the block is sealed: the per-document offset
/// table and its position are appended, the whole block is run through
/// the compression strategy, and the result is handed to the directory
/// writer as a length-prefixed byte string. `close()` seals the last
/// block and appends the outer offset index and the trailer; a writer
/// dropped without `close()` closes itself.
pub struct StoreWriter<W: WriteStream, C: CompressionStrategy = Uncompressed> {
    writer: W,
    compression: C,
    block_size: usize,
    doc_id: DocId,
    written: u64,
    offsets: Vec<OffsetIndex>,
    intermediary_buffer: Vec<u8>,
    current_block: Vec<u8>,
    current_block_offsets: BTreeMap<DocId, u32>,
    is_closed: bool,
}

impl<W: WriteStream> StoreWriter<W> {
    /// Create a store writer with the identity compression strategy.
    pub fn new(writer: W) -> StoreWriter<W> {
        StoreWriter::with_compression(writer, Uncompressed)
    }
}

impl<W: WriteStream, C: CompressionStrategy> StoreWriter<W, C> {
    /// Create a store writer with the given compression strategy.
    pub fn with_compression(writer: W, compression: C) -> StoreWriter<W, C> {
        StoreWriter {
            writer,
            compression,
            block_size: BLOCK_SIZE,
            doc_id: 0,
            written: 0,
            offsets: Vec::new(),
            intermediary_buffer: Vec::new(),
            current_block: Vec::new(),
            current_block_offsets: BTreeMap::new(),
            is_closed: false,
        }
    }

    /// Override the soft block-size threshold.
    pub fn with_block_size(mut self, block_size: usize) -> StoreWriter<W, C> {
        self.block_size = block_size;
        self
    }

    /// The id that the next document will be assigned.
    pub fn next_doc_id(&self) -> DocId {
        self.doc_id
    }

    /// Append a document, returning its assigned id.
    pub fn write(&mut self, fields: &[Field]) -> Result<DocId> {
        if self.is_closed {
            return Err(BridgeError::WriterClosed);
        }
        if self.doc_id >= MAX_DOC_ID {
            return Err(BridgeError::InvalidDocId(self.doc_id));
        }

        let offset = self.current_block.len() as u32;
        let mut block_writer = BinaryWriter::new(&mut self.current_block);
        block_writer.write_u64(fields.len() as u64)?;
        for field in fields {
            field.encode(&mut block_writer)?;
        }

        let doc_id = self.doc_id;
        self.current_block_offsets.insert(doc_id, offset);
        self.doc_id += 1;

        if self.current_block.len() > self.block_size {
            self.store()?;
        }
        Ok(doc_id)
    }

    /// Seal the current block: embed the intra-offset table, compress,
    /// and hand the result to the directory writer.
    fn store(&mut self) -> Result<()> {
        let block_payload_size = self.current_block.len() as u64;

        let mut block_writer = BinaryWriter::new(&mut self.current_block);
        self.current_block_offsets.encode(&mut block_writer)?;
        block_writer.write_u64(block_payload_size)?;

        self.intermediary_buffer = self.compression.encode(&self.current_block)?;

        let mut out = BinaryWriter::new(&mut self.writer);
        out.write_bytes(&self.intermediary_buffer)?;
        self.written += out.written();

        // the id recorded here is the one of the *next* document
        self.offsets.push(OffsetIndex::new(self.doc_id, self.written));

        self.current_block.clear();
        self.current_block_offsets.clear();
        Ok(())
    }

    /// Seal any partial block, append the outer offset index and the
    /// trailer, and flush the underlying writer.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed {
            return Err(BridgeError::WriterClosed);
        }
        if !self.current_block.is_empty() {
            self.store()?;
        }
        marshall(&mut self.writer, &self.offsets)?;
        marshall(&mut self.writer, &self.written)?;
        self.writer.flush()?;
        self.writer.close()?;
        self.is_closed = true;
        Ok(())
    }
}

impl<W: WriteStream, C: CompressionStrategy> Drop for StoreWriter<W, C> {
    fn drop(&mut self) {
        if !self.is_closed {
            let _ = self.close();
        }
    }
}
