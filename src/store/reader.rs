//! The store reader: locates, decompresses, and decodes stored documents.

use std::collections::BTreeMap;

use crate::DocId;
use crate::codec::{BinaryCodec, BinaryReader, unmarshall};
use crate::directory::ReadOnlySource;
use crate::error::{BridgeError, Result};
use crate::schema::{Document, Field};
use crate::store::compression::{CompressionStrategy, Uncompressed};
use crate::store::OffsetIndex;

/// Reads documents back from a closed store file.
///
/// Construction parses the trailer and shift-normalizes the outer offset
/// index; each lookup binary-searches the index for the owning block and
/// decodes it on demand. At most one decoded block is kept cached, so a
/// lookup hitting the cached block costs only the binary search.
///
/// `get` mutates the cache; readers shared across threads need external
/// synchronization (or one reader per thread, cloning the source).
pub struct StoreReader<C: CompressionStrategy = Uncompressed> {
    source: ReadOnlySource,
    compression: C,
    offsets: Vec<OffsetIndex>,
    current_block: Vec<u8>,
    current_block_offsets: BTreeMap<DocId, u32>,
    current_block_entry: Option<OffsetIndex>,
}

impl StoreReader {
    /// Open a reader over a store written with the identity strategy.
    pub fn open(source: ReadOnlySource) -> Result<StoreReader> {
        StoreReader::with_compression(source, Uncompressed)
    }
}

impl<C: CompressionStrategy> StoreReader<C> {
    /// Open a reader over a store written with the given strategy.
    pub fn with_compression(source: ReadOnlySource, compression: C) -> Result<StoreReader<C>> {
        let offsets = read_header(&source)?;
        Ok(StoreReader {
            source,
            compression,
            offsets,
            current_block: Vec::new(),
            current_block_offsets: BTreeMap::new(),
            current_block_entry: None,
        })
    }

    /// The shift-normalized outer offset index.
    pub fn block_index(&self) -> &[OffsetIndex] {
        &self.offsets
    }

    /// Find the entry of the block containing the given document id.
    fn block_offset(&self, doc_id: DocId) -> Result<OffsetIndex> {
        // Entries carry the id of the first document *after* their block,
        // so the owning block is the first entry strictly greater.
        let index = self.offsets.partition_point(|entry| entry.doc_id() <= doc_id);
        self.offsets
            .get(index)
            .copied()
            .ok_or(BridgeError::InvalidDocId(doc_id))
    }

    /// Decode the block starting at the entry's offset and refresh the
    /// cached intra-block offset table.
    fn read_block(&mut self, entry: OffsetIndex) -> Result<()> {
        let data = self.source.as_slice();
        let block_start = entry.offset() as usize;
        if block_start >= data.len() {
            return Err(BridgeError::serialization(format!(
                "block offset {block_start} out of bounds"
            )));
        }

        let compressed = BinaryReader::new(&data[block_start..]).read_bytes()?;
        let block = self.compression.decode(&compressed)?;
        if block.len() < 8 {
            return Err(BridgeError::serialization("block too small for its trailer"));
        }

        let payload_size = unmarshall::<_, u64>(&block[block.len() - 8..])? as usize;
        if payload_size > block.len() - 8 {
            return Err(BridgeError::serialization(format!(
                "intra-offset table position {payload_size} out of bounds"
            )));
        }

        self.current_block_offsets = unmarshall(&block[payload_size..])?;
        self.current_block = block;
        self.current_block_entry = Some(entry);
        Ok(())
    }

    /// Fetch the document with the given id.
    pub fn get(&mut self, doc_id: DocId) -> Result<Document> {
        let entry = self.block_offset(doc_id)?;
        if self.current_block_entry != Some(entry) || self.current_block.is_empty() {
            self.read_block(entry)?;
        }

        let doc_shift = *self
            .current_block_offsets
            .get(&doc_id)
            .ok_or(BridgeError::InvalidDocId(doc_id))? as usize;
        if doc_shift >= self.current_block.len() {
            return Err(BridgeError::serialization(format!(
                "document offset {doc_shift} out of bounds"
            )));
        }

        let mut reader = BinaryReader::new(&self.current_block[doc_shift..]);
        let num_fields = reader.read_u64()?;
        let mut fields = Vec::with_capacity(num_fields.min(1 << 10) as usize);
        for _ in 0..num_fields {
            fields.push(Field::decode(&mut reader)?);
        }
        Ok(Document::from_fields(fields))
    }
}

/// Parse the trailer and shift-normalize the outer offset index, so that
/// each entry carries the starting byte of the block it refers to.
fn read_header(source: &ReadOnlySource) -> Result<Vec<OffsetIndex>> {
    let data = source.as_slice();
    if data.len() < 8 {
        return Err(BridgeError::serialization(
            "store file too small for a trailer",
        ));
    }

    let header_offset = unmarshall::<_, u64>(&data[data.len() - 8..])? as usize;
    if header_offset > data.len() - 8 {
        return Err(BridgeError::serialization(format!(
            "header offset {header_offset} out of bounds"
        )));
    }

    let raw: Vec<OffsetIndex> = unmarshall(&data[header_offset..])?;
    let mut offsets = Vec::with_capacity(raw.len());
    let mut shifted = 0u64;
    for entry in raw {
        offsets.push(OffsetIndex::new(entry.doc_id(), shifted));
        shifted = entry.offset();
    }
    Ok(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{Directory, RamDirectory};
    use crate::store::StoreWriter;
    use std::path::Path;

    fn write_store(directory: &RamDirectory, path: &Path, docs: usize) {
        let mut writer = StoreWriter::new(directory.open_write(path).unwrap());
        for i in 0..docs {
            writer
                .write(&[Field::text(0, format!("Doc {i}")), Field::u32(1, i as u32)])
                .unwrap();
        }
        writer.close().unwrap();
    }

    #[test]
    fn test_read_your_writes() {
        let directory = RamDirectory::new();
        let path = Path::new("seg.store");
        write_store(&directory, path, 10);

        let mut reader = StoreReader::open(directory.source(path).unwrap()).unwrap();
        for i in 0..10u32 {
            let doc = reader.get(i).unwrap();
            assert_eq!(
                doc.get_first_value(0).unwrap().as_text(),
                Some(format!("Doc {i}").as_str())
            );
            assert_eq!(doc.get_first_value(1).unwrap().as_u32(), Some(i));
        }
    }

    #[test]
    fn test_out_of_range_doc_id() {
        let directory = RamDirectory::new();
        let path = Path::new("seg.store");
        write_store(&directory, path, 5);

        let mut reader = StoreReader::open(directory.source(path).unwrap()).unwrap();
        assert!(matches!(
            reader.get(5),
            Err(BridgeError::InvalidDocId(5))
        ));
        assert!(matches!(
            reader.get(1_000_000),
            Err(BridgeError::InvalidDocId(_))
        ));
    }

    #[test]
    fn test_empty_store() {
        let directory = RamDirectory::new();
        let path = Path::new("seg.store");
        write_store(&directory, path, 0);

        let mut reader = StoreReader::open(directory.source(path).unwrap()).unwrap();
        assert!(reader.block_index().is_empty());
        assert!(matches!(reader.get(0), Err(BridgeError::InvalidDocId(0))));
    }

    #[test]
    fn test_empty_document_round_trips() {
        let directory = RamDirectory::new();
        let path = Path::new("seg.store");
        let mut writer = StoreWriter::new(directory.open_write(path).unwrap());
        writer.write(&[]).unwrap();
        writer.write(&[Field::text(0, "after empty")]).unwrap();
        writer.close().unwrap();

        let mut reader = StoreReader::open(directory.source(path).unwrap()).unwrap();
        assert!(reader.get(0).unwrap().is_empty());
        assert_eq!(
            reader.get(1).unwrap().get_first_value(0).unwrap().as_text(),
            Some("after empty")
        );
    }

    #[test]
    fn test_truncated_file_is_rejected() {
        let directory = RamDirectory::new();
        let path = Path::new("seg.store");
        write_store(&directory, path, 3);

        let data = directory.source(path).unwrap().as_slice().to_vec();
        let truncated = data[..4].to_vec();
        let result = StoreReader::open(ReadOnlySource::from_bytes(truncated));
        assert!(matches!(result, Err(BridgeError::Serialization(_))));
    }

    #[test]
    fn test_shift_normalization() {
        let directory = RamDirectory::new();
        let path = Path::new("seg.store");
        // ~1 KiB docs force multiple blocks
        let mut writer = StoreWriter::new(directory.open_write(path).unwrap());
        let body = "y".repeat(1024);
        for _ in 0..40 {
            writer.write(&[Field::text(0, body.as_str())]).unwrap();
        }
        writer.close().unwrap();

        let reader = StoreReader::open(directory.source(path).unwrap()).unwrap();
        let index = reader.block_index();
        assert!(index.len() >= 2);
        // after normalization the first block starts at byte 0 and both
        // doc ids and offsets increase strictly
        assert_eq!(index[0].offset(), 0);
        for pair in index.windows(2) {
            assert!(pair[0].doc_id() < pair[1].doc_id());
            assert!(pair[0].offset() < pair[1].offset());
        }
    }

    #[test]
    fn test_block_boundary_doc_resolves() {
        let directory = RamDirectory::new();
        let path = Path::new("seg.store");
        let mut writer = StoreWriter::new(directory.open_write(path).unwrap());
        let body = "z".repeat(1024);
        for i in 0..40u32 {
            writer
                .write(&[Field::text(0, body.as_str()), Field::u32(1, i)])
                .unwrap();
        }
        writer.close().unwrap();

        let mut reader = StoreReader::open(directory.source(path).unwrap()).unwrap();
        // the first doc id of the second block sits exactly on the
        // boundary recorded by the first index entry
        let boundary = reader.block_index()[0].doc_id();
        let doc = reader.get(boundary).unwrap();
        assert_eq!(doc.get_first_value(1).unwrap().as_u32(), Some(boundary));
    }
}
