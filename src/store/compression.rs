//! Block compression strategies.

use std::fmt;

use crate::error::{BridgeError, Result};

/// A pluggable block compression scheme.
///
/// `decode(encode(x)) == x` must hold for every byte sequence; frames must
/// be self-contained so a reader can decompress without side data.
pub trait CompressionStrategy: Send + Sync + fmt::Debug {
    /// Compress a sealed block.
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>>;

    /// Decompress a block payload.
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// The identity strategy: blocks are stored as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uncompressed;

impl CompressionStrategy for Uncompressed {
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

/// LZ4 block compression with a size-prepended, self-contained frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Compression;

impl CompressionStrategy for Lz4Compression {
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        Ok(lz4_flex::compress_prepend_size(raw))
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        lz4_flex::decompress_size_prepended(data)
            .map_err(|e| BridgeError::serialization(format!("LZ4 decompression failed: {e}")))
    }
}
