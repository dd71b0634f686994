//! Read-only byte views over directory files.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::Deref;
use std::sync::Arc;

use memmap2::Mmap;

/// A read-only view over a range of bytes, backed by an owned buffer or a
/// memory-mapped file.
///
/// Whatever happens to the directory file afterwards, the bytes exposed by
/// a source never change. Cloning and slicing never copy the underlying
/// bytes; they share the backing storage and narrow the visible range.
#[derive(Clone)]
pub enum ReadOnlySource {
    /// The empty source.
    Empty,
    /// Bytes owned in memory.
    InMemory {
        /// Shared backing buffer.
        data: Arc<Vec<u8>>,
        /// Start of the visible range.
        start: usize,
        /// One past the end of the visible range.
        end: usize,
    },
    /// A view over a memory-mapped file.
    Mmap {
        /// Shared memory map.
        map: Arc<Mmap>,
        /// Start of the visible range.
        start: usize,
        /// One past the end of the visible range.
        end: usize,
    },
}

impl ReadOnlySource {
    /// The empty source.
    pub fn empty() -> ReadOnlySource {
        ReadOnlySource::Empty
    }

    /// Create a source owning the given bytes.
    pub fn from_bytes(data: Vec<u8>) -> ReadOnlySource {
        let end = data.len();
        ReadOnlySource::InMemory {
            data: Arc::new(data),
            start: 0,
            end,
        }
    }

    /// Create a source sharing an already-owned buffer.
    pub fn from_shared(data: Arc<Vec<u8>>) -> ReadOnlySource {
        let end = data.len();
        ReadOnlySource::InMemory {
            data,
            start: 0,
            end,
        }
    }

    /// Create a source over a whole memory map.
    pub fn from_mmap(map: Arc<Mmap>) -> ReadOnlySource {
        let end = map.len();
        ReadOnlySource::Mmap { map, start: 0, end }
    }

    /// The visible bytes.
    pub fn as_slice(&self) -> &[u8] {
        match self {
            ReadOnlySource::Empty => &[],
            ReadOnlySource::InMemory { data, start, end } => &data[*start..*end],
            ReadOnlySource::Mmap { map, start, end } => &map[*start..*end],
        }
    }

    /// Number of visible bytes.
    pub fn len(&self) -> usize {
        match self {
            ReadOnlySource::Empty => 0,
            ReadOnlySource::InMemory { start, end, .. } => end - start,
            ReadOnlySource::Mmap { start, end, .. } => end - start,
        }
    }

    /// True if the source has no visible bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A new source viewing the `[from, to)` subrange of this one.
    ///
    /// Panics if the range is out of bounds or inverted.
    pub fn slice(&self, from: usize, to: usize) -> ReadOnlySource {
        assert!(
            from <= to && to <= self.len(),
            "invalid slice [{from}, {to}) of a source of {} bytes",
            self.len()
        );
        match self {
            ReadOnlySource::Empty => ReadOnlySource::Empty,
            ReadOnlySource::InMemory { data, start, .. } => ReadOnlySource::InMemory {
                data: Arc::clone(data),
                start: start + from,
                end: start + to,
            },
            ReadOnlySource::Mmap { map, start, .. } => ReadOnlySource::Mmap {
                map: Arc::clone(map),
                start: start + from,
                end: start + to,
            },
        }
    }
}

impl Deref for ReadOnlySource {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Vec<u8>> for ReadOnlySource {
    fn from(data: Vec<u8>) -> ReadOnlySource {
        ReadOnlySource::from_bytes(data)
    }
}

impl fmt::Debug for ReadOnlySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backing = match self {
            ReadOnlySource::Empty => "empty",
            ReadOnlySource::InMemory { .. } => "in-memory",
            ReadOnlySource::Mmap { .. } => "mmap",
        };
        f.debug_struct("ReadOnlySource")
            .field("backing", &backing)
            .field("len", &self.len())
            .finish()
    }
}

/// A positioned cursor over a [`ReadOnlySource`], for stream-style reads.
#[derive(Debug, Clone)]
pub struct SourceReader {
    source: ReadOnlySource,
    position: u64,
}

impl SourceReader {
    /// Create a cursor at the start of the source.
    pub fn new(source: ReadOnlySource) -> SourceReader {
        SourceReader {
            source,
            position: 0,
        }
    }

    /// Total size of the underlying source in bytes.
    pub fn size(&self) -> u64 {
        self.source.len() as u64
    }

    /// The underlying source.
    pub fn source(&self) -> &ReadOnlySource {
        &self.source
    }

    /// Consume the cursor, returning the underlying source.
    pub fn into_source(self) -> ReadOnlySource {
        self.source
    }
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.source.as_slice();
        let position = (self.position as usize).min(data.len());
        let count = buf.len().min(data.len() - position);
        buf[..count].copy_from_slice(&data[position..position + count]);
        self.position += count as u64;
        Ok(count)
    }
}

impl Seek for SourceReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let size = self.source.len() as i64;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(offset) => size + offset,
            SeekFrom::Current(offset) => self.position as i64 + offset,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of source",
            ));
        }
        self.position = target as u64;
        Ok(self.position)
    }
}
