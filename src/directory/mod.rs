//! Write-once-many-read (WORM) directories.
//!
//! A directory maps logical paths to byte streams. Once a file has been
//! written and closed it never changes; `replace_content` swaps whole
//! files atomically, and sources acquired earlier keep seeing the bytes
//! they were opened on.
//!
//! Two implementations are provided: [`RamDirectory`] keeps everything in
//! memory, [`MmapDirectory`] stores files on disk and reads them back
//! through memory maps.

pub mod mmap;
pub mod ram;
pub mod source;

use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::error::Result;

pub use mmap::MmapDirectory;
pub use ram::RamDirectory;
pub use source::{ReadOnlySource, SourceReader};

/// Error types specific to directory operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// The path does not name a file.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// A file already exists at the path.
    #[error("File already exists: {0}")]
    FileAlreadyExists(PathBuf),

    /// The path names a directory, not a file.
    #[error("Path is a directory: {0}")]
    IsDirectory(PathBuf),

    /// Another handle holds the exclusive lock for the path.
    #[error("Path is already locked: {0}")]
    AlreadyLocked(PathBuf),
}

/// A byte sink handed out by [`Directory::open_write`].
///
/// Closing flushes buffered bytes and makes the file visible to
/// subsequent readers; dropping an unclosed stream closes it.
pub trait WriteStream: Write + Send + fmt::Debug {
    /// Flush and finalize the file.
    fn close(&mut self) -> Result<()>;
}

impl WriteStream for Box<dyn WriteStream> {
    fn close(&mut self) -> Result<()> {
        self.as_mut().close()
    }
}

/// An exclusive write stream, boxed for trait-object use.
pub type WritePtr = Box<dyn WriteStream>;

/// Write-once-many-read abstraction for where the index is stored.
pub trait Directory: Send + Sync + fmt::Debug {
    /// Open a virtual file for exclusive write.
    ///
    /// The path must not already hold a file, and no other write handle
    /// may be outstanding for it.
    fn open_write(&self, path: &Path) -> Result<WritePtr>;

    /// Open a read-only source over a file's bytes.
    ///
    /// Once acquired, the source's data never changes, whatever later
    /// happens to the file.
    fn source(&self, path: &Path) -> Result<ReadOnlySource>;

    /// Open a shared, positioned reader over a file's bytes.
    fn open_read(&self, path: &Path) -> Result<SourceReader> {
        Ok(SourceReader::new(self.source(path)?))
    }

    /// Remove a file. Existing sources pointing at it remain valid.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Atomically replace the content of a file.
    ///
    /// Readers can never observe a partially written file: sources
    /// acquired before the call keep the old bytes, sources acquired
    /// after see the new ones. The file may or may not previously exist.
    fn replace_content(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// True if a file exists at the path.
    fn exists(&self, path: &Path) -> bool;

    /// Flush all pending writes to durable storage.
    fn sync(&self) -> Result<()>;
}

/// In-process registry of exclusively locked paths. Clones share the same
/// set of locks.
///
/// Acquisition never blocks: contention surfaces immediately as
/// [`DirectoryError::AlreadyLocked`]. Guards release their path on drop.
#[derive(Debug, Clone, Default)]
pub(crate) struct LockRegistry {
    locked: Arc<Mutex<HashSet<PathBuf>>>,
}

impl LockRegistry {
    /// Try to take the exclusive lock for a path.
    pub(crate) fn acquire(&self, path: &Path) -> Result<LockGuard> {
        let mut locked = self.locked.lock().unwrap();
        if !locked.insert(path.to_path_buf()) {
            return Err(DirectoryError::AlreadyLocked(path.to_path_buf()).into());
        }
        Ok(LockGuard {
            locked: Arc::clone(&self.locked),
            path: path.to_path_buf(),
        })
    }
}

/// RAII guard for an exclusive path lock.
#[derive(Debug)]
pub(crate) struct LockGuard {
    locked: Arc<Mutex<HashSet<PathBuf>>>,
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let mut locked = self.locked.lock().unwrap();
        locked.remove(&self.path);
    }
}
