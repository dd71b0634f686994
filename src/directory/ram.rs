//! In-memory directory implementation, for tests and transient indexes.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::directory::{
    Directory, DirectoryError, LockGuard, LockRegistry, ReadOnlySource, WritePtr, WriteStream,
};
use crate::error::Result;

type SharedFiles = Arc<RwLock<HashMap<PathBuf, Arc<Vec<u8>>>>>;

/// A directory that stores its files in RAM.
///
/// Clones share the same file namespace. Files become visible when their
/// write stream is closed; `replace_content` swaps the backing buffer, so
/// sources acquired earlier keep reading the old bytes.
#[derive(Debug, Clone, Default)]
pub struct RamDirectory {
    files: SharedFiles,
    locks: LockRegistry,
}

impl RamDirectory {
    /// Create a new, empty RAM directory.
    pub fn new() -> RamDirectory {
        RamDirectory::default()
    }

    /// Number of files stored.
    pub fn file_count(&self) -> usize {
        self.files.read().unwrap().len()
    }

    /// Total size of all files in bytes.
    pub fn total_size(&self) -> u64 {
        let files = self.files.read().unwrap();
        files.values().map(|data| data.len() as u64).sum()
    }
}

impl Directory for RamDirectory {
    fn open_write(&self, path: &Path) -> Result<WritePtr> {
        let guard = self.locks.acquire(path)?;
        if self.files.read().unwrap().contains_key(path) {
            return Err(DirectoryError::FileAlreadyExists(path.to_path_buf()).into());
        }
        Ok(Box::new(RamWriter {
            path: path.to_path_buf(),
            buffer: Vec::new(),
            files: Arc::clone(&self.files),
            guard: Some(guard),
            closed: false,
        }))
    }

    fn source(&self, path: &Path) -> Result<ReadOnlySource> {
        let files = self.files.read().unwrap();
        let data = files
            .get(path)
            .ok_or_else(|| DirectoryError::FileNotFound(path.to_path_buf()))?;
        Ok(ReadOnlySource::from_shared(Arc::clone(data)))
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let _guard = self.locks.acquire(path)?;
        let mut files = self.files.write().unwrap();
        files
            .remove(path)
            .ok_or_else(|| DirectoryError::FileNotFound(path.to_path_buf()))?;
        Ok(())
    }

    fn replace_content(&self, path: &Path, data: &[u8]) -> Result<()> {
        let _guard = self.locks.acquire(path)?;
        let mut files = self.files.write().unwrap();
        files.insert(path.to_path_buf(), Arc::new(data.to_vec()));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

/// Write stream into a [`RamDirectory`].
///
/// The buffered bytes are published into the directory when the stream is
/// closed (or dropped).
struct RamWriter {
    path: PathBuf,
    buffer: Vec<u8>,
    files: SharedFiles,
    guard: Option<LockGuard>,
    closed: bool,
}

impl fmt::Debug for RamWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RamWriter")
            .field("path", &self.path)
            .field("buffered", &self.buffer.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Write for RamWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::other("write stream is closed"));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl WriteStream for RamWriter {
    fn close(&mut self) -> Result<()> {
        if !self.closed {
            let data = Arc::new(std::mem::take(&mut self.buffer));
            self.files.write().unwrap().insert(self.path.clone(), data);
            self.guard = None;
            self.closed = true;
        }
        Ok(())
    }
}

impl Drop for RamWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    #[test]
    fn test_write_then_read() {
        let directory = RamDirectory::new();
        let path = Path::new("seg.store");

        let mut writer = directory.open_write(path).unwrap();
        writer.write_all(b"Hello, RAM!").unwrap();

        // not visible until closed
        assert!(!directory.exists(path));
        writer.close().unwrap();

        assert!(directory.exists(path));
        let source = directory.source(path).unwrap();
        assert_eq!(source.as_slice(), b"Hello, RAM!");
        assert_eq!(directory.file_count(), 1);
        assert_eq!(directory.total_size(), 11);
    }

    #[test]
    fn test_open_write_twice_is_locked() {
        let directory = RamDirectory::new();
        let path = Path::new("seg.store");

        let _writer = directory.open_write(path).unwrap();
        let err = directory.open_write(path).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Directory(DirectoryError::AlreadyLocked(_))
        ));
    }

    #[test]
    fn test_open_write_existing_file_fails() {
        let directory = RamDirectory::new();
        let path = Path::new("seg.store");

        directory.open_write(path).unwrap().close().unwrap();
        let err = directory.open_write(path).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Directory(DirectoryError::FileAlreadyExists(_))
        ));
    }

    #[test]
    fn test_replace_content_preserves_old_sources() {
        let directory = RamDirectory::new();
        let path = Path::new("t");

        directory.replace_content(path, &[0, 1, 2, 3, 4]).unwrap();
        let before = directory.source(path).unwrap();

        directory.replace_content(path, &[9, 9, 9]).unwrap();
        let after = directory.source(path).unwrap();

        assert_eq!(before.as_slice(), &[0, 1, 2, 3, 4]);
        assert_eq!(after.as_slice(), &[9, 9, 9]);
    }

    #[test]
    fn test_remove() {
        let directory = RamDirectory::new();
        let path = Path::new("t");

        assert!(matches!(
            directory.remove(path),
            Err(BridgeError::Directory(DirectoryError::FileNotFound(_)))
        ));

        directory.replace_content(path, b"data").unwrap();
        let source = directory.source(path).unwrap();

        directory.remove(path).unwrap();
        assert!(!directory.exists(path));
        assert!(directory.source(path).is_err());
        // a source acquired before the removal stays valid
        assert_eq!(source.as_slice(), b"data");
    }

    #[test]
    fn test_dropped_writer_publishes_file() {
        let directory = RamDirectory::new();
        let path = Path::new("t");
        {
            let mut writer = directory.open_write(path).unwrap();
            writer.write_all(b"dropped").unwrap();
        }
        assert_eq!(directory.source(path).unwrap().as_slice(), b"dropped");
        // and the lock was released
        directory.remove(path).unwrap();
    }
}
