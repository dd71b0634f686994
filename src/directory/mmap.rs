//! Directory storing data in files, read back via mmap.
//!
//! Memory maps are cached to limit system calls; every mutating operation
//! invalidates the affected cache entry.

use std::collections::HashMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use memmap2::{Mmap, MmapOptions};

use crate::directory::{
    Directory, DirectoryError, LockGuard, LockRegistry, ReadOnlySource, WritePtr, WriteStream,
};
use crate::error::{BridgeError, Result};

type MmapCache = Arc<RwLock<HashMap<PathBuf, Arc<Mmap>>>>;

/// A directory rooted at a filesystem path.
#[derive(Debug, Clone)]
pub struct MmapDirectory {
    root: PathBuf,
    mmap_cache: MmapCache,
    locks: LockRegistry,
}

impl MmapDirectory {
    /// Open a directory rooted at `root`, creating it if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<MmapDirectory> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }
        Ok(MmapDirectory {
            root,
            mmap_cache: Arc::new(RwLock::new(HashMap::new())),
            locks: LockRegistry::default(),
        })
    }

    /// The root path of this directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a logical path against the root. Absolute paths are taken
    /// relative to the root.
    fn resolve(&self, path: &Path) -> PathBuf {
        let relative = path.strip_prefix("/").unwrap_or(path);
        self.root.join(relative)
    }

    fn invalidate_cache(&self, full_path: &Path) {
        self.mmap_cache.write().unwrap().remove(full_path);
    }

    fn mmap(&self, full_path: &Path) -> Result<Arc<Mmap>> {
        {
            let cache = self.mmap_cache.read().unwrap();
            if let Some(map) = cache.get(full_path) {
                return Ok(Arc::clone(map));
            }
        }

        let file = File::open(full_path)?;
        // SAFETY: the directory is write-once; a mapped file is never
        // mutated in place (replace_content goes through a rename).
        let map = unsafe { MmapOptions::new().map(&file)? };
        let map = Arc::new(map);
        self.mmap_cache
            .write()
            .unwrap()
            .insert(full_path.to_path_buf(), Arc::clone(&map));
        Ok(map)
    }
}

fn sync_all_files(dir: &Path) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            sync_all_files(&entry.path())?;
        } else if file_type.is_file() {
            File::open(entry.path())?.sync_all()?;
        }
    }
    Ok(())
}

impl Directory for MmapDirectory {
    fn open_write(&self, path: &Path) -> Result<WritePtr> {
        let guard = self.locks.acquire(path)?;
        let full_path = self.resolve(path);
        self.invalidate_cache(&full_path);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full_path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => {
                    BridgeError::from(DirectoryError::FileAlreadyExists(path.to_path_buf()))
                }
                _ => BridgeError::from(e),
            })?;

        Ok(Box::new(MmapWriter {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            guard: Some(guard),
            closed: false,
        }))
    }

    fn source(&self, path: &Path) -> Result<ReadOnlySource> {
        let full_path = self.resolve(path);
        let metadata = std::fs::metadata(&full_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                BridgeError::from(DirectoryError::FileNotFound(path.to_path_buf()))
            }
            _ => BridgeError::from(e),
        })?;
        if metadata.is_dir() {
            return Err(DirectoryError::IsDirectory(path.to_path_buf()).into());
        }
        // a zero-length mapping is not portable
        if metadata.len() == 0 {
            return Ok(ReadOnlySource::empty());
        }
        Ok(ReadOnlySource::from_mmap(self.mmap(&full_path)?))
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let _guard = self.locks.acquire(path)?;
        let full_path = self.resolve(path);
        self.invalidate_cache(&full_path);
        std::fs::remove_file(&full_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                BridgeError::from(DirectoryError::FileNotFound(path.to_path_buf()))
            }
            _ => BridgeError::from(e),
        })
    }

    fn replace_content(&self, path: &Path, data: &[u8]) -> Result<()> {
        let _guard = self.locks.acquire(path)?;
        let full_path = self.resolve(path);
        if full_path.is_dir() {
            return Err(DirectoryError::IsDirectory(path.to_path_buf()).into());
        }

        // Write a sibling temp file, then rename over the destination so
        // readers never observe a partial file.
        let mut temp_file = tempfile::NamedTempFile::new_in(&self.root)?;
        temp_file.write_all(data)?;
        temp_file.as_file().sync_all()?;
        temp_file
            .persist(&full_path)
            .map_err(|persist_error| BridgeError::from(persist_error.error))?;

        self.invalidate_cache(&full_path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn sync(&self) -> Result<()> {
        sync_all_files(&self.root)
    }
}

/// Write stream into an [`MmapDirectory`] file.
struct MmapWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    guard: Option<LockGuard>,
    closed: bool,
}

impl fmt::Debug for MmapWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmapWriter")
            .field("path", &self.path)
            .field("closed", &self.closed)
            .finish()
    }
}

impl Write for MmapWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::other("write stream is closed"));
        }
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl WriteStream for MmapWriter {
    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.writer.flush()?;
            self.writer.get_ref().sync_all()?;
            self.guard = None;
            self.closed = true;
        }
        Ok(())
    }
}

impl Drop for MmapWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
