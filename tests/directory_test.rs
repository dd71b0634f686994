//! WORM-contract tests shared by both directory implementations.

use std::io::Write;
use std::path::Path;

use bridge::directory::{Directory, DirectoryError, MmapDirectory, RamDirectory, WriteStream};
use bridge::error::BridgeError;
use tempfile::TempDir;

fn check_write_then_read(directory: &dyn Directory) {
    let path = Path::new("test_file");
    let bytes = [0x00u8, 0x01, 0x02, 0x03, 0x04];

    {
        let mut write_file = directory.open_write(path).unwrap();
        write_file.write_all(&bytes).unwrap();
        write_file.close().unwrap();
    }

    let read_file = directory.source(path).unwrap();
    assert_eq!(read_file.len(), 5);
    assert_eq!(read_file.as_slice(), &bytes);
}

fn check_replace_content_atomicity(directory: &dyn Directory) {
    let path = Path::new("t");

    directory.replace_content(path, &[0, 1, 2, 3, 4]).unwrap();
    let source_a = directory.source(path).unwrap();

    directory.replace_content(path, &[9, 9, 9]).unwrap();
    let source_b = directory.source(path).unwrap();

    assert_eq!(source_a.as_slice(), &[0, 1, 2, 3, 4]);
    assert_eq!(source_b.as_slice(), &[9, 9, 9]);
}

fn check_lock_denial(directory: &dyn Directory) {
    let path = Path::new("locked");

    let first = directory.open_write(path).unwrap();
    let err = directory.open_write(path).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Directory(DirectoryError::AlreadyLocked(_))
    ));
    drop(first);
}

fn check_remove_keeps_sources_valid(directory: &dyn Directory) {
    let path = Path::new("removed");

    directory.replace_content(path, b"keep me readable").unwrap();
    let source = directory.source(path).unwrap();

    directory.remove(path).unwrap();
    assert!(!directory.exists(path));
    assert!(matches!(
        directory.source(path),
        Err(BridgeError::Directory(DirectoryError::FileNotFound(_)))
    ));
    assert_eq!(source.as_slice(), b"keep me readable");
}

#[test]
fn test_ram_directory_contract() {
    let directory = RamDirectory::new();
    check_write_then_read(&directory);
    check_replace_content_atomicity(&directory);
    check_lock_denial(&directory);
    check_remove_keeps_sources_valid(&directory);
}

#[test]
fn test_mmap_directory_contract() {
    let temp_dir = TempDir::new().unwrap();
    let directory = MmapDirectory::open(temp_dir.path()).unwrap();
    check_write_then_read(&directory);
    check_replace_content_atomicity(&directory);
    check_lock_denial(&directory);
    check_remove_keeps_sources_valid(&directory);
}

#[test]
fn test_open_read_stream() {
    use std::io::Read;

    let directory = RamDirectory::new();
    let path = Path::new("stream");
    directory.replace_content(path, b"streamed bytes").unwrap();

    let mut reader = directory.open_read(path).unwrap();
    assert_eq!(reader.size(), 14);
    let mut contents = Vec::new();
    reader.read_to_end(&mut contents).unwrap();
    assert_eq!(contents, b"streamed bytes");
}

#[test]
fn test_source_slicing_is_zero_copy_view() {
    let directory = RamDirectory::new();
    let path = Path::new("sliced");
    directory.replace_content(path, b"0123456789").unwrap();

    let source = directory.source(path).unwrap();
    let middle = source.slice(3, 7);
    assert_eq!(middle.as_slice(), b"3456");

    // the parent source is unaffected
    assert_eq!(source.len(), 10);
}

#[test]
fn test_mmap_sync_visibility_across_handles() {
    let temp_dir = TempDir::new().unwrap();
    let path = Path::new("shared");

    {
        let directory = MmapDirectory::open(temp_dir.path()).unwrap();
        let mut writer = directory.open_write(path).unwrap();
        writer.write_all(b"written elsewhere").unwrap();
        writer.close().unwrap();
        directory.sync().unwrap();
    }

    let other = MmapDirectory::open(temp_dir.path()).unwrap();
    let source = other.source(path).unwrap();
    assert_eq!(source.as_slice(), b"written elsewhere");
}
