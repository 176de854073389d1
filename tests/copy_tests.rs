//! Tests for atomic file copy operations

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use treemirror::executor::{copy_file_atomic, copy_mtime};

fn create_test_file(path: &PathBuf, content: &[u8]) {
    let mut file = fs::File::create(path).expect("Failed to create test file");
    file.write_all(content)
        .expect("Failed to write test content");
    file.flush().expect("Failed to flush");
}

fn set_file_mtime(path: &PathBuf, mtime: SystemTime) {
    let filetime_mtime = filetime::FileTime::from_system_time(mtime);
    filetime::set_file_mtime(path, filetime_mtime).expect("Failed to set mtime");
}

#[test]
fn test_copy_basic_content() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.txt");
    let content = b"Hello, replica! This is a test file.";
    create_test_file(&src_path, content);

    let dest_path = root.join("dest.txt");
    let bytes_copied =
        copy_file_atomic(&src_path, &dest_path).expect("copy_file_atomic should succeed");

    assert_eq!(bytes_copied, content.len() as u64);
    assert_eq!(fs::read(&dest_path).expect("Failed to read dest file"), content);
}

#[test]
fn test_copy_does_not_create_parents() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.txt");
    create_test_file(&src_path, b"test content");

    let dest_path = root.join("a/b/c/dest.txt");
    let result = copy_file_atomic(&src_path, &dest_path);

    assert!(result.is_err(), "missing parent directories must be an error");
    assert!(!root.join("a").exists());
}

#[test]
fn test_copy_preserves_mtime() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.txt");
    create_test_file(&src_path, b"timestamped");
    let past = SystemTime::UNIX_EPOCH + Duration::from_secs(1_234_567_890);
    set_file_mtime(&src_path, past);

    let dest_path = root.join("dest.txt");
    copy_file_atomic(&src_path, &dest_path).expect("copy_file_atomic should succeed");

    let dest_mtime = fs::metadata(&dest_path)
        .and_then(|m| m.modified())
        .expect("Failed to read dest mtime");
    assert_eq!(dest_mtime, past);
}

#[test]
fn test_copy_replaces_existing_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.txt");
    create_test_file(&src_path, b"short");
    let dest_path = root.join("dest.txt");
    create_test_file(&dest_path, b"a much longer previous version");

    copy_file_atomic(&src_path, &dest_path).expect("copy_file_atomic should succeed");

    assert_eq!(fs::read(&dest_path).expect("Failed to read dest file"), b"short");
}

#[test]
fn test_copy_large_file_spans_buffers() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let content: Vec<u8> = (0..(1024 * 1024 + 17)).map(|i| (i % 251) as u8).collect();
    let src_path = root.join("large.bin");
    create_test_file(&src_path, &content);

    let dest_path = root.join("large_copy.bin");
    let bytes = copy_file_atomic(&src_path, &dest_path).expect("copy_file_atomic should succeed");

    assert_eq!(bytes, content.len() as u64);
    assert_eq!(fs::read(&dest_path).expect("Failed to read dest file"), content);
}

#[test]
fn test_failed_copy_leaves_no_temporary_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    // Renaming a file over a directory fails after the .part is written
    let src_path = root.join("source.txt");
    create_test_file(&src_path, b"content");
    let dest_path = root.join("occupied");
    fs::create_dir(&dest_path).expect("Failed to create blocking dir");

    assert!(copy_file_atomic(&src_path, &dest_path).is_err());

    let leftovers: Vec<_> = fs::read_dir(root)
        .expect("Failed to list root")
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty(), "leftover temp files: {:?}", leftovers);
    assert!(dest_path.is_dir());
}

#[test]
fn test_failed_copy_keeps_lookalike_sibling() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.txt");
    create_test_file(&src_path, b"content");
    let dest_path = root.join("occupied");
    fs::create_dir(&dest_path).expect("Failed to create blocking dir");
    let lookalike = root.join(".occupied.part");
    create_test_file(&lookalike, b"belongs to the tree");

    assert!(copy_file_atomic(&src_path, &dest_path).is_err());

    assert_eq!(
        fs::read(&lookalike).expect("lookalike must survive"),
        b"belongs to the tree"
    );
    let names: Vec<_> = fs::read_dir(root)
        .expect("Failed to list root")
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 3, "unexpected entries: {:?}", names);
}

#[test]
fn test_copy_empty_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("empty.txt");
    create_test_file(&src_path, b"");
    let dest_path = root.join("empty_copy.txt");

    let bytes = copy_file_atomic(&src_path, &dest_path).expect("copy_file_atomic should succeed");

    assert_eq!(bytes, 0);
    assert!(dest_path.exists());
}

#[test]
fn test_copy_mtime_leaves_content() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("source.txt");
    create_test_file(&src_path, b"source bytes");
    let past = SystemTime::UNIX_EPOCH + Duration::from_secs(1_500_000_000);
    set_file_mtime(&src_path, past);

    let dest_path = root.join("dest.txt");
    create_test_file(&dest_path, b"replica bytes");

    copy_mtime(&src_path, &dest_path).expect("copy_mtime should succeed");

    assert_eq!(
        fs::read(&dest_path).expect("Failed to read dest file"),
        b"replica bytes"
    );
    assert_eq!(
        fs::metadata(&dest_path).and_then(|m| m.modified()).unwrap(),
        past
    );
}
