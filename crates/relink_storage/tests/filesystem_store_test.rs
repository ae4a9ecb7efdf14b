//! Tests for the filesystem object store.

use relink_storage::{FileSystemStore, ObjectStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_put_then_head() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp_dir.path().join("bucket")).unwrap();

    assert!(!store.head_object("photo.png").await.unwrap());
    store
        .put_object("photo.png", b"bytes", "image/png")
        .await
        .unwrap();
    assert!(store.head_object("photo.png").await.unwrap());

    let written = std::fs::read(temp_dir.path().join("bucket/photo.png")).unwrap();
    assert_eq!(written, b"bytes");
}

#[tokio::test]
async fn test_put_replaces_existing_object() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp_dir.path()).unwrap();

    store.put_object("a.txt", b"one", "text/plain").await.unwrap();
    store.put_object("a.txt", b"two", "text/plain").await.unwrap();

    assert_eq!(std::fs::read(temp_dir.path().join("a.txt")).unwrap(), b"two");
    let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_keys_cannot_escape_the_base_directory() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp_dir.path().join("bucket")).unwrap();

    assert!(store.put_object("../escape.png", b"x", "image/png").await.is_err());
    assert!(store.head_object("..").await.is_err());
}

#[tokio::test]
async fn test_verify_access_on_fresh_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSystemStore::new(temp_dir.path().join("bucket")).unwrap();
    store.verify_access().await.unwrap();
    assert_eq!(store.backend_name(), "filesystem");
}
