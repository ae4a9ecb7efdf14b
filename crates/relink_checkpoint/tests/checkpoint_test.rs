//! Tests for the file-backed checkpoint store.

use relink_checkpoint::{CheckpointPolicy, UploadCheckpoint};
use relink_core::{UploadRecord, UploadStatus};
use relink_error::{CheckpointErrorKind, RelinkErrorKind};
use std::sync::Arc;
use tempfile::TempDir;

fn uploaded(key: &str) -> UploadRecord {
    UploadRecord::pending(key, format!("/files/{key}")).uploaded(
        key,
        format!("https://pub.example/{key}"),
        1,
    )
}

#[test]
fn test_load_creates_empty_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("progress.json");

    let checkpoint = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord).unwrap();
    assert!(path.exists());
    assert!(checkpoint.records().is_empty());
}

#[tokio::test]
async fn test_every_record_is_durable_without_flush() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("progress.json");

    let checkpoint = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord).unwrap();
    checkpoint.record(uploaded("photo.png")).await.unwrap();

    // Simulate a crash: never drop, never flush
    std::mem::forget(checkpoint);

    let reloaded = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord).unwrap();
    let record = reloaded.get("photo.png").unwrap();
    assert_eq!(*record.status(), UploadStatus::Uploaded);
    assert_eq!(
        record.target_url().as_deref(),
        Some("https://pub.example/photo.png")
    );
}

#[tokio::test]
async fn test_batched_policy_defers_until_threshold() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("progress.json");

    let checkpoint = UploadCheckpoint::load(&path, CheckpointPolicy::Batched(3)).unwrap();
    checkpoint.record(uploaded("a.png")).await.unwrap();
    checkpoint.record(uploaded("b.png")).await.unwrap();

    let on_disk = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord).unwrap();
    assert!(on_disk.get("a.png").is_none());
    drop(on_disk);

    checkpoint.record(uploaded("c.png")).await.unwrap();
    std::mem::forget(checkpoint);

    let on_disk = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord).unwrap();
    assert_eq!(on_disk.records().len(), 3);
}

#[tokio::test]
async fn test_batched_policy_flushes_on_drop() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("progress.json");

    {
        let checkpoint = UploadCheckpoint::load(&path, CheckpointPolicy::Batched(50)).unwrap();
        checkpoint.record(uploaded("late.png")).await.unwrap();
    }

    let reloaded = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord).unwrap();
    assert!(reloaded.get("late.png").unwrap().is_uploaded());
}

#[tokio::test]
async fn test_interrupted_before_commit_stays_pending() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("progress.json");

    let checkpoint = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord).unwrap();
    checkpoint
        .record(UploadRecord::pending("inflight.png", "/files/inflight.png"))
        .await
        .unwrap();
    checkpoint.record(uploaded("done.png")).await.unwrap();
    std::mem::forget(checkpoint);

    let reloaded = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord).unwrap();
    assert_eq!(*reloaded.get("inflight.png").unwrap().status(), UploadStatus::Pending);
    assert!(reloaded.get("done.png").unwrap().is_uploaded());

    let counts = reloaded.counts();
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.uploaded, 1);
    assert_eq!(counts.failed, 0);
}

#[test]
fn test_newer_version_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("progress.json");
    std::fs::write(&path, r#"{"version": 99, "records": {"x": "new shape"}}"#).unwrap();

    let result = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord);
    match result.err().unwrap().kind() {
        RelinkErrorKind::Checkpoint(e) => assert!(matches!(
            e.kind,
            CheckpointErrorKind::UnsupportedVersion { found: 99, .. }
        )),
        other => panic!("expected checkpoint error, got {other}"),
    }
}

#[test]
fn test_corrupt_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("progress.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord);
    assert!(result.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_do_not_lose_records() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("progress.json");
    let checkpoint = Arc::new(UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let checkpoint = Arc::clone(&checkpoint);
            tokio::spawn(async move {
                for i in 0..10 {
                    checkpoint.record(uploaded(&format!("w{worker}-{i}.png"))).await.unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    // Every record call returned, so every record is already on disk
    let on_disk = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord).unwrap();
    assert_eq!(on_disk.records().len(), 80);
    drop(on_disk);
    drop(checkpoint);

    let reloaded = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord).unwrap();
    assert_eq!(reloaded.records().len(), 80);
}

#[tokio::test]
async fn test_explicit_flush_writes_batched_records() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("progress.json");

    let checkpoint = UploadCheckpoint::load(&path, CheckpointPolicy::Batched(10)).unwrap();
    checkpoint.record(uploaded("a.png")).await.unwrap();
    checkpoint.flush().await.unwrap();
    std::mem::forget(checkpoint);

    let on_disk = UploadCheckpoint::load(&path, CheckpointPolicy::EveryRecord).unwrap();
    assert!(on_disk.get("a.png").unwrap().is_uploaded());
}
