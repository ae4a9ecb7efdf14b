//! End-to-end migration runs against the in-memory store.

use relink::{
    CheckpointPolicy, InterruptFlag, MemoryStore, MigrationConfig, MigrationErrorKind,
    MigrationOrchestrator, MigrationState, ObjectStore, RelinkErrorKind, ScriptedFailure,
    UploadCheckpoint, UploadRecord, UploadStatus,
};
use relink_error::StoreErrorKind;
use relink_storage::StoreResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const PUBLIC_URL: &str = "https://pub-xxx.example";
const PHOTO_URL: &str = "https://firebasestorage.googleapis.com/v0/b/proj/o/abc%2Fphoto-image-44306.png.enc?alt=media&token=t";
const PHOTO_KEY: &str = "photo-image-44306.png";

struct Fixture {
    temp_dir: TempDir,
    store: Arc<MemoryStore>,
}

impl Fixture {
    fn new(files: &[&str]) -> Self {
        Self::with_document(files, &document())
    }

    fn with_document(files: &[&str], document: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let media = temp_dir.path().join("files");
        std::fs::create_dir(&media).unwrap();
        for name in files {
            std::fs::write(media.join(name), format!("bytes of {name}")).unwrap();
        }
        std::fs::write(temp_dir.path().join("export.json"), document).unwrap();
        Self {
            temp_dir,
            store: Arc::new(MemoryStore::new()),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    fn config(&self) -> MigrationConfig {
        let mut config = MigrationConfig::default();
        config.paths.files_dir = Some(self.path("files"));
        config.paths.document = Some(self.path("export.json"));
        config.target.public_url = Some(PUBLIC_URL.to_string());
        config.retry.initial_backoff_ms = Some(1);
        config.retry.max_delay_secs = Some(0);
        config
    }

    fn orchestrator(&self, config: MigrationConfig) -> MigrationOrchestrator {
        let store: Arc<dyn ObjectStore> = self.store.clone();
        MigrationOrchestrator::new(config).with_store(store)
    }

    fn output(&self) -> String {
        std::fs::read_to_string(self.path("export_migrated.json")).unwrap()
    }
}

fn document() -> String {
    format!(
        r#"[
  {{
    "title": "Trip",
    "children": [
      {{ "string": "![]({PHOTO_URL})", "uid": "a1" }},
      {{ "string": "again {{{{[[pdf]]: {PHOTO_URL}}}}} and https://example.com/x.png", "uid": "a2" }}
    ],
    "edit-time": 1700000000
  }}
]"#
    )
}

fn read_checkpoint(path: &Path) -> UploadCheckpoint {
    UploadCheckpoint::load(path, CheckpointPolicy::EveryRecord).unwrap()
}

fn firebase_url(name: &str) -> String {
    format!("https://firebasestorage.googleapis.com/v0/b/proj/o/abc%2F{name}.enc?alt=media&token=t")
}

fn document_with(urls: &[String]) -> String {
    let blocks = urls
        .iter()
        .enumerate()
        .map(|(i, url)| format!(r#"{{ "string": "![]({url})", "uid": "b{i}" }}"#))
        .collect::<Vec<_>>()
        .join(", ");
    format!(r#"[{{ "title": "Page", "children": [{blocks}] }}]"#)
}

/// Store that raises the interrupt flag while its first PUT is in flight.
struct InterruptingStore {
    inner: Arc<MemoryStore>,
    flag: InterruptFlag,
}

#[async_trait::async_trait]
impl ObjectStore for InterruptingStore {
    async fn put_object(&self, key: &str, data: &[u8], content_type: &str) -> StoreResult<()> {
        self.flag.interrupt();
        tokio::task::yield_now().await;
        self.inner.put_object(key, data, content_type).await
    }

    async fn head_object(&self, key: &str) -> StoreResult<bool> {
        self.inner.head_object(key).await
    }

    fn backend_name(&self) -> &'static str {
        "interrupting"
    }
}

#[tokio::test]
async fn test_decorated_key_is_uploaded_and_every_occurrence_rewritten() {
    let fx = Fixture::new(&["photo.png"]);
    let mut orchestrator = fx.orchestrator(fx.config());

    let summary = orchestrator.run().await.unwrap();

    assert_eq!(orchestrator.state(), MigrationState::Done);
    assert_eq!(summary.references, 2);
    assert_eq!(summary.distinct_keys, 1);
    assert_eq!(summary.resolved, 1);
    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.links_rewritten, 2);
    assert!(summary.is_complete());

    let (data, content_type) = fx.store.object("photo.png").unwrap();
    assert_eq!(data, b"bytes of photo.png");
    assert_eq!(content_type, "image/png");

    let output = fx.output();
    assert!(!output.contains("firebasestorage"));
    assert_eq!(output.matches("https://pub-xxx.example/photo.png").count(), 2);
    assert!(output.contains("https://example.com/x.png"));

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    let keys: Vec<&String> = value[0].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["title", "children", "edit-time"]);
    assert_eq!(value[0]["edit-time"], 1700000000);

    let checkpoint = read_checkpoint(&fx.path("migration_progress.json"));
    let record = checkpoint.get(PHOTO_KEY).unwrap();
    assert_eq!(*record.status(), UploadStatus::Uploaded);
    assert_eq!(
        record.target_url().as_deref(),
        Some("https://pub-xxx.example/photo.png")
    );
}

#[tokio::test]
async fn test_empty_catalog_copies_document_verbatim() {
    let fx = Fixture::new(&[]);
    let summary = fx.orchestrator(fx.config()).run().await.unwrap();

    assert_eq!(summary.unresolved, 1);
    assert_eq!(summary.unresolved_keys, vec![PHOTO_KEY.to_string()]);
    assert_eq!(summary.uploaded, 0);
    assert_eq!(summary.links_rewritten, 0);
    assert_eq!(fx.output(), document());
    assert_eq!(fx.store.put_count(), 0);
}

#[tokio::test]
async fn test_second_run_uploads_nothing_and_writes_identical_bytes() {
    let fx = Fixture::new(&["photo.png"]);
    fx.orchestrator(fx.config()).run().await.unwrap();
    let first = fx.output();
    let puts = fx.store.put_count();

    let summary = fx.orchestrator(fx.config()).run().await.unwrap();

    assert_eq!(fx.store.put_count(), puts);
    assert_eq!(summary.uploaded, 0);
    assert_eq!(summary.already_present, 1);
    assert_eq!(fx.output(), first);
}

#[tokio::test]
async fn test_uploaded_checkpoint_record_is_not_retried() {
    let fx = Fixture::new(&["photo.png"]);
    {
        let checkpoint = read_checkpoint(&fx.path("migration_progress.json"));
        checkpoint
            .record(
                UploadRecord::pending(PHOTO_KEY, fx.path("files/photo.png")).uploaded(
                    "photo.png",
                    "https://pub-xxx.example/photo.png",
                    1,
                ),
            )
            .await
            .unwrap();
    }

    let summary = fx.orchestrator(fx.config()).run().await.unwrap();

    assert_eq!(fx.store.put_count(), 0);
    assert_eq!(fx.store.head_count(), 0);
    assert_eq!(summary.already_present, 1);
    assert_eq!(summary.links_rewritten, 2);
}

#[tokio::test]
async fn test_failed_upload_leaves_urls_untouched() {
    let fx = Fixture::new(&["photo.png"]);
    fx.store.script(
        "photo.png",
        ScriptedFailure::Put(StoreErrorKind::PermissionDenied("bad token".to_string())),
    );

    let summary = fx.orchestrator(fx.config()).run().await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failed_uploads.len(), 1);
    assert_eq!(summary.failed_uploads[0].object_key, PHOTO_KEY);
    assert!(summary.failed_uploads[0].error.contains("bad token"));
    assert!(!summary.is_complete());
    assert_eq!(fx.output(), document());

    let record = read_checkpoint(&fx.path("migration_progress.json"))
        .get(PHOTO_KEY)
        .unwrap();
    assert_eq!(*record.status(), UploadStatus::Failed);
}

#[tokio::test]
async fn test_ambiguous_key_is_left_unrewritten() {
    let fx = Fixture::new(&["photo-1.png", "photo-2.png"]);

    let summary = fx.orchestrator(fx.config()).run().await.unwrap();

    assert_eq!(summary.ambiguous, 1);
    assert_eq!(summary.ambiguous_keys, vec![PHOTO_KEY.to_string()]);
    assert_eq!(summary.uploaded, 0);
    assert_eq!(fx.output(), document());
}

#[tokio::test]
async fn test_interrupt_stops_before_rewriting() {
    let fx = Fixture::new(&["photo.png"]);
    let flag = InterruptFlag::new();
    flag.interrupt();
    let mut orchestrator = fx.orchestrator(fx.config()).with_interrupt(flag);

    let err = orchestrator.run().await.unwrap_err();

    match err.kind() {
        RelinkErrorKind::Migration(e) => {
            assert_eq!(e.kind, MigrationErrorKind::Interrupted(0))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(orchestrator.state(), MigrationState::Failed);
    assert!(!fx.path("export_migrated.json").exists());
    assert_eq!(fx.store.put_count(), 0);
}

#[tokio::test]
async fn test_interrupt_during_upload_lets_running_job_finish() {
    let urls = [firebase_url("a.png"), firebase_url("b.png")];
    let fx = Fixture::with_document(&["a.png", "b.png"], &document_with(&urls));
    let flag = InterruptFlag::new();
    let store: Arc<dyn ObjectStore> = Arc::new(InterruptingStore {
        inner: fx.store.clone(),
        flag: flag.clone(),
    });
    let mut config = fx.config();
    config.concurrency = 1;
    let mut orchestrator = MigrationOrchestrator::new(config)
        .with_store(store)
        .with_interrupt(flag);

    let err = orchestrator.run().await.unwrap_err();

    match err.kind() {
        RelinkErrorKind::Migration(e) => {
            assert_eq!(e.kind, MigrationErrorKind::Interrupted(1))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.store.put_count(), 1);
    assert_eq!(fx.store.keys(), vec!["a.png".to_string()]);

    let checkpoint = read_checkpoint(&fx.path("migration_progress.json"));
    assert_eq!(
        *checkpoint.get("a.png").unwrap().status(),
        UploadStatus::Uploaded
    );
    assert!(checkpoint.get("b.png").is_none());
    assert!(!fx.path("export_migrated.json").exists());
}

#[tokio::test]
async fn test_colliding_target_names_get_distinct_keys() {
    let urls = [firebase_url("photo%201.png"), firebase_url("photo_1.png")];
    let fx = Fixture::with_document(&["photo 1.png", "photo_1.png"], &document_with(&urls));

    let summary = fx.orchestrator(fx.config()).run().await.unwrap();

    assert_eq!(summary.resolved, 2);
    assert_eq!(summary.uploaded, 2);
    assert_eq!(summary.links_rewritten, 2);
    assert_eq!(
        fx.store.keys(),
        vec!["photo_1-2.png".to_string(), "photo_1.png".to_string()]
    );
    assert_eq!(fx.store.object("photo_1.png").unwrap().0, b"bytes of photo_1.png");
    assert_eq!(
        fx.store.object("photo_1-2.png").unwrap().0,
        b"bytes of photo 1.png"
    );

    let output = fx.output();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(
        value[0]["children"][0]["string"],
        "![](https://pub-xxx.example/photo_1-2.png)"
    );
    assert_eq!(
        value[0]["children"][1]["string"],
        "![](https://pub-xxx.example/photo_1.png)"
    );
}

#[test]
fn test_plan_renames_colliding_target_keys() {
    let urls = [firebase_url("photo%201.png"), firebase_url("photo_1.png")];
    let fx = Fixture::with_document(&["photo 1.png", "photo_1.png"], &document_with(&urls));

    let plan = fx.orchestrator(fx.config()).plan().unwrap();

    let targets: Vec<_> = plan
        .jobs()
        .iter()
        .map(|job| (job.entry().display_name().clone(), job.target_key().clone()))
        .collect();
    assert_eq!(
        targets,
        vec![
            ("photo 1.png".to_string(), Some("photo_1-2.png".to_string())),
            ("photo_1.png".to_string(), None),
        ]
    );
}

#[tokio::test]
async fn test_summary_counts_keys_and_files_separately() {
    let urls = [
        firebase_url("photo-image-44306.png"),
        firebase_url("photo.png"),
        firebase_url("photo.png"),
    ];
    let fx = Fixture::with_document(&["photo.png"], &document_with(&urls));

    let summary = fx.orchestrator(fx.config()).run().await.unwrap();

    assert_eq!(summary.references, 3);
    assert_eq!(summary.distinct_keys, 2);
    assert_eq!(summary.resolved, 2);
    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.links_rewritten, 3);
    assert_eq!(fx.store.put_count(), 1);
}

#[tokio::test]
async fn test_output_over_input_is_refused() {
    let fx = Fixture::new(&["photo.png"]);
    let mut config = fx.config();
    config.paths.output = Some(fx.path("export.json"));

    let err = fx.orchestrator(config).run().await.unwrap_err();

    assert!(matches!(
        err.kind(),
        RelinkErrorKind::Migration(e) if matches!(e.kind, MigrationErrorKind::OutputIsInput(_))
    ));
    assert_eq!(
        std::fs::read_to_string(fx.path("export.json")).unwrap(),
        document()
    );
}

#[tokio::test]
async fn test_failed_preflight_is_fatal() {
    let fx = Fixture::new(&["photo.png"]);
    fx.store
        .deny_access(StoreErrorKind::PermissionDenied("expired".to_string()));

    let err = fx.orchestrator(fx.config()).run().await.unwrap_err();

    assert!(matches!(
        err.kind(),
        RelinkErrorKind::Migration(e) if matches!(e.kind, MigrationErrorKind::Preflight(_))
    ));
    assert_eq!(fx.store.put_count(), 0);
}

#[test]
fn test_plan_groups_keys_by_file_without_side_effects() {
    let fx = Fixture::new(&["photo.png"]);
    let mut orchestrator = fx.orchestrator(fx.config());

    let plan = orchestrator.plan().unwrap();

    assert_eq!(orchestrator.state(), MigrationState::ReferencesExtracted);
    assert_eq!(plan.references().len(), 2);
    assert_eq!(plan.jobs().len(), 1);
    assert_eq!(plan.jobs()[0].object_keys(), &vec![PHOTO_KEY.to_string()]);
    assert!(plan.resolutions()[PHOTO_KEY].is_resolved());
    assert!(!fx.path("migration_progress.json").exists());
    assert!(!fx.path("export_migrated.json").exists());
}

#[test]
fn test_config_file_overrides_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("relink.toml");
    std::fs::write(
        &path,
        r#"
concurrency = 8

[target]
bucket = "roam-media"
public_url = "https://cdn.example"

[naming]
mode = "content_hash"
"#,
    )
    .unwrap();

    let config = MigrationConfig::from_file(&path).unwrap();

    assert_eq!(config.concurrency, 8);
    assert_eq!(config.target.bucket.as_deref(), Some("roam-media"));
    assert_eq!(config.target.timeout_secs, 60);
    assert_eq!(config.retry.max_retries, 3);
    assert_eq!(config.naming_mode(), relink::NamingMode::ContentHash);
    assert!(config.validate(true).is_err());
}
