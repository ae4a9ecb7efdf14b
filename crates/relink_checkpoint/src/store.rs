//! File-backed checkpoint store.

use crate::CheckpointPolicy;
use relink_core::{UploadRecord, UploadStatus};
use relink_error::{CheckpointError, CheckpointErrorKind, RelinkResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Schema version written to new checkpoint files.
///
/// Bump when the record shape changes; older builds refuse newer files instead
/// of misreading them.
pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

#[derive(Deserialize)]
struct CheckpointFile {
    records: BTreeMap<String, UploadRecord>,
}

#[derive(Serialize)]
struct CheckpointFileRef<'a> {
    version: u32,
    records: &'a BTreeMap<String, UploadRecord>,
}

#[derive(Default)]
struct State {
    records: BTreeMap<String, UploadRecord>,
    dirty: usize,
}

/// Number of records in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckpointCounts {
    /// Attempts started but never committed
    pub pending: usize,
    /// Verified uploads
    pub uploaded: usize,
    /// Permanent failures
    pub failed: usize,
}

/// Durable store of [`UploadRecord`]s keyed by object key.
///
/// Safe to share between upload workers (`&self` methods, internal mutex).
/// With [`CheckpointPolicy::EveryRecord`] a record is on disk before
/// [`UploadCheckpoint::record`] returns. With [`CheckpointPolicy::Batched`]
/// unsaved records are flushed every N records, on [`UploadCheckpoint::flush`]
/// and when the store is dropped.
///
/// File writes run on the blocking pool, one at a time. Records added while a
/// write is in flight are picked up by the next one, so concurrent workers
/// share writes instead of queueing one per record.
pub struct UploadCheckpoint {
    path: PathBuf,
    policy: CheckpointPolicy,
    state: Mutex<State>,
    writer: tokio::sync::Mutex<()>,
}

impl UploadCheckpoint {
    /// Load the checkpoint at `path`, creating an empty one if absent.
    ///
    /// # Errors
    ///
    /// Returns a checkpoint error if the file cannot be read, is corrupt, was
    /// written by a newer schema version, or (when absent) cannot be created.
    #[tracing::instrument(skip(path, policy), fields(path = %path.as_ref().display(), %policy))]
    pub fn load(path: impl AsRef<Path>, policy: CheckpointPolicy) -> RelinkResult<Self> {
        let path = path.as_ref().to_path_buf();

        let records = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                CheckpointError::new(CheckpointErrorKind::Read(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            })?;
            let records = parse(&content)?;
            tracing::info!(records = records.len(), "Resuming from checkpoint");
            records
        } else {
            tracing::debug!("No checkpoint found, starting fresh");
            write_checkpoint(&path, &BTreeMap::new())?;
            BTreeMap::new()
        };

        Ok(Self {
            path,
            policy,
            state: Mutex::new(State { records, dirty: 0 }),
            writer: tokio::sync::Mutex::new(()),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush policy in effect.
    pub fn policy(&self) -> CheckpointPolicy {
        self.policy
    }

    /// Current record for `object_key`.
    pub fn get(&self, object_key: &str) -> Option<UploadRecord> {
        self.lock().records.get(object_key).cloned()
    }

    /// Store a record, replacing any previous record for its key.
    ///
    /// # Errors
    ///
    /// Returns a checkpoint error if the policy required a flush and the write
    /// failed. The record stays in memory and is retried on the next flush.
    #[tracing::instrument(skip(self, record), fields(object_key = %record.object_key(), status = %record.status()))]
    pub async fn record(&self, record: UploadRecord) -> RelinkResult<()> {
        let due = {
            let mut state = self.lock();
            state.records.insert(record.object_key().clone(), record);
            state.dirty += 1;
            self.policy.should_flush(state.dirty)
        };
        if due {
            self.flush().await?;
        }
        Ok(())
    }

    /// Write unsaved records to disk.
    ///
    /// Returns once every record stored before the call is on disk.
    pub async fn flush(&self) -> RelinkResult<()> {
        let _writer = self.writer.lock().await;
        let (records, dirty) = {
            let mut state = self.lock();
            if state.dirty == 0 {
                return Ok(());
            }
            let dirty = std::mem::take(&mut state.dirty);
            (state.records.clone(), dirty)
        };

        let path = self.path.clone();
        let written = match tokio::task::spawn_blocking(move || write_checkpoint(&path, &records))
            .await
        {
            Ok(result) => result,
            Err(e) => Err(CheckpointError::new(CheckpointErrorKind::Write(format!(
                "Checkpoint writer task failed: {}",
                e
            )))
            .into()),
        };
        if let Err(e) = written {
            self.lock().dirty += dirty;
            return Err(e);
        }
        tracing::debug!(records = dirty, "Flushed checkpoint");
        Ok(())
    }

    /// Snapshot of all records, ordered by object key.
    pub fn records(&self) -> Vec<UploadRecord> {
        self.lock().records.values().cloned().collect()
    }

    /// Count records by status.
    pub fn counts(&self) -> CheckpointCounts {
        let state = self.lock();
        let mut counts = CheckpointCounts::default();
        for record in state.records.values() {
            match record.status() {
                UploadStatus::Pending => counts.pending += 1,
                UploadStatus::Uploaded => counts.uploaded += 1,
                UploadStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking worker cannot leave a half-applied insert behind.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for UploadCheckpoint {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if state.dirty == 0 {
            return;
        }
        if let Err(e) = write_checkpoint(&self.path, &state.records) {
            tracing::error!(error = %e, path = %self.path.display(), "Failed to flush checkpoint on shutdown");
        }
    }
}

/// Atomically replace the file at `path` with `records`.
fn write_checkpoint(path: &Path, records: &BTreeMap<String, UploadRecord>) -> RelinkResult<()> {
    let file = CheckpointFileRef {
        version: CHECKPOINT_VERSION,
        records,
    };
    let content = serde_json::to_vec_pretty(&file)
        .map_err(|e| CheckpointError::new(CheckpointErrorKind::Write(e.to_string())))?;

    let write_err = |e: std::io::Error, what: &Path| {
        CheckpointError::new(CheckpointErrorKind::Write(format!(
            "{}: {}",
            what.display(),
            e
        )))
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_err(e, parent))?;
    }

    // Write to temp file first, then rename for atomicity
    let temp_path = temp_path_for(path);
    let mut temp = std::fs::File::create(&temp_path).map_err(|e| write_err(e, &temp_path))?;
    temp.write_all(&content)
        .and_then(|_| temp.sync_all())
        .map_err(|e| write_err(e, &temp_path))?;
    drop(temp);

    std::fs::rename(&temp_path, path).map_err(|e| write_err(e, path))?;
    Ok(())
}

fn parse(content: &str) -> RelinkResult<BTreeMap<String, UploadRecord>> {
    let header: VersionHeader = serde_json::from_str(content)
        .map_err(|e| CheckpointError::new(CheckpointErrorKind::Corrupt(e.to_string())))?;
    if header.version > CHECKPOINT_VERSION {
        return Err(CheckpointError::new(CheckpointErrorKind::UnsupportedVersion {
            found: header.version,
            supported: CHECKPOINT_VERSION,
        })
        .into());
    }
    let file: CheckpointFile = serde_json::from_str(content)
        .map_err(|e| CheckpointError::new(CheckpointErrorKind::Corrupt(e.to_string())))?;
    Ok(file.records)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
