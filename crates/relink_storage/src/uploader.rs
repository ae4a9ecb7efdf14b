//! Upload of resolved local files to the target store.

use crate::{content_type_for, public_url, MediaKind, NamingMode, ObjectStore, StoreResult};
use derive_getters::Getters;
use relink_checkpoint::UploadCheckpoint;
use relink_core::{CatalogEntry, UploadRecord};
use relink_error::{RelinkResult, RetryableError, StoreError, UploadError, UploadErrorKind};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_retry2::{strategy::jitter, strategy::ExponentialBackoff, Retry, RetryError};
use tracing::{debug, info, instrument, warn};

/// Overrides for the per-error retry strategy.
///
/// Each store error kind carries its own backoff parameters (see
/// [`RetryableError::retry_strategy_params`]). Fields set here replace the
/// corresponding parameter for every error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: Option<usize>,
    /// Initial backoff in milliseconds
    pub initial_backoff_ms: Option<u64>,
    /// Cap on a single backoff delay in seconds
    pub max_delay_secs: Option<u64>,
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: Some(0),
            ..Self::default()
        }
    }

    fn strategy_for(&self, err: &StoreError) -> (u64, usize, u64) {
        let (initial_ms, retries, max_delay_secs) = err.retry_strategy_params();
        (
            self.initial_backoff_ms.unwrap_or(initial_ms),
            self.max_retries.unwrap_or(retries),
            self.max_delay_secs.unwrap_or(max_delay_secs),
        )
    }
}

/// One local file to upload and every object key that resolved to it.
#[derive(Debug, Clone, Getters)]
pub struct UploadJob {
    /// Object keys sharing this file
    object_keys: Vec<String>,
    /// Resolved local file
    entry: CatalogEntry,
    /// Target key fixed at planning time, replacing the naming mode's choice
    target_key: Option<String>,
}

impl UploadJob {
    /// Create a job for `entry`.
    pub fn new(object_keys: Vec<String>, entry: CatalogEntry) -> Self {
        Self {
            object_keys,
            entry,
            target_key: None,
        }
    }

    /// Write the file under `target_key` instead of the derived name.
    pub fn with_target_key(mut self, target_key: impl Into<String>) -> Self {
        self.target_key = Some(target_key.into());
        self
    }
}

/// What happened to the file of an [`UploadJob`].
#[derive(Debug, Clone, derive_more::Display)]
pub enum UploadOutcome {
    /// Every key was already uploaded in a previous run
    #[display("checkpointed")]
    Checkpointed,
    /// Target object existed; nothing transferred
    #[display("already present")]
    AlreadyPresent,
    /// Transferred and verified
    #[display("uploaded after {} attempt(s)", attempts)]
    Uploaded {
        /// PUT attempts made
        attempts: u32,
    },
    /// Gave up; records are marked failed
    #[display("failed: {}", error)]
    Failed {
        /// Final error
        error: UploadError,
        /// PUT attempts made
        attempts: u32,
    },
}

/// Result of [`Uploader::upload`].
#[derive(Debug, Clone, Getters)]
pub struct UploadReport {
    /// Object keys of the job
    object_keys: Vec<String>,
    /// Local file of the job
    source_path: PathBuf,
    /// Key written at the target, `None` when nothing was attempted
    target_key: Option<String>,
    /// Outcome for the keys processed in this run
    outcome: UploadOutcome,
    /// Object key to public URL, for every key that may now be rewritten
    rewrites: BTreeMap<String, String>,
}

impl UploadReport {
    /// Whether the file failed to upload.
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, UploadOutcome::Failed { .. })
    }

    /// Keys of the job that cannot be rewritten.
    pub fn failed_keys(&self) -> impl Iterator<Item = &String> {
        self.object_keys
            .iter()
            .filter(|key| !self.rewrites.contains_key(*key))
    }
}

enum Transfer {
    AlreadyPresent,
    Uploaded { attempts: u32 },
}

/// Pushes local files to an [`ObjectStore`] and records every outcome in the
/// checkpoint.
///
/// For each job: keys already uploaded per the checkpoint are skipped; the
/// rest are recorded pending, then the target is checked with `HEAD`. A
/// present object counts as uploaded without transfer. Otherwise the file is
/// `PUT` with a content type inferred from its extension and verified with a
/// second `HEAD`. Transient store errors are retried with exponential backoff.
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    checkpoint: Arc<UploadCheckpoint>,
    public_base_url: String,
    naming: NamingMode,
    retry: RetryPolicy,
}

impl Uploader {
    /// Uploader with default naming and retry behavior.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        checkpoint: Arc<UploadCheckpoint>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            checkpoint,
            public_base_url: public_base_url.into(),
            naming: NamingMode::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the target naming mode.
    pub fn with_naming(mut self, naming: NamingMode) -> Self {
        self.naming = naming;
        self
    }

    /// Set retry overrides.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Target store.
    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    /// Checkpoint receiving the records.
    pub fn checkpoint(&self) -> &UploadCheckpoint {
        &self.checkpoint
    }

    /// Upload one file.
    ///
    /// Store and read failures never surface as `Err`: they become an
    /// [`UploadOutcome::Failed`] and failed records.
    ///
    /// # Errors
    ///
    /// Returns an error only if the checkpoint cannot be written.
    #[instrument(
        skip(self, job),
        fields(
            file = %job.entry().display_name(),
            keys = job.object_keys().len(),
            backend = self.store.backend_name()
        )
    )]
    pub async fn upload(&self, job: &UploadJob) -> RelinkResult<UploadReport> {
        let entry = job.entry();
        let source_path = entry.absolute_path().clone();
        let mut rewrites = BTreeMap::new();

        let mut todo = Vec::new();
        for key in job.object_keys() {
            match self.checkpoint.get(key) {
                Some(record) if record.is_uploaded() => {
                    if let Some(url) = record.target_url() {
                        rewrites.insert(key.clone(), url.clone());
                    }
                }
                previous => todo.push((key.clone(), previous)),
            }
        }

        if todo.is_empty() {
            debug!("Already uploaded in a previous run");
            return Ok(UploadReport {
                object_keys: job.object_keys().clone(),
                source_path,
                target_key: None,
                outcome: UploadOutcome::Checkpointed,
                rewrites,
            });
        }

        // Hashed names need the bytes before the existence check
        let mut data = None;
        if self.naming.needs_content() {
            match read_source(&source_path).await {
                Ok(bytes) => data = Some(bytes),
                Err(error) => {
                    let records = todo
                        .into_iter()
                        .map(|(key, previous)| start_record(key, previous, &source_path))
                        .collect();
                    let outcome = self.fail(records, error, 0).await?;
                    return Ok(UploadReport {
                        object_keys: job.object_keys().clone(),
                        source_path,
                        target_key: None,
                        outcome,
                        rewrites,
                    });
                }
            }
        }

        let target_key = match job.target_key() {
            Some(key) => key.clone(),
            None => self
                .naming
                .target_key(entry.display_name(), entry.extension(), data.as_deref()),
        };
        let target_url = public_url(&self.public_base_url, &target_key);

        let mut records = Vec::with_capacity(todo.len());
        for (key, previous) in todo {
            let record = start_record(key, previous, &source_path).with_target_key(&target_key);
            self.checkpoint.record(record.clone()).await?;
            records.push(record);
        }

        let content_type = content_type_for(entry.extension());
        let outcome = match self
            .transfer(&target_key, &source_path, data, content_type)
            .await
        {
            Ok(transfer) => {
                let (outcome, attempts) = match transfer {
                    Transfer::AlreadyPresent => (UploadOutcome::AlreadyPresent, 0),
                    Transfer::Uploaded { attempts } => {
                        (UploadOutcome::Uploaded { attempts }, attempts)
                    }
                };
                for record in records {
                    rewrites.insert(record.object_key().clone(), target_url.clone());
                    self.checkpoint
                        .record(record.uploaded(&target_key, &target_url, attempts))
                        .await?;
                }
                info!(
                    target_key = %target_key,
                    media_kind = %MediaKind::from_extension(entry.extension()),
                    outcome = %outcome,
                    "File migrated"
                );
                outcome
            }
            Err((error, attempts)) => self.fail(records, error, attempts).await?,
        };

        Ok(UploadReport {
            object_keys: job.object_keys().clone(),
            source_path,
            target_key: Some(target_key),
            outcome,
            rewrites,
        })
    }

    async fn fail(
        &self,
        records: Vec<UploadRecord>,
        error: UploadError,
        attempts: u32,
    ) -> RelinkResult<UploadOutcome> {
        warn!(error = %error.kind, attempts, "Upload failed");
        for record in records {
            self.checkpoint
                .record(record.failed(error.kind.to_string(), attempts))
                .await?;
        }
        Ok(UploadOutcome::Failed { error, attempts })
    }

    async fn transfer(
        &self,
        target_key: &str,
        source_path: &Path,
        data: Option<Vec<u8>>,
        content_type: &str,
    ) -> Result<Transfer, (UploadError, u32)> {
        let (present, _) = self
            .retrying("head", || self.store.head_object(target_key))
            .await
            .map_err(|(e, n)| (upload_failure(e, n), 0))?;
        if present {
            debug!(target_key, "Object already present at target");
            return Ok(Transfer::AlreadyPresent);
        }

        let data = match data {
            Some(data) => data,
            None => read_source(source_path).await.map_err(|e| (e, 0))?,
        };

        let ((), attempts) = self
            .retrying("put", || {
                self.store.put_object(target_key, &data, content_type)
            })
            .await
            .map_err(|(e, n)| (upload_failure(e, n), n))?;

        let (visible, _) = self
            .retrying("verify", || self.store.head_object(target_key))
            .await
            .map_err(|(e, n)| (upload_failure(e, n), attempts))?;
        if !visible {
            return Err((
                UploadError::new(UploadErrorKind::VerificationFailed(target_key.to_string())),
                attempts,
            ));
        }

        Ok(Transfer::Uploaded { attempts })
    }

    /// Run `action`, retrying transient errors.
    ///
    /// The first failure picks the backoff parameters for the rest of the
    /// run. At most `1 + max_retries` calls are made and every retry waits
    /// out a backoff delay first. Returns the value or the last error with
    /// the attempt count.
    async fn retrying<T, F, Fut>(
        &self,
        operation: &'static str,
        mut action: F,
    ) -> Result<(T, u32), (StoreError, u32)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let (initial_ms, max_retries, max_delay_secs) = match action().await {
            Ok(value) => return Ok((value, 1)),
            Err(e) => {
                if !e.is_retryable() {
                    warn!(error = %e, operation, "Permanent store error, failing immediately");
                    return Err((e, 1));
                }

                let (init_ms, retries, delay_secs) = self.retry.strategy_for(&e);
                if retries == 0 {
                    return Err((e, 1));
                }

                info!(
                    error = %e,
                    operation,
                    initial_backoff_ms = init_ms,
                    max_retries = retries,
                    max_delay_secs = delay_secs,
                    "Store call failed, will retry with configured strategy"
                );

                (init_ms, retries, delay_secs)
            }
        };

        let mut retry_strategy = ExponentialBackoff::from_millis(initial_ms)
            .factor(2)
            .max_delay(Duration::from_secs(max_delay_secs))
            .map(jitter)
            .take(max_retries);

        // Retry::spawn calls immediately; the first retry still backs off
        if let Some(delay) = retry_strategy.next() {
            tokio::time::sleep(delay).await;
        }

        let attempts = AtomicU32::new(1);
        let result = Retry::spawn(retry_strategy, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            let call = action();
            async move {
                match call.await {
                    Ok(value) => Ok(value),
                    Err(e) => {
                        if e.is_retryable() {
                            warn!(error = %e, operation, "Store call failed, will retry");
                            Err(RetryError::Transient {
                                err: e,
                                retry_after: None,
                            })
                        } else {
                            warn!(error = %e, operation, "Permanent store error, failing immediately");
                            Err(RetryError::Permanent(e))
                        }
                    }
                }
            }
        })
        .await;

        let attempts = attempts.load(Ordering::SeqCst);
        result.map(|value| (value, attempts)).map_err(|e| (e, attempts))
    }
}

fn start_record(key: String, previous: Option<UploadRecord>, source_path: &Path) -> UploadRecord {
    match previous {
        Some(record) => record.restart(source_path),
        None => UploadRecord::pending(key, source_path),
    }
}

fn upload_failure(err: StoreError, attempts: u32) -> UploadError {
    if err.is_retryable() {
        UploadError::new(UploadErrorKind::RetriesExhausted {
            attempts,
            message: err.kind.to_string(),
        })
    } else {
        UploadError::new(UploadErrorKind::Rejected(err.kind.to_string()))
    }
}

async fn read_source(path: &Path) -> Result<Vec<u8>, UploadError> {
    tokio::fs::read(path).await.map_err(|e| {
        UploadError::new(UploadErrorKind::SourceRead(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })
}
