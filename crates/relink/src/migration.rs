//! Migration orchestration.
//!
//! A run walks the states
//! `Initialized → CatalogBuilt → ReferencesExtracted → UploadsComplete →
//! DocumentRewritten → Done`, landing in `Failed` on any fatal error.
//! Per-reference problems (unresolved, ambiguous, failed uploads) never stop
//! a run; they are counted in the [`MigrationSummary`] and their URLs are left
//! untouched.

use crate::MigrationConfig;
use futures::stream::{self, StreamExt, TryStreamExt};
use relink_catalog::{FileCatalog, Matcher};
use relink_checkpoint::UploadCheckpoint;
use relink_core::{CatalogEntry, FailedUpload, MediaReference, MigrationSummary, ResolutionResult};
use relink_document::{Document, DocumentWalker};
use relink_error::{MigrationError, MigrationErrorKind, RelinkResult};
use relink_storage::{
    numbered_key, NamingMode, ObjectStore, UploadJob, UploadOutcome, UploadReport, Uploader,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, warn};

/// Progress of a migration run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::EnumIter,
    derive_more::Display,
)]
pub enum MigrationState {
    /// Nothing done yet
    #[default]
    #[display("initialized")]
    Initialized,
    /// Local files indexed
    #[display("catalog built")]
    CatalogBuilt,
    /// Document parsed and references collected
    #[display("references extracted")]
    ReferencesExtracted,
    /// Every upload job settled
    #[display("uploads complete")]
    UploadsComplete,
    /// Output document written
    #[display("document rewritten")]
    DocumentRewritten,
    /// Summary produced
    #[display("done")]
    Done,
    /// Stopped on a fatal error
    #[display("failed")]
    Failed,
}

/// Cooperative cancellation shared with a signal handler.
///
/// Setting the flag stops new uploads from starting; in-flight uploads
/// finish and the checkpoint is flushed before the run returns
/// [`MigrationErrorKind::Interrupted`].
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    /// A flag that is not set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request interruption.
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether interruption was requested.
    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything decided before the first upload.
#[derive(Debug)]
pub struct MigrationPlan {
    document: Document,
    references: Vec<MediaReference>,
    resolutions: BTreeMap<String, ResolutionResult>,
    jobs: Vec<UploadJob>,
    summary: MigrationSummary,
}

impl MigrationPlan {
    /// Parsed input document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Every URL occurrence in document order.
    pub fn references(&self) -> &[MediaReference] {
        &self.references
    }

    /// Resolution of each distinct object key.
    pub fn resolutions(&self) -> &BTreeMap<String, ResolutionResult> {
        &self.resolutions
    }

    /// One job per resolved local file.
    pub fn jobs(&self) -> &[UploadJob] {
        &self.jobs
    }

    /// Summary with the reference and resolution counts filled in.
    pub fn summary(&self) -> &MigrationSummary {
        &self.summary
    }

    /// Split into document, references, jobs and summary.
    pub fn into_parts(self) -> (Document, Vec<MediaReference>, Vec<UploadJob>, MigrationSummary) {
        (self.document, self.references, self.jobs, self.summary)
    }
}

/// Drives a migration from catalog to rewritten document.
///
/// # Example
///
/// ```no_run
/// use relink::{MigrationConfig, MigrationOrchestrator};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = MigrationConfig::load(None)?;
/// config.validate(true)?;
/// let mut orchestrator = MigrationOrchestrator::new(config);
/// let summary = orchestrator.run().await?;
/// println!("rewrote {} links", summary.links_rewritten);
/// # Ok(())
/// # }
/// ```
pub struct MigrationOrchestrator {
    config: MigrationConfig,
    store: Option<Arc<dyn ObjectStore>>,
    interrupt: InterruptFlag,
    state: MigrationState,
}

impl MigrationOrchestrator {
    /// Orchestrator using the store described by `config`.
    pub fn new(config: MigrationConfig) -> Self {
        Self {
            config,
            store: None,
            interrupt: InterruptFlag::new(),
            state: MigrationState::Initialized,
        }
    }

    /// Use `store` instead of building one from the configuration.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Observe `flag` for interruption.
    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = flag;
        self
    }

    /// Current state.
    pub fn state(&self) -> MigrationState {
        self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Build the catalog, extract references and resolve every distinct key.
    ///
    /// No uploads happen and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the files folder or document cannot be read, or
    /// the matcher settings are invalid.
    #[instrument(skip(self))]
    pub fn plan(&mut self) -> RelinkResult<MigrationPlan> {
        let result = self.build_plan();
        if result.is_err() {
            self.state = MigrationState::Failed;
        }
        result
    }

    fn build_plan(&mut self) -> RelinkResult<MigrationPlan> {
        let catalog = FileCatalog::build(
            self.config.files_dir()?,
            &self.config.catalog_options(),
            self.config.decoration_rules()?,
        )?;
        for (key, entries) in catalog.ambiguous_keys() {
            debug!(key, files = entries.len(), "Catalog key shared by several files");
        }
        info!(files = catalog.len(), "Catalog built");
        self.state = MigrationState::CatalogBuilt;

        let document = Document::load(self.config.document()?)?;
        let walker = DocumentWalker::new(self.config.url_pattern()?);
        let references = walker.extract_references(document.value());
        info!(references = references.len(), "References extracted");
        self.state = MigrationState::ReferencesExtracted;

        let mut matcher =
            Matcher::new(&catalog).with_min_containment_len(self.config.matcher.min_containment_len);
        let mut resolutions = BTreeMap::new();
        for reference in &references {
            if !resolutions.contains_key(reference.object_key()) {
                let resolution = matcher.resolve(reference.object_key());
                resolutions.insert(reference.object_key().clone(), resolution);
            }
        }

        let mut summary = MigrationSummary {
            references: references.len(),
            distinct_keys: resolutions.len(),
            ..MigrationSummary::default()
        };
        let mut grouped: BTreeMap<PathBuf, (Vec<String>, CatalogEntry)> = BTreeMap::new();
        for (key, resolution) in &resolutions {
            match resolution {
                ResolutionResult::Resolved { entry, tier } => {
                    debug!(key, file = %entry.display_name(), %tier, "Resolved");
                    summary.resolved += 1;
                    grouped
                        .entry(entry.absolute_path().clone())
                        .or_insert_with(|| (Vec::new(), entry.clone()))
                        .0
                        .push(key.clone());
                }
                ResolutionResult::Ambiguous { candidates, tier } => {
                    warn!(key, candidates = candidates.len(), %tier, "Ambiguous match, leaving URL unchanged");
                    summary.ambiguous += 1;
                    summary.ambiguous_keys.push(key.clone());
                }
                ResolutionResult::Unresolved => {
                    warn!(key, "No local file found, leaving URL unchanged");
                    summary.unresolved += 1;
                    summary.unresolved_keys.push(key.clone());
                }
            }
        }

        let jobs = plan_jobs(grouped.into_values().collect(), self.config.naming_mode());
        info!(
            distinct_keys = summary.distinct_keys,
            resolved = summary.resolved,
            ambiguous = summary.ambiguous,
            unresolved = summary.unresolved,
            files = jobs.len(),
            "Resolution complete"
        );

        Ok(MigrationPlan {
            document,
            references,
            resolutions,
            jobs,
            summary,
        })
    }

    /// Run the full migration.
    ///
    /// # Errors
    ///
    /// Returns a fatal error: unreadable inputs, a failed preflight, a
    /// checkpoint or output write failure, or
    /// [`MigrationErrorKind::Interrupted`]. Failed uploads are not errors;
    /// they show up in the summary.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> RelinkResult<MigrationSummary> {
        let result = self.execute().await;
        if let Err(e) = &result {
            warn!(state = %self.state, error = %e, "Migration stopped");
            self.state = MigrationState::Failed;
        }
        result
    }

    async fn execute(&mut self) -> RelinkResult<MigrationSummary> {
        let output = self.config.output_path()?;
        ensure_distinct(self.config.document()?, &output)?;
        let public_url = self.config.public_url()?.to_string();

        let plan = self.build_plan()?;
        let (mut document, references, jobs, mut summary) = plan.into_parts();

        let store = match &self.store {
            Some(store) => store.clone(),
            None => self.config.build_store()?,
        };
        if !jobs.is_empty() {
            store.verify_access().await.map_err(|e| {
                MigrationError::new(MigrationErrorKind::Preflight(e.kind.to_string()))
            })?;
            debug!(backend = store.backend_name(), "Preflight passed");
        }

        let checkpoint = Arc::new(UploadCheckpoint::load(
            self.config.checkpoint_path()?,
            self.config.checkpoint_policy(),
        )?);
        let uploader = Arc::new(
            Uploader::new(store, checkpoint.clone(), public_url)
                .with_naming(self.config.naming_mode())
                .with_retry(self.config.retry_policy()),
        );

        let total = jobs.len();
        let reports = self.upload_all(uploader, jobs).await;
        checkpoint.flush().await?;
        let reports = reports?;

        if self.interrupt.is_interrupted() {
            warn!(completed = reports.len(), total, "Interrupted, checkpoint flushed");
            return Err(MigrationError::new(MigrationErrorKind::Interrupted(reports.len())).into());
        }
        self.state = MigrationState::UploadsComplete;

        let mut mapping = HashMap::new();
        for report in &reports {
            match report.outcome() {
                UploadOutcome::Uploaded { .. } => summary.uploaded += 1,
                UploadOutcome::Checkpointed | UploadOutcome::AlreadyPresent => {
                    summary.already_present += 1
                }
                UploadOutcome::Failed { error, .. } => {
                    summary.failed += 1;
                    summary
                        .failed_uploads
                        .extend(report.failed_keys().map(|key| FailedUpload {
                            object_key: key.clone(),
                            error: error.kind.to_string(),
                        }));
                }
            }
            mapping.extend(
                report
                    .rewrites()
                    .iter()
                    .map(|(key, url)| (key.clone(), url.clone())),
            );
        }
        summary
            .failed_uploads
            .sort_by(|a, b| a.object_key.cmp(&b.object_key));

        let walker = DocumentWalker::new(self.config.url_pattern()?);
        let stats = walker.apply_rewrites(document.value_mut(), &references, &mapping)?;
        summary.links_rewritten = stats.links_rewritten;
        document.save(&output, stats.links_rewritten > 0, self.config.output_format)?;
        info!(output = %output.display(), links = stats.links_rewritten, "Document rewritten");
        self.state = MigrationState::DocumentRewritten;

        if let Some(report_path) = &self.config.paths.report {
            crate::write_summary(&summary, report_path)?;
        }
        self.state = MigrationState::Done;
        Ok(summary)
    }

    /// Upload every job on a bounded pool until done or interrupted.
    async fn upload_all(
        &self,
        uploader: Arc<Uploader>,
        jobs: Vec<UploadJob>,
    ) -> RelinkResult<Vec<UploadReport>> {
        let interrupt = self.interrupt.clone();
        stream::iter(jobs)
            .take_while(move |_| futures::future::ready(!interrupt.is_interrupted()))
            .map(|job| {
                let uploader = uploader.clone();
                async move { uploader.upload(&job).await }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .try_collect()
            .await
    }
}

/// One job per file, with colliding target keys made distinct.
///
/// Name-derived keys can collide when different files clean to the same name
/// or share a name in different folders. The file whose name already equals
/// the key keeps it, then the lowest path; the others get numbered keys.
/// Content-hashed keys only collide for identical bytes and are left alone.
fn plan_jobs(groups: Vec<(Vec<String>, CatalogEntry)>, naming: NamingMode) -> Vec<UploadJob> {
    if naming.needs_content() {
        return groups
            .into_iter()
            .map(|(keys, entry)| UploadJob::new(keys, entry))
            .collect();
    }

    let mut by_target: BTreeMap<String, Vec<(Vec<String>, CatalogEntry)>> = BTreeMap::new();
    for (keys, entry) in groups {
        let target = naming.target_key(entry.display_name(), entry.extension(), None);
        by_target.entry(target).or_default().push((keys, entry));
    }

    let mut taken: BTreeSet<String> = by_target.keys().cloned().collect();
    let mut jobs = Vec::new();
    for (target, mut group) in by_target {
        group.sort_by(|(_, a), (_, b)| {
            (a.display_name() != &target)
                .cmp(&(b.display_name() != &target))
                .then_with(|| a.absolute_path().cmp(b.absolute_path()))
        });
        let mut group = group.into_iter();
        if let Some((keys, entry)) = group.next() {
            jobs.push(UploadJob::new(keys, entry));
        }
        for (keys, entry) in group {
            let renamed = numbered_key(&target, &taken);
            warn!(
                file = %entry.absolute_path().display(),
                target_key = %target,
                renamed = %renamed,
                "Target key already taken by another file, renaming"
            );
            taken.insert(renamed.clone());
            jobs.push(UploadJob::new(keys, entry).with_target_key(renamed));
        }
    }
    jobs.sort_by(|a, b| a.entry().absolute_path().cmp(b.entry().absolute_path()));
    jobs
}

/// Refuse to write the output over the input document.
fn ensure_distinct(document: &Path, output: &Path) -> RelinkResult<()> {
    if canonical(document) == canonical(output) {
        return Err(MigrationError::new(MigrationErrorKind::OutputIsInput(
            output.display().to_string(),
        ))
        .into());
    }
    Ok(())
}

/// Canonical form of a path that may not exist yet.
fn canonical(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            parent
                .canonicalize()
                .map(|p| p.join(name))
                .unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}
