//! Migration configuration.
//!
//! Configuration is layered, later sources overriding earlier ones:
//! - Bundled defaults (include_str! from relink.toml)
//! - `~/.config/relink/relink.toml`
//! - `./relink.toml`
//! - An explicit file (`--config`)
//! - `RELINK_*` environment variables (`__` separates sections)
//!
//! Command-line flags are applied on top by the binary.

use config::{Config, Environment, File, FileFormat};
use relink_catalog::{CatalogOptions, DecorationRules};
use relink_checkpoint::CheckpointPolicy;
use relink_document::{OutputFormat, SourceSignature, UrlPattern};
use relink_error::{ConfigError, RelinkError, RelinkResult};
use relink_storage::{FileSystemStore, HttpObjectStore, NamingMode, ObjectStore, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../relink.toml");

/// File name used for the default checkpoint.
pub const DEFAULT_CHECKPOINT_NAME: &str = "migration_progress.json";

/// Input and output locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Export media folder
    pub files_dir: Option<PathBuf>,
    /// Export JSON document
    pub document: Option<PathBuf>,
    /// Rewritten document, defaults to `<document stem>_migrated.json`
    pub output: Option<PathBuf>,
    /// Checkpoint file, defaults to `migration_progress.json` beside the document
    pub checkpoint: Option<PathBuf>,
    /// Optional JSON summary report
    pub report: Option<PathBuf>,
    /// Upload into this directory instead of a remote store
    pub target_dir: Option<PathBuf>,
}

/// Target object store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Generic endpoint serving `{endpoint}/{bucket}/{key}`
    pub endpoint: Option<String>,
    /// Cloudflare account id, selects the R2 REST API
    pub account_id: Option<String>,
    /// Bucket name
    pub bucket: Option<String>,
    /// Bearer token
    pub token: Option<String>,
    /// Base of the rewritten URLs
    pub public_url: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            account_id: None,
            bucket: None,
            token: None,
            public_url: None,
            timeout_secs: 60,
        }
    }
}

/// How target keys are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingModeConfig {
    /// Local file name
    #[default]
    Original,
    /// SHA-256 prefix of the content
    ContentHash,
}

/// Target naming settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Naming mode
    pub mode: NamingModeConfig,
    /// Clean awkward characters from original names
    pub clean_filenames: bool,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            mode: NamingModeConfig::Original,
            clean_filenames: true,
        }
    }
}

/// Retry settings for store calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Initial backoff override in milliseconds
    pub initial_backoff_ms: Option<u64>,
    /// Backoff cap override in seconds
    pub max_delay_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: None,
            max_delay_secs: None,
        }
    }
}

/// Checkpoint flush settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CheckpointPolicyConfig {
    /// Flush after this many records (1 = every record)
    pub flush_every: usize,
}

impl Default for CheckpointPolicyConfig {
    fn default() -> Self {
        Self { flush_every: 1 }
    }
}

/// Matcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Regexes stripped from normalized stems
    pub decoration_patterns: Vec<String>,
    /// Shortest stem considered by containment matching
    pub min_containment_len: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            decoration_patterns: relink_catalog::DEFAULT_DECORATION_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            min_containment_len: relink_catalog::DEFAULT_MIN_CONTAINMENT_LEN,
        }
    }
}

/// Complete migration configuration.
///
/// # Example
///
/// ```no_run
/// use relink::MigrationConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = MigrationConfig::load(None)?;
/// println!("concurrency: {}", config.concurrency);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Upload workers
    pub concurrency: usize,
    /// Walk the media folder recursively
    pub recursive: bool,
    /// Serialization of a changed document
    pub output_format: OutputFormat,
    /// Input and output locations
    pub paths: PathsConfig,
    /// Target store
    pub target: TargetConfig,
    /// Target naming
    pub naming: NamingConfig,
    /// Retry behavior
    pub retry: RetryConfig,
    /// Checkpoint flushing
    pub checkpoint_policy: CheckpointPolicyConfig,
    /// Matcher tuning
    pub matcher: MatcherConfig,
    /// Source URL signature
    pub source: SourceSignature,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            recursive: false,
            output_format: OutputFormat::Pretty,
            paths: PathsConfig::default(),
            target: TargetConfig::default(),
            naming: NamingConfig::default(),
            retry: RetryConfig::default(),
            checkpoint_policy: CheckpointPolicyConfig::default(),
            matcher: MatcherConfig::default(),
            source: SourceSignature::default(),
        }
    }
}

fn config_error(context: &str, e: config::ConfigError) -> RelinkError {
    RelinkError::from(ConfigError::new(format!("{}: {}", context, e)))
}

impl MigrationConfig {
    /// Load configuration from all sources.
    ///
    /// `explicit` is required to exist when given; the other files are
    /// optional.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed or a value has the wrong
    /// type.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> RelinkResult<Self> {
        debug!("Loading configuration with precedence: env > explicit > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/relink/relink.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("relink").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("RELINK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .map_err(|e| config_error("Failed to build configuration", e))?
            .try_deserialize()
            .map_err(|e| config_error("Failed to parse configuration", e))
    }

    /// Bundled defaults overlaid with a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> RelinkResult<Self> {
        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                config_error(
                    &format!("Failed to read configuration from {}", path.as_ref().display()),
                    e,
                )
            })?
            .try_deserialize()
            .map_err(|e| config_error("Failed to parse configuration", e))
    }

    /// Check that everything a run needs is present.
    ///
    /// `needs_target` adds the target store fields; planning does not need
    /// them.
    ///
    /// # Errors
    ///
    /// Returns a configuration error listing every missing or invalid field.
    pub fn validate(&self, needs_target: bool) -> RelinkResult<()> {
        let mut problems = Vec::new();

        if self.paths.document.is_none() {
            problems.push("paths.document is required".to_string());
        }
        if self.paths.files_dir.is_none() {
            problems.push("paths.files_dir is required".to_string());
        }
        if self.concurrency == 0 {
            problems.push("concurrency must be at least 1".to_string());
        }

        if needs_target {
            if is_blank(&self.target.public_url) {
                problems.push("target.public_url is required".to_string());
            }
            if self.paths.target_dir.is_none() {
                if is_blank(&self.target.account_id) && is_blank(&self.target.endpoint) {
                    problems.push(
                        "target.account_id or target.endpoint is required (or paths.target_dir)"
                            .to_string(),
                    );
                }
                if is_blank(&self.target.bucket) {
                    problems.push("target.bucket is required".to_string());
                }
                if is_blank(&self.target.token) {
                    problems.push("target.token is required".to_string());
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::invalid(problems).into())
        }
    }

    /// Export document path.
    pub fn document(&self) -> RelinkResult<&Path> {
        self.paths
            .document
            .as_deref()
            .ok_or_else(|| ConfigError::new("paths.document is required").into())
    }

    /// Media folder path.
    pub fn files_dir(&self) -> RelinkResult<&Path> {
        self.paths
            .files_dir
            .as_deref()
            .ok_or_else(|| ConfigError::new("paths.files_dir is required").into())
    }

    /// Output path, defaulting to `<document stem>_migrated.json`.
    pub fn output_path(&self) -> RelinkResult<PathBuf> {
        if let Some(output) = &self.paths.output {
            return Ok(output.clone());
        }
        let document = self.document()?;
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        Ok(document.with_file_name(format!("{}_migrated.json", stem)))
    }

    /// Checkpoint path, defaulting to a file beside the document.
    pub fn checkpoint_path(&self) -> RelinkResult<PathBuf> {
        if let Some(checkpoint) = &self.paths.checkpoint {
            return Ok(checkpoint.clone());
        }
        Ok(self.document()?.with_file_name(DEFAULT_CHECKPOINT_NAME))
    }

    /// Catalog walk options.
    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            recursive: self.recursive,
            include_hidden: false,
        }
    }

    /// Compiled decoration rules.
    pub fn decoration_rules(&self) -> RelinkResult<DecorationRules> {
        DecorationRules::new(self.matcher.decoration_patterns.as_slice())
    }

    /// Compiled source URL pattern.
    pub fn url_pattern(&self) -> RelinkResult<UrlPattern> {
        UrlPattern::new(self.source.clone())
    }

    /// Checkpoint flush policy.
    pub fn checkpoint_policy(&self) -> CheckpointPolicy {
        CheckpointPolicy::from_flush_every(self.checkpoint_policy.flush_every)
    }

    /// Retry overrides for the uploader.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: Some(self.retry.max_retries),
            initial_backoff_ms: self.retry.initial_backoff_ms,
            max_delay_secs: self.retry.max_delay_secs,
        }
    }

    /// Target naming mode.
    pub fn naming_mode(&self) -> NamingMode {
        match self.naming.mode {
            NamingModeConfig::Original => NamingMode::Original {
                clean: self.naming.clean_filenames,
            },
            NamingModeConfig::ContentHash => NamingMode::ContentHash,
        }
    }

    /// Base of the rewritten URLs.
    pub fn public_url(&self) -> RelinkResult<&str> {
        self.target
            .public_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::new("target.public_url is required").into())
    }

    /// Build the configured target store.
    ///
    /// A `paths.target_dir` wins over remote settings; otherwise an
    /// `account_id` selects Cloudflare R2 and an `endpoint` a generic store.
    ///
    /// # Errors
    ///
    /// Returns an error if required target fields are missing or the client
    /// cannot be built.
    pub fn build_store(&self) -> RelinkResult<Arc<dyn ObjectStore>> {
        if let Some(dir) = &self.paths.target_dir {
            return Ok(Arc::new(FileSystemStore::new(dir)?));
        }

        let bucket = required(&self.target.bucket, "target.bucket")?;
        let token = required(&self.target.token, "target.token")?;
        let timeout = Duration::from_secs(self.target.timeout_secs.max(1));

        if let Some(account_id) = self.target.account_id.as_deref().filter(|s| !s.trim().is_empty()) {
            return Ok(Arc::new(HttpObjectStore::cloudflare(
                account_id, bucket, token, timeout,
            )?));
        }
        let endpoint = required(&self.target.endpoint, "target.account_id or target.endpoint")?;
        Ok(Arc::new(HttpObjectStore::new(endpoint, bucket, token, timeout)?))
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> RelinkResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::new(format!("{} is required", name)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_defaults_match_struct_defaults() {
        let bundled: MigrationConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(bundled, MigrationConfig::default());
    }

    #[test]
    fn default_paths_sit_beside_the_document() {
        let mut config = MigrationConfig::default();
        config.paths.document = Some(PathBuf::from("/exports/backup.json"));
        assert_eq!(
            config.output_path().unwrap(),
            PathBuf::from("/exports/backup_migrated.json")
        );
        assert_eq!(
            config.checkpoint_path().unwrap(),
            PathBuf::from("/exports/migration_progress.json")
        );
    }

    #[test]
    fn validation_lists_every_problem() {
        let err = MigrationConfig::default().validate(true).unwrap_err();
        let message = err.to_string();
        for field in ["paths.document", "paths.files_dir", "target.public_url", "target.bucket", "target.token"] {
            assert!(message.contains(field), "{field} missing from {message}");
        }
        assert!(MigrationConfig::default().validate(false).is_err());
    }

    #[test]
    fn target_dir_replaces_remote_settings() {
        let mut config = MigrationConfig::default();
        config.paths.document = Some(PathBuf::from("doc.json"));
        config.paths.files_dir = Some(PathBuf::from("files"));
        config.paths.target_dir = Some(PathBuf::from("bucket"));
        config.target.public_url = Some("https://cdn.example".to_string());
        config.validate(true).unwrap();
    }

    #[test]
    fn naming_mode_from_config() {
        let mut config = MigrationConfig::default();
        assert_eq!(config.naming_mode(), NamingMode::Original { clean: true });
        config.naming.mode = NamingModeConfig::ContentHash;
        assert_eq!(config.naming_mode(), NamingMode::ContentHash);
    }
}
