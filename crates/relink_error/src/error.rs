//! Top-level error wrapper types.

use crate::{
    CatalogError, CheckpointError, ConfigError, DocumentError, IoError, JsonError,
    MigrationError, StoreError, UploadError,
};

/// The foundation error enum, one variant per domain error.
///
/// # Examples
///
/// ```
/// use relink_error::{IoError, RelinkError};
///
/// let io_err = IoError::new("Permission denied");
/// let err: RelinkError = io_err.into();
/// assert!(format!("{}", err).contains("IO Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum RelinkErrorKind {
    /// Filesystem error
    #[from(IoError)]
    Io(IoError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// File catalog error
    #[from(CatalogError)]
    Catalog(CatalogError),
    /// Checkpoint store error
    #[from(CheckpointError)]
    Checkpoint(CheckpointError),
    /// Object store error
    #[from(StoreError)]
    Store(StoreError),
    /// Upload error
    #[from(UploadError)]
    Upload(UploadError),
    /// Document error
    #[from(DocumentError)]
    Document(DocumentError),
    /// Migration run error
    #[from(MigrationError)]
    Migration(MigrationError),
}

/// Relink error with kind discrimination.
///
/// # Examples
///
/// ```
/// use relink_error::{ConfigError, RelinkResult};
///
/// fn might_fail() -> RelinkResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Relink Error: {}", _0)]
pub struct RelinkError(Box<RelinkErrorKind>);

impl RelinkError {
    /// Create a new error from a kind.
    pub fn new(kind: RelinkErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RelinkErrorKind {
        &self.0
    }

    /// Whether this error should abort a migration run.
    ///
    /// Store and upload errors are per-file and never fatal on their own.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self.kind(),
            RelinkErrorKind::Store(_) | RelinkErrorKind::Upload(_)
        )
    }
}

// Generic From implementation for any type that converts to RelinkErrorKind
impl<T> From<T> for RelinkError
where
    T: Into<RelinkErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Relink operations.
pub type RelinkResult<T> = std::result::Result<T, RelinkError>;
