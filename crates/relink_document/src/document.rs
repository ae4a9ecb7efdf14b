//! Loading and saving the export document.

use relink_error::{DocumentError, DocumentErrorKind, RelinkResult};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Serialization used when the document changed.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    strum::EnumString,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Two-space indentation
    #[default]
    #[display("pretty")]
    Pretty,
    /// No whitespace
    #[display("compact")]
    Compact,
}

/// A parsed export document plus the bytes it came from.
///
/// Object member order is preserved on output.
#[derive(Debug, Clone)]
pub struct Document {
    source_path: PathBuf,
    raw: Vec<u8>,
    value: Value,
}

impl Document {
    /// Read and parse the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns a document error if the file cannot be read or is not JSON.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> RelinkResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|e| {
            DocumentError::new(DocumentErrorKind::Read(format!("{}: {}", path.display(), e)))
        })?;
        let value = serde_json::from_slice(&raw).map_err(|e| {
            DocumentError::new(DocumentErrorKind::Parse(format!("{}: {}", path.display(), e)))
        })?;
        info!(bytes = raw.len(), "Loaded document");
        Ok(Self {
            source_path: path.to_path_buf(),
            raw,
            value,
        })
    }

    /// Path the document was read from.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Parsed tree.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Parsed tree, for rewriting.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Write the document to `output`.
    ///
    /// With `changed == false` the original bytes are copied unchanged;
    /// otherwise the tree is serialized in `format`. The file is written to a
    /// temporary sibling and renamed into place, so `output` is either the old
    /// file or the complete new one.
    ///
    /// # Errors
    ///
    /// Returns a document error if serialization or any filesystem step fails.
    #[instrument(skip(self, output), fields(output = %output.as_ref().display()))]
    pub fn save(
        &self,
        output: impl AsRef<Path>,
        changed: bool,
        format: OutputFormat,
    ) -> RelinkResult<()> {
        let output = output.as_ref();
        let serialized;
        let bytes: &[u8] = if changed {
            serialized = match format {
                OutputFormat::Pretty => serde_json::to_vec_pretty(&self.value),
                OutputFormat::Compact => serde_json::to_vec(&self.value),
            }
            .map_err(|e| DocumentError::new(DocumentErrorKind::Serialize(e.to_string())))?;
            &serialized
        } else {
            &self.raw
        };

        write_atomic(output, bytes)?;
        info!(bytes = bytes.len(), changed, "Saved document");
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> RelinkResult<()> {
    let write_err = |e: std::io::Error, what: &Path| {
        DocumentError::new(DocumentErrorKind::Write(format!("{}: {}", what.display(), e)))
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_err(e, parent))?;
    }

    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    let temp_path = path.with_file_name(name);

    let mut file = std::fs::File::create(&temp_path).map_err(|e| write_err(e, &temp_path))?;
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(|e| write_err(e, &temp_path))?;
    drop(file);

    std::fs::rename(&temp_path, path).map_err(|e| write_err(e, path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn format_parses_from_cli_text() {
        assert_eq!(OutputFormat::from_str("compact").unwrap(), OutputFormat::Compact);
        assert_eq!(OutputFormat::default().to_string(), "pretty");
    }
}
