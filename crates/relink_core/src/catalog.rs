//! Local file catalog entries.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One discovered local file.
///
/// Keys are computed once by the catalog from `display_name` and never change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Getters)]
pub struct CatalogEntry {
    /// Absolute path of the file on disk
    absolute_path: PathBuf,
    /// Original file name
    display_name: String,
    /// Lowercased, separator-folded name including the extension
    normalized_key: String,
    /// `normalized_key` with all decoration tokens stripped
    base_key: String,
    /// Lowercased extension without the dot, empty if none
    extension: String,
    /// File size in bytes
    size_bytes: u64,
}

impl CatalogEntry {
    /// Create a catalog entry from precomputed keys.
    pub fn new(
        absolute_path: impl Into<PathBuf>,
        display_name: impl Into<String>,
        normalized_key: impl Into<String>,
        base_key: impl Into<String>,
        extension: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            display_name: display_name.into(),
            normalized_key: normalized_key.into(),
            base_key: base_key.into(),
            extension: extension.into(),
            size_bytes,
        }
    }

    /// Normalized key without its extension.
    pub fn normalized_stem(&self) -> &str {
        strip_extension(&self.normalized_key, &self.extension)
    }

    /// Base key without its extension.
    pub fn base_stem(&self) -> &str {
        strip_extension(&self.base_key, &self.extension)
    }
}

fn strip_extension<'a>(key: &'a str, extension: &str) -> &'a str {
    if extension.is_empty() {
        return key;
    }
    key.strip_suffix(extension)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_drop_extension() {
        let entry = CatalogEntry::new("/x/Photo-image.PNG", "Photo-image.PNG", "photo-image.png", "photo.png", "png", 3);
        assert_eq!(entry.normalized_stem(), "photo-image");
        assert_eq!(entry.base_stem(), "photo");
    }

    #[test]
    fn stems_without_extension_are_unchanged() {
        let entry = CatalogEntry::new("/x/README", "README", "readme", "readme", "", 1);
        assert_eq!(entry.normalized_stem(), "readme");
    }
}
