//! File catalog construction and lookup.

use crate::normalize::{join_key, normalize, DecorationRules};
use derive_getters::Getters;
use relink_core::CatalogEntry;
use relink_error::{CatalogError, CatalogErrorKind, RelinkResult};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One file from a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ListedFile {
    path: PathBuf,
    size_bytes: u64,
}

impl ListedFile {
    /// Create a listing entry.
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
        }
    }
}

/// Options for walking the media folder.
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Include files whose name starts with a dot
    pub include_hidden: bool,
}

/// Read-only index of local candidate files.
///
/// Entries are indexed by verbatim file name, normalized key and
/// decoration-stripped base key. A key shared by several entries is kept as a
/// list and reported by [`FileCatalog::ambiguous_keys`]; lookups return every
/// entry under a key and leave the choice to the caller.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, Vec<usize>>,
    by_normalized: HashMap<String, Vec<usize>>,
    by_base: HashMap<String, Vec<usize>>,
    rules: DecorationRules,
}

impl FileCatalog {
    /// Build a catalog by listing `root`.
    ///
    /// # Errors
    ///
    /// Returns a catalog error if `root` is not a readable directory. Entries
    /// below the root that cannot be read are logged and skipped.
    #[tracing::instrument(skip(root, options, rules), fields(root = %root.as_ref().display(), recursive = options.recursive))]
    pub fn build(
        root: impl AsRef<Path>,
        options: &CatalogOptions,
        rules: DecorationRules,
    ) -> RelinkResult<Self> {
        let listing = list_files(root.as_ref(), options)?;
        Ok(Self::from_listing(listing, rules))
    }

    /// Build a catalog from an externally produced listing.
    pub fn from_listing(listing: Vec<ListedFile>, rules: DecorationRules) -> Self {
        let mut catalog = Self {
            entries: Vec::with_capacity(listing.len()),
            by_name: HashMap::new(),
            by_normalized: HashMap::new(),
            by_base: HashMap::new(),
            rules,
        };

        for file in listing {
            let Some(display_name) = file.path.file_name().map(|n| n.to_string_lossy().to_string())
            else {
                continue;
            };
            let name = normalize(&display_name);
            let base_key = join_key(&catalog.rules.strip_all(&name.stem), &name.extension);
            let entry = CatalogEntry::new(
                file.path,
                display_name.clone(),
                name.key(),
                base_key.clone(),
                name.extension.clone(),
                file.size_bytes,
            );

            let index = catalog.entries.len();
            catalog.by_name.entry(display_name).or_default().push(index);
            catalog.by_normalized.entry(name.key()).or_default().push(index);
            catalog.by_base.entry(base_key).or_default().push(index);
            catalog.entries.push(entry);
        }

        let ambiguous = catalog.ambiguous_keys().len();
        tracing::info!(
            files = catalog.entries.len(),
            normalized_keys = catalog.by_normalized.len(),
            ambiguous_keys = ambiguous,
            "Built file catalog"
        );
        if ambiguous > 0 {
            tracing::warn!(
                ambiguous_keys = ambiguous,
                "Some files share a normalized name and will not be matched by it"
            );
        }

        catalog
    }

    /// All entries, in listing order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog holds no files.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decoration rules used to compute base keys.
    pub fn rules(&self) -> &DecorationRules {
        &self.rules
    }

    /// Entries whose file name equals `name` verbatim.
    pub fn by_display_name(&self, name: &str) -> Vec<&CatalogEntry> {
        self.collect(self.by_name.get(name))
    }

    /// Entries whose normalized key equals `key`.
    pub fn by_normalized_key(&self, key: &str) -> Vec<&CatalogEntry> {
        self.collect(self.by_normalized.get(key))
    }

    /// Entries whose decoration-stripped key equals `key`.
    pub fn by_base_key(&self, key: &str) -> Vec<&CatalogEntry> {
        self.collect(self.by_base.get(key))
    }

    /// Normalized keys shared by more than one file, sorted by key.
    pub fn ambiguous_keys(&self) -> BTreeMap<&str, Vec<&CatalogEntry>> {
        self.by_normalized
            .iter()
            .filter(|(_, indices)| indices.len() > 1)
            .map(|(key, indices)| (key.as_str(), self.collect(Some(indices))))
            .collect()
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<&CatalogEntry> {
        indices
            .map(|indices| indices.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }
}

/// List regular files under `root`, sorted by path.
fn list_files(root: &Path, options: &CatalogOptions) -> RelinkResult<Vec<ListedFile>> {
    if !root.is_dir() {
        return Err(CatalogError::new(CatalogErrorKind::NotADirectory(
            root.display().to_string(),
        ))
        .into());
    }
    std::fs::read_dir(root).map_err(|e| {
        CatalogError::new(CatalogErrorKind::Unreadable(format!(
            "{}: {}",
            root.display(),
            e
        )))
    })?;

    let mut walker = WalkDir::new(root).follow_links(true).sort_by_file_name();
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let include_hidden = options.include_hidden;
    let mut listing = Vec::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || include_hidden || !is_hidden(e.file_name()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable catalog entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match entry.metadata() {
            Ok(metadata) => listing.push(ListedFile::new(entry.into_path(), metadata.len())),
            Err(e) => tracing::warn!(path = %entry.path().display(), error = %e, "Skipping file without metadata"),
        }
    }

    tracing::debug!(files = listing.len(), "Listed catalog root");
    Ok(listing)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
