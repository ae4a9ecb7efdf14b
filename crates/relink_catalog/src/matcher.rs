//! Tiered resolution of object keys to catalog entries.

use crate::catalog::FileCatalog;
use crate::normalize::{join_key, normalize};
use percent_encoding::percent_decode_str;
use relink_core::{CatalogEntry, MatchTier, ResolutionResult};
use std::collections::HashMap;

/// Shortest stem allowed to take part in a containment match.
pub const DEFAULT_MIN_CONTAINMENT_LEN: usize = 4;

/// Resolves object keys against a [`FileCatalog`].
///
/// Tiers are tried in order and the first tier that finds any candidate
/// decides the outcome:
///
/// 1. **Exact** - the key, or its percent-decoded form, equals a file name.
/// 2. **Normalized** - normalized key equals a normalized file name.
/// 3. **Suffix-stripped** - decoration tokens are stripped from the key one
///    at a time, retrying tier 2 after each; finally the fully stripped key is
///    compared with each file's stripped key.
/// 4. **Containment** - the stripped stem contains, or is contained in,
///    exactly one file's stripped stem with the same extension.
///
/// More than one candidate at a tier yields [`ResolutionResult::Ambiguous`].
/// Results are cached per key, so repeated occurrences share one outcome.
pub struct Matcher<'a> {
    catalog: &'a FileCatalog,
    min_containment_len: usize,
    cache: HashMap<String, ResolutionResult>,
}

impl<'a> Matcher<'a> {
    /// Create a matcher over `catalog`.
    pub fn new(catalog: &'a FileCatalog) -> Self {
        Self {
            catalog,
            min_containment_len: DEFAULT_MIN_CONTAINMENT_LEN,
            cache: HashMap::new(),
        }
    }

    /// Set the minimum stem length for containment matches.
    pub fn with_min_containment_len(mut self, len: usize) -> Self {
        self.min_containment_len = len;
        self
    }

    /// Resolve `object_key`, reusing a cached result when available.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&mut self, object_key: &str) -> ResolutionResult {
        if let Some(cached) = self.cache.get(object_key) {
            return cached.clone();
        }
        let result = self.resolve_uncached(object_key);
        match &result {
            ResolutionResult::Resolved { entry, tier } => {
                tracing::debug!(%tier, file = %entry.display_name(), "Resolved object key");
            }
            ResolutionResult::Ambiguous { candidates, tier } => {
                tracing::warn!(%tier, candidates = candidates.len(), "Ambiguous object key");
            }
            ResolutionResult::Unresolved => {
                tracing::debug!("No local file for object key");
            }
        }
        self.cache.insert(object_key.to_string(), result.clone());
        result
    }

    fn resolve_uncached(&self, object_key: &str) -> ResolutionResult {
        let decoded = percent_decode_str(object_key).decode_utf8_lossy().to_string();

        // Tier 1
        let mut exact = self.catalog.by_display_name(object_key);
        if exact.is_empty() && decoded != object_key {
            exact = self.catalog.by_display_name(&decoded);
        }
        if let Some(result) = decide(exact, MatchTier::Exact) {
            return result;
        }

        // Tier 2
        let name = normalize(&decoded);
        if let Some(result) = decide(
            self.catalog.by_normalized_key(&name.key()),
            MatchTier::Normalized,
        ) {
            return result;
        }

        // Tier 3
        let rules = self.catalog.rules();
        for stem in rules.strip_steps(&name.stem) {
            let key = join_key(&stem, &name.extension);
            if let Some(result) = decide(
                self.catalog.by_normalized_key(&key),
                MatchTier::SuffixStripped,
            ) {
                return result;
            }
        }
        let base_stem = rules.strip_all(&name.stem);
        let base_key = join_key(&base_stem, &name.extension);
        if let Some(result) = decide(
            self.catalog.by_base_key(&base_key),
            MatchTier::SuffixStripped,
        ) {
            return result;
        }

        // Tier 4
        if base_stem.chars().count() < self.min_containment_len {
            return ResolutionResult::Unresolved;
        }
        let contained = self
            .catalog
            .entries()
            .iter()
            .filter(|entry| extensions_compatible(&name.extension, entry.extension()))
            .filter(|entry| {
                let candidate = entry.base_stem();
                candidate.chars().count() >= self.min_containment_len
                    && (candidate.contains(base_stem.as_str()) || base_stem.contains(candidate))
            })
            .collect::<Vec<_>>();
        decide(contained, MatchTier::Containment).unwrap_or(ResolutionResult::Unresolved)
    }
}

/// Turn a tier's candidates into a result, or `None` to fall through.
fn decide(candidates: Vec<&CatalogEntry>, tier: MatchTier) -> Option<ResolutionResult> {
    match candidates.len() {
        0 => None,
        1 => Some(ResolutionResult::Resolved {
            entry: candidates[0].clone(),
            tier,
        }),
        _ => Some(ResolutionResult::Ambiguous {
            candidates: candidates.into_iter().cloned().collect(),
            tier,
        }),
    }
}

fn extensions_compatible(key_extension: &str, entry_extension: &str) -> bool {
    key_extension.is_empty() || entry_extension.is_empty() || key_extension == entry_extension
}
