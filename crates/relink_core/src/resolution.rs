//! Match outcomes.

use crate::CatalogEntry;
use serde::{Deserialize, Serialize};

/// Matcher tier that produced a result.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Decoded key equals a file name verbatim
    #[display("exact")]
    Exact,
    /// Normalized key equals a normalized file name
    #[display("normalized")]
    Normalized,
    /// Keys agree after stripping decoration tokens
    #[display("suffix_stripped")]
    SuffixStripped,
    /// Exactly one file name contains or is contained by the key
    #[display("containment")]
    Containment,
}

/// Outcome of resolving an object key against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionResult {
    /// Exactly one catalog entry matched
    Resolved {
        /// The matching file
        entry: CatalogEntry,
        /// Tier that found it
        tier: MatchTier,
    },
    /// More than one catalog entry matched at the same tier
    Ambiguous {
        /// All candidates at that tier
        candidates: Vec<CatalogEntry>,
        /// Tier that found them
        tier: MatchTier,
    },
    /// No tier matched
    Unresolved,
}

impl ResolutionResult {
    /// The resolved entry, if any.
    pub fn entry(&self) -> Option<&CatalogEntry> {
        match self {
            ResolutionResult::Resolved { entry, .. } => Some(entry),
            _ => None,
        }
    }

    /// Whether the key resolved to a single file.
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionResult::Resolved { .. })
    }

    /// Whether more than one file matched.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolutionResult::Ambiguous { .. })
    }
}
