//! Local media catalog and reference matching.
//!
//! The catalog indexes the files of an export's media folder under three keys
//! (verbatim name, normalized name, decoration-stripped name). The matcher
//! resolves object keys taken from document URLs against those indexes with a
//! tiered strategy and never guesses between multiple candidates.
//!
//! # Example
//!
//! ```
//! use relink_catalog::{DecorationRules, FileCatalog, ListedFile, Matcher};
//!
//! let listing = vec![ListedFile::new("/export/files/photo.png", 1024)];
//! let catalog = FileCatalog::from_listing(listing, DecorationRules::default());
//! let mut matcher = Matcher::new(&catalog);
//!
//! let result = matcher.resolve("photo-image-44306.png");
//! assert_eq!(result.entry().unwrap().display_name(), "photo.png");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod matcher;
mod normalize;

pub use catalog::{CatalogOptions, FileCatalog, ListedFile};
pub use matcher::{Matcher, DEFAULT_MIN_CONTAINMENT_LEN};
pub use normalize::{normalize, DecorationRules, NormalizedName, DEFAULT_DECORATION_PATTERNS};
