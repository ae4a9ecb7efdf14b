//! Media URL extraction and rewriting for Roam JSON exports.
//!
//! A Roam export is one large JSON document. Media links live inside string
//! values, either bare or wrapped in block markup such as `![](url)` or
//! `{{[[pdf]]: url}}`. This crate finds those links ([`UrlPattern`]), records
//! where each occurrence lives ([`DocumentWalker::extract_references`]) and
//! later substitutes new URLs at exactly those places
//! ([`DocumentWalker::apply_rewrites`]) without touching anything else.
//!
//! # Example
//!
//! ```
//! use relink_document::{DocumentWalker, UrlPattern};
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! let url = "https://firebasestorage.googleapis.com/v0/b/p/o/imgs%2Fphoto.png.enc?alt=media";
//! let mut doc = json!([{ "title": "Page", "children": [{ "string": format!("![]({url})") }] }]);
//!
//! let walker = DocumentWalker::new(UrlPattern::default());
//! let references = walker.extract_references(&doc);
//! assert_eq!(references[0].object_key(), "photo.png");
//!
//! let mapping = HashMap::from([("photo.png".to_string(), "https://cdn.example/photo.png".to_string())]);
//! let stats = walker.apply_rewrites(&mut doc, &references, &mapping).unwrap();
//! assert_eq!(stats.links_rewritten, 1);
//! assert_eq!(doc[0]["children"][0]["string"], "![](https://cdn.example/photo.png)");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod pattern;
mod walker;

pub use document::{Document, OutputFormat};
pub use pattern::{SourceSignature, UrlPattern, DEFAULT_ENCRYPTED_SUFFIX, DEFAULT_SOURCE_HOST};
pub use walker::{DocumentWalker, RewriteStats};
