//! Traversal of the document tree.

use crate::UrlPattern;
use relink_core::{JsonPath, MediaReference, PathSegment};
use relink_error::{DocumentError, DocumentErrorKind, RelinkResult};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument};

/// Counters from [`DocumentWalker::apply_rewrites`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// URL occurrences replaced
    pub links_rewritten: usize,
    /// String values that changed
    pub strings_changed: usize,
    /// References left alone because their key had no new URL
    pub unmapped: usize,
}

/// Finds media references in a document and rewrites them in place.
///
/// Only string values are scanned; object keys, numbers and the shape of the
/// tree are never touched.
#[derive(Debug, Clone)]
pub struct DocumentWalker {
    pattern: UrlPattern,
}

impl DocumentWalker {
    /// Walker using `pattern` to recognize URLs.
    pub fn new(pattern: UrlPattern) -> Self {
        Self { pattern }
    }

    /// URL pattern in use.
    pub fn pattern(&self) -> &UrlPattern {
        &self.pattern
    }

    /// Every media URL occurrence in the document, in document order.
    #[instrument(skip_all)]
    pub fn extract_references(&self, document: &Value) -> Vec<MediaReference> {
        let mut references = Vec::new();
        let mut path = JsonPath::root();
        self.visit(document, &mut path, &mut references);
        debug!(count = references.len(), "Extracted media references");
        references
    }

    fn visit(&self, value: &Value, path: &mut JsonPath, out: &mut Vec<MediaReference>) {
        match value {
            Value::String(text) => {
                for (_, url) in self.pattern.find(text) {
                    if let Some(key) = self.pattern.object_key(url) {
                        out.push(MediaReference::new(url, key, path.clone()));
                    }
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    path.push(PathSegment::Index(index));
                    self.visit(item, path, out);
                    path.pop();
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    path.push(PathSegment::Key(key.clone()));
                    self.visit(item, path, out);
                    path.pop();
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    /// Replace the URLs of `references` whose object key is in `mapping`.
    ///
    /// `mapping` goes from object key to the new public URL. Each location
    /// is rewritten once: every recognized URL in that string with a mapped
    /// key is replaced, other text stays byte for byte.
    ///
    /// # Errors
    ///
    /// Returns a document error if a reference location no longer holds a
    /// string with the expected URL, which means the references came from a
    /// different document.
    #[instrument(skip_all, fields(references = references.len(), mapped = mapping.len()))]
    pub fn apply_rewrites(
        &self,
        document: &mut Value,
        references: &[MediaReference],
        mapping: &HashMap<String, String>,
    ) -> RelinkResult<RewriteStats> {
        let mut stats = RewriteStats::default();
        let mut locations = BTreeSet::new();

        for reference in references {
            if !mapping.contains_key(reference.object_key()) {
                stats.unmapped += 1;
                continue;
            }
            let pointer = reference.location().to_pointer();
            let slot = document.pointer_mut(&pointer).ok_or_else(|| {
                DocumentError::new(DocumentErrorKind::StaleLocation(pointer.clone()))
            })?;
            match slot {
                Value::String(text) if text.contains(reference.raw_value().as_str()) => {}
                _ => {
                    return Err(DocumentError::new(DocumentErrorKind::StaleLocation(format!(
                        "{} does not contain {}",
                        pointer,
                        reference.raw_value()
                    )))
                    .into());
                }
            }
            locations.insert(pointer);
        }

        for pointer in locations {
            if let Some(Value::String(text)) = document.pointer_mut(&pointer) {
                let (rewritten, replaced) = self
                    .pattern
                    .replace(text, |_, key| mapping.get(key).cloned());
                if replaced > 0 {
                    *text = rewritten;
                    stats.links_rewritten += replaced;
                    stats.strings_changed += 1;
                }
            }
        }

        debug!(
            links_rewritten = stats.links_rewritten,
            strings_changed = stats.strings_changed,
            unmapped = stats.unmapped,
            "Applied rewrites"
        );
        Ok(stats)
    }
}

impl Default for DocumentWalker {
    fn default() -> Self {
        Self::new(UrlPattern::default())
    }
}
