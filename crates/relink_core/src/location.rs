//! Positions inside a JSON document.

use serde::{Deserialize, Serialize};

/// One step from a JSON container to a child value.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::From,
)]
pub enum PathSegment {
    /// Member of an object
    Key(String),
    /// Element of an array
    Index(usize),
}

/// Path of keys and indices from the document root to a value.
///
/// Renders as an RFC 6901 JSON Pointer, which is also how the path is resolved
/// against a `serde_json::Value`.
///
/// # Examples
///
/// ```
/// use relink_core::{JsonPath, PathSegment};
///
/// let path = JsonPath::root()
///     .child(PathSegment::Index(3))
///     .child(PathSegment::Key("children".to_string()))
///     .child(PathSegment::Index(0))
///     .child(PathSegment::Key("string".to_string()));
/// assert_eq!(path.to_pointer(), "/3/children/0/string");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JsonPath(Vec<PathSegment>);

impl JsonPath {
    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Return a new path extended by one segment.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    /// Push a segment in place.
    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    /// Pop the last segment in place.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// Segments from the root.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Render as a JSON Pointer, escaping `~` and `/` in keys.
    pub fn to_pointer(&self) -> String {
        let mut pointer = String::new();
        for segment in &self.0 {
            pointer.push('/');
            match segment {
                PathSegment::Key(key) => pointer.push_str(&key.replace('~', "~0").replace('/', "~1")),
                PathSegment::Index(index) => pointer.push_str(&index.to_string()),
            }
        }
        pointer
    }
}

impl std::fmt::Display for JsonPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.to_pointer())
        }
    }
}
