//! Media references found in the document.

use crate::JsonPath;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// A single occurrence of a migratable media URL inside the document.
///
/// The same `object_key` may occur at many locations; each occurrence is its
/// own reference and each is rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct MediaReference {
    /// Exact URL text as found in the string value
    raw_value: String,
    /// Asset identifier extracted from the URL (percent-decoded file name)
    object_key: String,
    /// Location of the string value containing the URL
    location: JsonPath,
}

impl MediaReference {
    /// Create a reference.
    pub fn new(
        raw_value: impl Into<String>,
        object_key: impl Into<String>,
        location: JsonPath,
    ) -> Self {
        Self {
            raw_value: raw_value.into(),
            object_key: object_key.into(),
            location,
        }
    }
}
