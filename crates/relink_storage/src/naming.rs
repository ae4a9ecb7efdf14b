//! Target object naming.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Characters escaped when a key is placed in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Hex digits of the content digest kept in hashed names.
const HASH_PREFIX_LEN: usize = 16;

/// How target object keys are derived from local files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum NamingMode {
    /// Keep the local file name, optionally cleaned
    #[display("original (clean: {})", clean)]
    Original {
        /// Apply [`clean_filename`]
        clean: bool,
    },
    /// Name objects by a SHA-256 prefix of their content
    #[display("content hash")]
    ContentHash,
}

impl Default for NamingMode {
    fn default() -> Self {
        Self::Original { clean: true }
    }
}

impl NamingMode {
    /// Whether deriving a key needs the file content.
    pub fn needs_content(&self) -> bool {
        matches!(self, Self::ContentHash)
    }

    /// Target key for a file named `display_name`.
    ///
    /// `data` is only consulted in [`NamingMode::ContentHash`]; callers check
    /// [`NamingMode::needs_content`] first. A missing `data` then falls back
    /// to the cleaned name.
    pub fn target_key(&self, display_name: &str, extension: &str, data: Option<&[u8]>) -> String {
        match (self, data) {
            (Self::Original { clean: false }, _) => display_name.to_string(),
            (Self::ContentHash, Some(data)) => content_hash_name(data, extension),
            _ => clean_filename(display_name),
        }
    }
}

/// Replace characters that are awkward in object keys and URLs.
///
/// Spaces, commas and semicolons become `_`, brackets, parentheses and `#`
/// are dropped, `&` becomes `and`, and runs of `_` collapse. The extension is
/// kept as is. A name that would clean down to nothing is returned unchanged.
///
/// # Examples
///
/// ```
/// use relink_storage::clean_filename;
///
/// assert_eq!(clean_filename("My Photo (1).png"), "My_Photo_1.png");
/// assert_eq!(clean_filename("Q&A, notes #2.pdf"), "QandA_notes_2.pdf");
/// ```
pub fn clean_filename(name: &str) -> String {
    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    };

    let mut cleaned = String::with_capacity(stem.len());
    for c in stem.chars() {
        match c {
            ' ' | ',' | ';' => cleaned.push('_'),
            '(' | ')' | '[' | ']' | '#' => {}
            '&' => cleaned.push_str("and"),
            other => cleaned.push(other),
        }
    }

    let mut collapsed = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }
    let stem = collapsed.trim_matches('_');

    if stem.is_empty() {
        return name.to_string();
    }
    format!("{stem}{extension}")
}

/// Content-addressed key: a SHA-256 prefix plus the extension.
pub fn content_hash_name(data: &[u8], extension: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = format!("{:x}", hasher.finalize());
    let prefix = &digest[..HASH_PREFIX_LEN];
    if extension.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}.{extension}")
    }
}

/// First `{stem}-{n}{extension}` variant of `key` not in `taken`, counting
/// from 2.
///
/// # Examples
///
/// ```
/// use relink_storage::numbered_key;
/// use std::collections::BTreeSet;
///
/// let taken = BTreeSet::from(["photo.png".to_string(), "photo-2.png".to_string()]);
/// assert_eq!(numbered_key("photo.png", &taken), "photo-3.png");
/// ```
pub fn numbered_key(key: &str, taken: &BTreeSet<String>) -> String {
    let (stem, extension) = match key.rfind('.') {
        Some(dot) if dot > 0 => key.split_at(dot),
        _ => (key, ""),
    };
    (2..)
        .map(|n| format!("{stem}-{n}{extension}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| key.to_string())
}

/// Public URL of `key` under `base_url`.
///
/// # Examples
///
/// ```
/// use relink_storage::public_url;
///
/// assert_eq!(
///     public_url("https://pub-xxx.example/", "photo.png"),
///     "https://pub-xxx.example/photo.png"
/// );
/// ```
pub fn public_url(base_url: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        encode_key(key)
    )
}

/// Percent-encode a key for use as a single URL path segment.
pub(crate) fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, PATH_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_collapses_underscores() {
        assert_eq!(clean_filename("a  ,; b.png"), "a_b.png");
        assert_eq!(clean_filename("[draft] plan.docx"), "draft_plan.docx");
    }

    #[test]
    fn clean_keeps_unnameable_files() {
        assert_eq!(clean_filename("().png"), "().png");
        assert_eq!(clean_filename(".hidden"), ".hidden");
    }

    #[test]
    fn hash_names_are_stable() {
        let a = content_hash_name(b"same bytes", "png");
        let b = content_hash_name(b"same bytes", "png");
        assert_eq!(a, b);
        assert_eq!(a.len(), HASH_PREFIX_LEN + 4);
        assert_ne!(a, content_hash_name(b"other bytes", "png"));
        assert_eq!(content_hash_name(b"x", "").len(), HASH_PREFIX_LEN);
    }

    #[test]
    fn target_key_per_mode() {
        let original = NamingMode::Original { clean: false };
        assert_eq!(original.target_key("My Photo.png", "png", None), "My Photo.png");
        assert_eq!(
            NamingMode::default().target_key("My Photo.png", "png", None),
            "My_Photo.png"
        );
        let hashed = NamingMode::ContentHash.target_key("My Photo.png", "png", Some(b"data"));
        assert!(hashed.ends_with(".png"));
        assert!(!hashed.contains("Photo"));
    }

    #[test]
    fn numbered_keys_skip_taken_names() {
        let mut taken = BTreeSet::from(["photo_1.png".to_string()]);
        assert_eq!(numbered_key("photo_1.png", &taken), "photo_1-2.png");
        taken.insert("photo_1-2.png".to_string());
        assert_eq!(numbered_key("photo_1.png", &taken), "photo_1-3.png");
        assert_eq!(numbered_key("README", &taken), "README-2");
        assert_eq!(numbered_key(".hidden", &taken), ".hidden-2");
    }

    #[test]
    fn url_escapes_spaces() {
        assert_eq!(
            public_url("https://cdn.example", "My Photo.png"),
            "https://cdn.example/My%20Photo.png"
        );
    }
}
