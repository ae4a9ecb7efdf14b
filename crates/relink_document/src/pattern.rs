//! Recognition of migratable URLs inside text.

use percent_encoding::percent_decode_str;
use regex::Regex;
use relink_error::{DocumentError, DocumentErrorKind, RelinkResult};
use serde::{Deserialize, Serialize};

/// Host serving the encrypted Roam uploads.
pub const DEFAULT_SOURCE_HOST: &str = "firebasestorage.googleapis.com";

/// Marker appended to encrypted object names.
pub const DEFAULT_ENCRYPTED_SUFFIX: &str = ".enc";

/// Characters that end a URL inside block markup.
///
/// Parentheses may appear in object names; an unbalanced `)` is cut off
/// after matching (see [`balance_parentheses`]).
const URL_BODY: &str = r#"[^\s<>"'{}\[\]]+"#;

/// Punctuation dropped from the end of a match, as in "see <url>."
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!'];

/// What a migratable URL looks like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSignature {
    /// Host name of the source store
    pub host: String,
    /// Suffix the object name must end with
    pub encrypted_suffix: String,
}

impl Default for SourceSignature {
    fn default() -> Self {
        Self {
            host: DEFAULT_SOURCE_HOST.to_string(),
            encrypted_suffix: DEFAULT_ENCRYPTED_SUFFIX.to_string(),
        }
    }
}

/// Compiled matcher for migratable URLs.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    regex: Regex,
    signature: SourceSignature,
}

impl Default for UrlPattern {
    fn default() -> Self {
        let signature = SourceSignature::default();
        let regex = Regex::new(&url_regex(&signature.host)).expect("Valid default URL regex");
        Self { regex, signature }
    }
}

fn url_regex(host: &str) -> String {
    format!(r"(?i)https?://{}/{}", regex::escape(host), URL_BODY)
}

impl UrlPattern {
    /// Compile a pattern for `signature`.
    ///
    /// # Errors
    ///
    /// Returns a document error if the host is empty or contains a scheme or
    /// path.
    pub fn new(signature: SourceSignature) -> RelinkResult<Self> {
        let host = signature.host.trim();
        if host.is_empty() || host.contains('/') || host.contains(char::is_whitespace) {
            return Err(DocumentError::new(DocumentErrorKind::InvalidSignature(format!(
                "host must be a bare domain, got {:?}",
                signature.host
            )))
            .into());
        }
        let regex = Regex::new(&url_regex(host)).map_err(|e| {
            DocumentError::new(DocumentErrorKind::InvalidSignature(e.to_string()))
        })?;
        Ok(Self { regex, signature })
    }

    /// Signature this pattern was built from.
    pub fn signature(&self) -> &SourceSignature {
        &self.signature
    }

    /// Every migratable URL in `text`, in order, with its byte span.
    pub fn find<'t>(&self, text: &'t str) -> Vec<(std::ops::Range<usize>, &'t str)> {
        self.regex
            .find_iter(text)
            .filter_map(|m| {
                let url = balance_parentheses(m.as_str()).trim_end_matches(TRAILING_PUNCTUATION);
                if self.is_encrypted(url) {
                    Some((m.start()..m.start() + url.len(), url))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Replace URLs in `text` for which `replacement` returns a new URL.
    ///
    /// `replacement` receives the raw URL and its object key. Returns the new
    /// text and the number of URLs replaced.
    pub fn replace<F>(&self, text: &str, mut replacement: F) -> (String, usize)
    where
        F: FnMut(&str, &str) -> Option<String>,
    {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut replaced = 0;
        for (span, url) in self.find(text) {
            let Some(key) = self.object_key(url) else {
                continue;
            };
            if let Some(new_url) = replacement(url, &key) {
                out.push_str(&text[last..span.start]);
                out.push_str(&new_url);
                last = span.end;
                replaced += 1;
            }
        }
        out.push_str(&text[last..]);
        (out, replaced)
    }

    /// Object key of a source URL.
    ///
    /// The key is the last segment of the object name (after `/o/`), percent
    /// decoded, with the query and the encrypted suffix removed:
    /// `.../o/imgs%2Fapp%2Fphoto.png.enc?alt=media` gives `photo.png`.
    ///
    /// # Examples
    ///
    /// ```
    /// use relink_document::UrlPattern;
    ///
    /// let pattern = UrlPattern::default();
    /// let url = "https://firebasestorage.googleapis.com/v0/b/proj/o/abc%2Fphoto-image-44306.png.enc?alt=media&token=t";
    /// assert_eq!(pattern.object_key(url).as_deref(), Some("photo-image-44306.png"));
    /// ```
    pub fn object_key(&self, url: &str) -> Option<String> {
        let path = strip_query(url);
        let object = match path.rfind("/o/") {
            Some(idx) => &path[idx + 3..],
            None => path.rsplit('/').next().unwrap_or(path),
        };
        let decoded = percent_decode_str(object).decode_utf8_lossy();
        let name = decoded.rsplit('/').next().unwrap_or(&*decoded);
        let name = strip_suffix_ignore_case(name, &self.signature.encrypted_suffix)?;
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    fn is_encrypted(&self, url: &str) -> bool {
        let path = strip_query(url);
        let decoded = percent_decode_str(path).decode_utf8_lossy();
        strip_suffix_ignore_case(&decoded, &self.signature.encrypted_suffix).is_some()
    }
}

/// Cut `url` at the first `)` with no matching `(` before it, as when the
/// URL closes `![](...)` or a parenthesized remark.
fn balance_parentheses(url: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in url.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return &url[..i],
            ')' => depth -= 1,
            _ => {}
        }
    }
    url
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    if suffix.is_empty() {
        return Some(s);
    }
    let split = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = s.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}
