//! Name normalization and decoration token stripping.

use relink_error::{CatalogError, CatalogErrorKind, RelinkResult};
use regex::Regex;

/// Decoration tokens appended by export and download tooling.
///
/// Patterns apply to the end of a normalized stem, where every run of
/// whitespace or punctuation has already been folded into a single `-`. So
/// `photo (1)`, `photo_1` and `photo-1` all present `-1` to these patterns.
pub const DEFAULT_DECORATION_PATTERNS: &[&str] = &[r"-\d+$", r"-image$"];

/// A file name split into comparison-friendly parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    /// Folded stem, without extension
    pub stem: String,
    /// Lowercased extension without the dot, empty if none
    pub extension: String,
}

impl NormalizedName {
    /// Stem and extension joined back into a key.
    pub fn key(&self) -> String {
        join_key(&self.stem, &self.extension)
    }
}

/// Join a stem and extension into a key.
pub(crate) fn join_key(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{extension}")
    }
}

/// Normalize a file name.
///
/// Lowercases, folds runs of whitespace and punctuation into a single `-`,
/// trims separators from both ends and splits off the extension.
///
/// # Examples
///
/// ```
/// use relink_catalog::normalize;
///
/// let name = normalize("  My Photo (2).PNG ");
/// assert_eq!(name.stem, "my-photo-2");
/// assert_eq!(name.extension, "png");
/// assert_eq!(name.key(), "my-photo-2.png");
/// ```
pub fn normalize(name: &str) -> NormalizedName {
    let trimmed = name.trim();
    let (stem, extension) = split_extension(trimmed);

    let mut folded = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_alphanumeric() {
            folded.extend(c.to_lowercase());
        } else if !folded.ends_with('-') {
            folded.push('-');
        }
    }

    NormalizedName {
        stem: folded.trim_matches('-').to_string(),
        extension: extension.to_lowercase(),
    }
}

/// Split `name` at its last dot when the suffix looks like an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.trim().is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (stem, ext)
        }
        _ => (name, ""),
    }
}

/// Compiled decoration token patterns.
///
/// # Examples
///
/// ```
/// use relink_catalog::DecorationRules;
///
/// let rules = DecorationRules::default();
/// assert_eq!(rules.strip_all("photo-image-44306"), "photo");
/// assert_eq!(rules.strip_steps("photo-image-44306"), vec!["photo-image", "photo"]);
/// ```
#[derive(Debug, Clone)]
pub struct DecorationRules {
    patterns: Vec<Regex>,
}

impl DecorationRules {
    /// Compile decoration patterns.
    ///
    /// # Errors
    ///
    /// Returns a catalog error naming the first pattern that fails to compile.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> RelinkResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| {
                    CatalogError::new(CatalogErrorKind::InvalidDecoration {
                        pattern: p.as_ref().to_string(),
                        message: e.to_string(),
                    })
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Rules that strip nothing.
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Strip one decoration token from the end of `stem`.
    ///
    /// Returns `None` when no pattern matches or stripping would leave nothing.
    pub fn strip_once(&self, stem: &str) -> Option<String> {
        self.patterns.iter().find_map(|pattern| {
            let m = pattern.find(stem)?;
            let rest = stem[..m.start()].trim_end_matches('-');
            (!rest.is_empty()).then(|| rest.to_string())
        })
    }

    /// Every intermediate form produced by repeated stripping, in order.
    pub fn strip_steps(&self, stem: &str) -> Vec<String> {
        let mut steps = Vec::new();
        let mut current = stem.to_string();
        while let Some(next) = self.strip_once(&current) {
            steps.push(next.clone());
            current = next;
        }
        steps
    }

    /// Strip decoration tokens until none remain.
    pub fn strip_all(&self, stem: &str) -> String {
        self.strip_steps(stem)
            .pop()
            .unwrap_or_else(|| stem.to_string())
    }
}

impl Default for DecorationRules {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_DECORATION_PATTERNS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_deterministic_across_separator_styles() {
        let a = normalize("my photo (1).png");
        let b = normalize("my_photo_1.png");
        let c = normalize("My-Photo-1.PNG");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn normalize_keeps_non_extension_dots_in_stem() {
        let name = normalize("v1.2 notes");
        assert_eq!(name.extension, "");
        assert_eq!(name.stem, "v1-2-notes");
    }

    #[test]
    fn normalize_dotfile_has_no_extension() {
        let name = normalize(".png");
        assert_eq!(name.extension, "");
        assert_eq!(name.stem, "png");
    }

    #[test]
    fn strip_once_never_empties_stem() {
        let rules = DecorationRules::default();
        assert_eq!(rules.strip_once("image"), None);
        assert_eq!(rules.strip_once("12345"), None);
    }

    #[test]
    fn strip_handles_parenthesized_counter_after_normalization() {
        let rules = DecorationRules::default();
        let name = normalize("report (3).pdf");
        assert_eq!(rules.strip_all(&name.stem), "report");
    }

    #[test]
    fn custom_rules_replace_defaults() {
        let rules = DecorationRules::new(&[r"-copy$"]).unwrap();
        assert_eq!(rules.strip_all("photo-copy"), "photo");
        assert_eq!(rules.strip_all("photo-1"), "photo-1");
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = DecorationRules::new(&["(unclosed"]).unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }
}
