//! Content type inference from file extensions.

/// Broad category of a media file, used for logging and reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, derive_more::Display,
)]
pub enum MediaKind {
    /// Raster or vector image
    #[display("image")]
    Image,
    /// Audio recording
    #[display("audio")]
    Audio,
    /// Video recording
    #[display("video")]
    Video,
    /// Office document, PDF or plain text
    #[display("document")]
    Document,
    /// Compressed archive
    #[display("archive")]
    Archive,
    /// Anything else
    #[display("other")]
    Other,
}

const FALLBACK: &str = "application/octet-stream";

const TABLE: &[(&str, &str, MediaKind)] = &[
    ("png", "image/png", MediaKind::Image),
    ("jpg", "image/jpeg", MediaKind::Image),
    ("jpeg", "image/jpeg", MediaKind::Image),
    ("gif", "image/gif", MediaKind::Image),
    ("webp", "image/webp", MediaKind::Image),
    ("svg", "image/svg+xml", MediaKind::Image),
    ("heic", "image/heic", MediaKind::Image),
    ("pdf", "application/pdf", MediaKind::Document),
    ("mp4", "video/mp4", MediaKind::Video),
    ("mov", "video/quicktime", MediaKind::Video),
    ("webm", "video/webm", MediaKind::Video),
    ("mp3", "audio/mpeg", MediaKind::Audio),
    ("wav", "audio/wav", MediaKind::Audio),
    ("m4a", "audio/mp4", MediaKind::Audio),
    ("ogg", "audio/ogg", MediaKind::Audio),
    ("doc", "application/msword", MediaKind::Document),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        MediaKind::Document,
    ),
    ("xls", "application/vnd.ms-excel", MediaKind::Document),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        MediaKind::Document,
    ),
    ("txt", "text/plain", MediaKind::Document),
    ("csv", "text/csv", MediaKind::Document),
    ("json", "application/json", MediaKind::Document),
    ("zip", "application/zip", MediaKind::Archive),
];

fn lookup(extension: &str) -> Option<&'static (&'static str, &'static str, MediaKind)> {
    let extension = extension.trim_start_matches('.');
    TABLE
        .iter()
        .find(|(ext, _, _)| ext.eq_ignore_ascii_case(extension))
}

/// MIME type for a file extension (with or without the leading dot).
///
/// Unknown extensions map to `application/octet-stream`.
///
/// # Examples
///
/// ```
/// use relink_storage::content_type_for;
///
/// assert_eq!(content_type_for("PNG"), "image/png");
/// assert_eq!(content_type_for(".pdf"), "application/pdf");
/// assert_eq!(content_type_for("xyz"), "application/octet-stream");
/// ```
pub fn content_type_for(extension: &str) -> &'static str {
    lookup(extension).map(|(_, mime, _)| *mime).unwrap_or(FALLBACK)
}

impl MediaKind {
    /// Category for a file extension.
    pub fn from_extension(extension: &str) -> Self {
        lookup(extension)
            .map(|(_, _, kind)| *kind)
            .unwrap_or(MediaKind::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_kind_but_other_has_an_extension() {
        for kind in MediaKind::iter().filter(|k| *k != MediaKind::Other) {
            assert!(TABLE.iter().any(|(_, _, k)| *k == kind), "{kind} unused");
        }
    }

    #[test]
    fn office_types() {
        assert_eq!(content_type_for("doc"), "application/msword");
        assert!(content_type_for("xlsx").contains("spreadsheetml"));
        assert_eq!(MediaKind::from_extension("docx"), MediaKind::Document);
    }

    #[test]
    fn missing_extension_falls_back() {
        assert_eq!(content_type_for(""), FALLBACK);
        assert_eq!(MediaKind::from_extension(""), MediaKind::Other);
    }
}
