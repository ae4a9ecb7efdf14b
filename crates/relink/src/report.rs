//! Run summary output.

use relink_core::MigrationSummary;
use relink_error::{IoError, JsonError, RelinkResult};
use std::path::Path;
use tracing::{info, warn};

/// Write `summary` as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_summary(summary: &MigrationSummary, path: impl AsRef<Path>) -> RelinkResult<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| JsonError::new("summary", e.to_string()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            IoError::new(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    std::fs::write(path, json)
        .map_err(|e| IoError::new(format!("Failed to write {}: {}", path.display(), e)))?;
    info!(path = %path.display(), "Wrote summary report");
    Ok(())
}

/// Emit the summary through tracing.
pub fn log_summary(summary: &MigrationSummary) {
    info!(
        references = summary.references,
        distinct_keys = summary.distinct_keys,
        resolved = summary.resolved,
        ambiguous = summary.ambiguous,
        unresolved = summary.unresolved,
        uploaded = summary.uploaded,
        already_present = summary.already_present,
        failed = summary.failed,
        links_rewritten = summary.links_rewritten,
        "Migration summary"
    );
    for key in &summary.unresolved_keys {
        warn!(key, "Unresolved");
    }
    for key in &summary.ambiguous_keys {
        warn!(key, "Ambiguous");
    }
    for failure in &summary.failed_uploads {
        warn!(key = %failure.object_key, error = %failure.error, "Upload failed");
    }
}

/// Human-readable summary table.
pub fn render_summary(summary: &MigrationSummary) -> String {
    let mut out = String::new();
    let rows = [
        ("References", summary.references),
        ("Distinct keys", summary.distinct_keys),
        ("Keys resolved", summary.resolved),
        ("Keys ambiguous", summary.ambiguous),
        ("Keys unresolved", summary.unresolved),
        ("Files uploaded", summary.uploaded),
        ("Files already present", summary.already_present),
        ("Files failed", summary.failed),
        ("Links rewritten", summary.links_rewritten),
    ];
    out.push_str(&format!("{:-<40}\n", ""));
    for (label, count) in rows {
        out.push_str(&format!("{:<30}{:>10}\n", label, count));
    }
    out.push_str(&format!("{:-<40}\n", ""));

    let lists = [
        ("Unresolved keys", &summary.unresolved_keys),
        ("Ambiguous keys", &summary.ambiguous_keys),
    ];
    for (label, keys) in lists {
        if !keys.is_empty() {
            out.push_str(&format!("{}:\n", label));
            for key in keys {
                out.push_str(&format!("  {}\n", key));
            }
        }
    }
    if !summary.failed_uploads.is_empty() {
        out.push_str("Failed uploads:\n");
        for failure in &summary.failed_uploads {
            out.push_str(&format!("  {}: {}\n", failure.object_key, failure.error));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use relink_core::FailedUpload;

    #[test]
    fn render_lists_follow_up_keys() {
        let summary = MigrationSummary {
            references: 3,
            unresolved: 1,
            unresolved_keys: vec!["lost.png".to_string()],
            failed: 1,
            failed_uploads: vec![FailedUpload {
                object_key: "big.mp4".to_string(),
                error: "timeout".to_string(),
            }],
            ..MigrationSummary::default()
        };
        let text = render_summary(&summary);
        assert!(text.contains("References"));
        assert!(text.contains("Keys unresolved"));
        assert!(text.contains("Files failed"));
        assert!(text.contains("  lost.png"));
        assert!(text.contains("  big.mp4: timeout"));
        assert!(!text.contains("Ambiguous keys"));
    }

    #[test]
    fn summary_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/summary.json");
        let summary = MigrationSummary {
            links_rewritten: 7,
            ..MigrationSummary::default()
        };
        write_summary(&summary, &path).unwrap();
        let read: MigrationSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, summary);
    }
}
