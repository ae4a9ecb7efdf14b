//! Checkpoint inspection.

use relink::{CheckpointPolicy, RelinkResult, UploadCheckpoint, UploadStatus};
use relink_error::JsonError;
use std::path::Path;

/// Print record counts and failed keys of a checkpoint.
///
/// A missing checkpoint is reported, not created.
pub fn show_status(checkpoint: &Path, json_output: bool) -> RelinkResult<()> {
    if !checkpoint.exists() {
        println!("No checkpoint at {}", checkpoint.display());
        return Ok(());
    }

    let store = UploadCheckpoint::load(checkpoint, CheckpointPolicy::EveryRecord)?;
    let counts = store.counts();
    let failed = store
        .records()
        .into_iter()
        .filter(|record| *record.status() == UploadStatus::Failed)
        .collect::<Vec<_>>();

    if json_output {
        let output = serde_json::json!({
            "path": checkpoint,
            "pending": counts.pending,
            "uploaded": counts.uploaded,
            "failed": counts.failed,
            "failed_keys": failed.iter().map(|r| serde_json::json!({
                "object_key": r.object_key(),
                "attempts": r.attempts(),
                "error": r.last_error(),
            })).collect::<Vec<_>>(),
        });
        let text = serde_json::to_string_pretty(&output)
            .map_err(|e| JsonError::new("status", e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    println!("Checkpoint: {}", checkpoint.display());
    println!("{:-<40}", "");
    println!("{:<30}{:>10}", "Pending", counts.pending);
    println!("{:<30}{:>10}", "Uploaded", counts.uploaded);
    println!("{:<30}{:>10}", "Failed", counts.failed);
    println!("{:-<40}", "");
    for record in &failed {
        println!(
            "  {} ({} attempts): {}",
            record.object_key(),
            record.attempts(),
            record.last_error().as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
