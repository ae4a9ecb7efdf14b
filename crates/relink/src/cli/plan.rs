//! Dry-run planning.

use super::commands::PlanArgs;
use relink::{MigrationConfig, MigrationOrchestrator, RelinkResult, ResolutionResult};
use relink_error::JsonError;

/// Load configuration and apply the input flags.
pub(crate) fn load_config(args: &PlanArgs) -> RelinkResult<MigrationConfig> {
    let mut config = MigrationConfig::load(args.config.as_deref())?;
    if let Some(files) = &args.files {
        config.paths.files_dir = Some(files.clone());
    }
    if let Some(json) = &args.json {
        config.paths.document = Some(json.clone());
    }
    if args.recursive {
        config.recursive = true;
    }
    Ok(config)
}

/// Resolve every reference and print the result.
pub fn show_plan(args: PlanArgs) -> RelinkResult<()> {
    let config = load_config(&args)?;
    config.validate(false)?;

    let mut orchestrator = MigrationOrchestrator::new(config);
    let plan = orchestrator.plan()?;

    if args.json_output {
        let resolutions = plan
            .resolutions()
            .iter()
            .map(|(key, resolution)| {
                let value = match resolution {
                    ResolutionResult::Resolved { entry, tier } => serde_json::json!({
                        "status": "resolved",
                        "tier": tier,
                        "file": entry.absolute_path(),
                    }),
                    ResolutionResult::Ambiguous { candidates, tier } => serde_json::json!({
                        "status": "ambiguous",
                        "tier": tier,
                        "candidates": candidates.iter().map(|c| c.absolute_path()).collect::<Vec<_>>(),
                    }),
                    ResolutionResult::Unresolved => serde_json::json!({ "status": "unresolved" }),
                };
                (key.clone(), value)
            })
            .collect::<serde_json::Map<_, _>>();
        let output = serde_json::json!({
            "summary": plan.summary(),
            "files_to_upload": plan.jobs().len(),
            "resolutions": resolutions,
        });
        let text = serde_json::to_string_pretty(&output)
            .map_err(|e| JsonError::new("plan", e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    println!("Resolution plan:");
    println!("{:-<80}", "");
    for (key, resolution) in plan.resolutions() {
        match resolution {
            ResolutionResult::Resolved { entry, tier } => {
                println!("{} -> {} ({})", key, entry.display_name(), tier)
            }
            ResolutionResult::Ambiguous { candidates, tier } => {
                let names = candidates
                    .iter()
                    .map(|c| c.display_name().as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{} -> AMBIGUOUS ({}): {}", key, tier, names)
            }
            ResolutionResult::Unresolved => println!("{} -> UNRESOLVED", key),
        }
    }
    println!("{:-<80}", "");
    print!("{}", relink::render_summary(plan.summary()));
    println!("Files to upload: {}", plan.jobs().len());
    Ok(())
}
