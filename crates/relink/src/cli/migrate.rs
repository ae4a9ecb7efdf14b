//! The `migrate` command.

use super::commands::MigrateArgs;
use super::plan::load_config;
use relink::{
    InterruptFlag, MigrationConfig, MigrationOrchestrator, MigrationSummary, NamingModeConfig,
    RelinkResult,
};
use tracing::{info, warn};

/// Apply `migrate` flags on top of the loaded configuration.
fn apply_overrides(config: &mut MigrationConfig, args: &MigrateArgs) {
    let paths = &mut config.paths;
    if let Some(output) = &args.output {
        paths.output = Some(output.clone());
    }
    if let Some(checkpoint) = &args.checkpoint {
        paths.checkpoint = Some(checkpoint.clone());
    }
    if let Some(report) = &args.report {
        paths.report = Some(report.clone());
    }
    if let Some(dir) = &args.target_dir {
        paths.target_dir = Some(dir.clone());
    }

    let target = &mut config.target;
    if let Some(token) = &args.token {
        target.token = Some(token.clone());
    }
    if let Some(account) = &args.account {
        target.account_id = Some(account.clone());
    }
    if let Some(endpoint) = &args.endpoint {
        target.endpoint = Some(endpoint.clone());
    }
    if let Some(bucket) = &args.bucket {
        target.bucket = Some(bucket.clone());
    }
    if let Some(url) = &args.url {
        target.public_url = Some(url.clone());
    }

    if args.use_hash {
        config.naming.mode = NamingModeConfig::ContentHash;
    }
    if args.no_clean {
        config.naming.clean_filenames = false;
    }
    if let Some(batch_size) = args.batch_size {
        config.checkpoint_policy.flush_every = batch_size;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(max_retries) = args.max_retries {
        config.retry.max_retries = max_retries;
    }
}

/// Run a full migration, stopping cleanly on Ctrl-C.
pub async fn run_migration(args: MigrateArgs) -> RelinkResult<MigrationSummary> {
    let mut config = load_config(&args.inputs)?;
    apply_overrides(&mut config, &args);
    config.validate(true)?;

    let interrupt = InterruptFlag::new();
    let handler_flag = interrupt.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight uploads");
            handler_flag.interrupt();
        }
    });

    let mut orchestrator = MigrationOrchestrator::new(config).with_interrupt(interrupt);
    let result = orchestrator.run().await;
    signal_task.abort();

    let summary = result?;
    relink::log_summary(&summary);
    if args.inputs.json_output {
        let text = serde_json::to_string_pretty(&summary)
            .map_err(|e| relink_error::JsonError::new("summary", e.to_string()))?;
        println!("{}", text);
    } else {
        print!("{}", relink::render_summary(&summary));
    }
    info!(state = %orchestrator.state(), "Migration finished");
    Ok(summary)
}
