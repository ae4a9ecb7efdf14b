//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Relink - move Roam Research media off Firebase and rewrite the export
#[derive(Parser, Debug)]
#[command(name = "relink")]
#[command(about = "Migrate Roam Research media links from Firebase storage to your own bucket", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload media and write the rewritten export
    Migrate(MigrateArgs),

    /// Show how references resolve without uploading or writing anything
    Plan(PlanArgs),

    /// Summarize a checkpoint file
    Status {
        /// Checkpoint file
        #[arg(long, default_value = relink::DEFAULT_CHECKPOINT_NAME)]
        checkpoint: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json_output: bool,
    },
}

/// Inputs shared by `migrate` and `plan`.
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Folder of exported media files
    #[arg(long)]
    pub files: Option<PathBuf>,

    /// Roam JSON export
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Include files in subfolders
    #[arg(long)]
    pub recursive: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json_output: bool,
}

/// Options of `migrate`. Each flag overrides the configuration.
#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// Input locations
    #[command(flatten)]
    pub inputs: PlanArgs,

    /// Rewritten export (default: <json stem>_migrated.json)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Checkpoint file (default: migration_progress.json beside the export)
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// API token for the target bucket
    #[arg(long, env = "RELINK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Cloudflare account id
    #[arg(long)]
    pub account: Option<String>,

    /// Generic S3-style endpoint (instead of --account)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Target bucket
    #[arg(long)]
    pub bucket: Option<String>,

    /// Public base URL of the bucket
    #[arg(long)]
    pub url: Option<String>,

    /// Name uploads by content hash
    #[arg(long)]
    pub use_hash: bool,

    /// Keep file names exactly as they are
    #[arg(long)]
    pub no_clean: bool,

    /// Save the checkpoint every N records
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Parallel uploads
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Retries per file after the first attempt
    #[arg(long)]
    pub max_retries: Option<usize>,

    /// Write the summary as JSON here
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Upload into a local folder instead of a bucket
    #[arg(long)]
    pub target_dir: Option<PathBuf>,
}
