//! Relink CLI binary.
//!
//! This binary provides command-line access to the migration engine:
//! - Migrate media and rewrite a Roam export
//! - Preview how references resolve
//! - Inspect a checkpoint

use clap::Parser;
use relink::{MigrationErrorKind, RelinkErrorKind};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

/// Exit status after Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    use cli::{Cli, Commands, run_migration, show_plan, show_status};

    let _ = dotenvy::dotenv();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    // Execute the requested command
    let result = match cli.command {
        Commands::Migrate(args) => run_migration(args).await.map(|summary| {
            if summary.failed > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }),
        Commands::Plan(args) => show_plan(args).map(|()| ExitCode::SUCCESS),
        Commands::Status {
            checkpoint,
            json_output,
        } => show_status(&checkpoint, json_output).map(|()| ExitCode::SUCCESS),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Relink failed");
            eprintln!("Error: {}", e);
            match e.kind() {
                RelinkErrorKind::Migration(m)
                    if matches!(m.kind, MigrationErrorKind::Interrupted(_)) =>
                {
                    ExitCode::from(EXIT_INTERRUPTED)
                }
                _ => ExitCode::FAILURE,
            }
        }
    }
}
