//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the relink binary.

mod commands;
mod migrate;
mod plan;
mod status;

pub use commands::{Cli, Commands};
pub use migrate::run_migration;
pub use plan::show_plan;
pub use status::show_status;
