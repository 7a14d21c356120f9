/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
/// GitOps backend
///
/// Keeps the GitOps shadow database consistent with the cluster by sweeping
/// for orphaned rows and notifying the cluster agent through Operations.
pub struct Cli {
    /// Path to a configuration file layered over the built-in defaults
    #[arg(long, global = true, env = "GITOPS_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run migrations, then sweep periodically and serve health endpoints
    Serve,

    /// Run a single sweep cycle and exit
    Sweep,

    /// Apply pending database migrations and exit
    Migrate,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
