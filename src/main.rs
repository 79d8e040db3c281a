//! Backup and restore tooling for the lucidum stack
//!
//! Produces and recovers point-in-time snapshots of the relational
//! database, the document database and the full application directory,
//! with artifact placement to local disk or object storage.

// lucidumtool/src/main.rs
mod backup;
mod batch;
mod config;
mod context;
mod docker;
mod errors;
mod mongo;
mod restore;
mod storage;
mod utils;

use anyhow::{Context as _, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::process::ExitCode;

use crate::backup::BackupRequest;
use crate::batch::{Target, any_failed, render_summary};
use crate::config::AppConfig;
use crate::context::Context;

#[derive(Debug, Parser)]
#[command(name = "lucidumtool", version, about = "Backup and restore tooling for the lucidum stack")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Back up one or more targets
    Backup(BackupArgs),
    /// Restore targets from previously produced artifacts
    Restore(RestoreArgs),
}

#[derive(Debug, clap::Args)]
struct BackupArgs {
    /// Target to back up (repeatable); defaults to the full application
    /// directory
    #[arg(long = "target", value_enum)]
    targets: Vec<Target>,

    /// Artifact destination: local path or s3:// URL (single target only)
    #[arg(long)]
    destination: Option<String>,

    /// Dump only this document-database collection
    #[arg(long = "include-collection", value_name = "NAME")]
    include_collection: Option<String>,

    /// Leave this document-database collection out of the dump (repeatable)
    #[arg(long = "exclude-collection", value_name = "NAME")]
    exclude_collections: Vec<String>,
}

#[derive(Debug, clap::Args)]
struct RestoreArgs {
    /// Target name and artifact location (repeatable pair), e.g.
    /// --target mysql /backups/mysql_dump.sql
    #[arg(
        long = "target",
        num_args = 2,
        value_names = ["NAME", "ARTIFACT"],
        action = ArgAction::Append,
        required = true
    )]
    targets: Vec<String>,
}

/// Main entry point for the backup/restore tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run_app().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("❌ Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the selected batch and reports per-target outcomes. Returns whether
/// every target succeeded.
async fn run_app() -> Result<bool> {
    let cli = Cli::parse();

    let config_path = AppConfig::default_path();
    let config = AppConfig::load_from_json(&config_path).with_context(|| {
        format!(
            "Failed to load application configuration from {}",
            config_path.display()
        )
    })?;
    let ctx = Context::new(config);

    let outcomes = match cli.command {
        Command::Backup(args) => {
            let request = BackupRequest {
                targets: args.targets,
                destination: args.destination,
                collection: args.include_collection,
                exclude_collections: args.exclude_collections,
            };
            backup::run_backup_flow(&ctx, &request).await?
        }
        Command::Restore(args) => {
            let pairs: Vec<(String, String)> = args
                .targets
                .chunks(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            restore::run_restore_flow(&ctx, &pairs).await
        }
    };

    println!("{}", render_summary(&outcomes));
    Ok(!any_failed(&outcomes))
}
