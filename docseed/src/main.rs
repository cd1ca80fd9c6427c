//! docseed - Database seeding tool
//!
//! Replaces the contents of each configured collection with the documents
//! from its JSON fixture. Exits with status 1 on any fatal error, which is
//! logged exactly once.

use anyhow::{Context, Result};
use clap::Parser;
use docseed::{IdPolicy, Loader, LoaderOptions};
use docseed_common::config::{resolve_connection_string, TomlConfig};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Default fixture directory, relative to the working directory
const DEFAULT_DATA_DIR: &str = "data";

/// Command-line arguments for docseed
#[derive(Parser, Debug)]
#[command(name = "docseed")]
#[command(about = "Seed document collections from JSON fixtures")]
#[command(version)]
struct Args {
    /// TOML config file (default: ./docseed.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the fixture files
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Store connection string (overrides the environment)
    #[arg(long)]
    connection_string: Option<String>,

    /// Keep source _id values instead of assigning fresh ones
    #[arg(long)]
    preserve_ids: bool,

    /// Sync entity types concurrently
    #[arg(long)]
    parallel: bool,

    /// Load and normalize fixtures without touching the store
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env never overrides variables already set
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Config is read before tracing starts so its log level applies
    let config = TomlConfig::load(args.config.as_deref());
    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    info!("Starting docseed v{}", env!("CARGO_PKG_VERSION"));

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: docseed_common::Result<TomlConfig>) -> Result<()> {
    let config = config?;

    // Pre-flight: no fixture is read without a connection string
    let connection_string = resolve_connection_string(
        args.connection_string.as_deref(),
        &config.connection_env_or_default(),
    )?;

    let data_dir = args
        .data_dir
        .or_else(|| config.data_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    info!("Fixture directory: {}", data_dir.display());

    let options = LoaderOptions {
        id_policy: if args.preserve_ids || config.preserve_ids.unwrap_or(false) {
            IdPolicy::Preserve
        } else {
            IdPolicy::Strip
        },
        parallel: args.parallel || config.parallel.unwrap_or(false),
        dry_run: args.dry_run,
    };

    let loader = Loader::new(
        connection_string,
        data_dir,
        config.entities_or_default(),
        options,
    );
    let summary = loader.run().await.context("Seeding failed")?;

    for entity in &summary.entities {
        info!(
            "{} → {}: deleted={}, inserted={}",
            entity.entity, entity.collection, entity.deleted, entity.inserted
        );
    }

    Ok(())
}
