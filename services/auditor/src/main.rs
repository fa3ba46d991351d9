//! Fare snapshot auditor.
//!
//! Stores daily scrapes of the fare-availability export and audits the
//! accumulated history for missing scrape days, station name drift and
//! station codes missing from the reference catalog.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use auditor::{commands, load_config, report, CliOverrides};
use fare_common::time::parse_request_timestamp;

#[derive(Parser, Debug)]
#[command(name = "auditor")]
#[command(about = "Snapshot ingestion and audits for daily fare-availability scrapes")]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long, env = "FARE_CONFIG")]
    config: Option<PathBuf>,

    /// Root data directory (snapshots live in <data-dir>/<snapshot_subdir>)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Scan engine: sequential or parallel
    #[arg(long)]
    engine: Option<String>,

    /// Skip and report unreadable snapshots instead of failing
    #[arg(long)]
    partial: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store a downloaded export as the next snapshot
    Ingest {
        /// Export file (CSV, `;` or `,` separated)
        #[arg(long)]
        from: PathBuf,

        /// Scrape time to stamp on every row (default: now)
        #[arg(long)]
        requested_at: Option<String>,
    },

    /// Report scrape days and gaps in the daily cadence
    MissingRequests {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List station codes observed under more than one name
    NameDrift {
        /// Print the mapping as JSON
        #[arg(long)]
        json: bool,
    },

    /// List origin codes missing from the station catalog
    Orphans {
        /// Station catalog CSV (overrides configuration)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Add advisory name-similarity matches
        #[arg(long)]
        suggest: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    let catalog_override = match &args.command {
        Command::Orphans { catalog, .. } => catalog.clone(),
        _ => None,
    };

    let overrides = CliOverrides {
        data_dir: args.data_dir.clone(),
        station_catalog: catalog_override,
        engine: args.engine.clone(),
        partial: args.partial,
    };
    let config = load_config(args.config.as_deref(), &overrides)?;
    info!(
        snapshot_dir = %config.snapshot_dir().display(),
        engine = ?config.engine,
        partial = config.partial_audit,
        "Loaded configuration"
    );

    match args.command {
        Command::Ingest { from, requested_at } => {
            let requested_at = match requested_at {
                Some(raw) => parse_request_timestamp(&raw)
                    .with_context(|| format!("Invalid --requested-at '{}'", raw))?,
                None => chrono::Local::now().naive_local(),
            };
            let stored = commands::ingest(&config, &from, requested_at)?;
            println!("{}", stored.path.display());
        }
        Command::MissingRequests { json } => {
            let result = commands::missing_requests(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::completeness_statement(&result));
            }
        }
        Command::NameDrift { json } => {
            let drift = commands::name_drift(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&drift)?);
            } else {
                print!("{}", report::drift_statement(&drift));
            }
        }
        Command::Orphans { suggest, json, .. } => {
            let result = commands::orphans(&config, suggest)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::orphan_statement(&result));
            }
        }
    }

    Ok(())
}
