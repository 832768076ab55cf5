//! tidewatch - Ocean Hazard Report Consensus
//!
//! Aggregates multi-source hazard classifications into one consensus
//! judgment.
//!
//! # Usage
//!
//! ```bash
//! # Aggregate a stored batch of raw observations (JSON array)
//! tidewatch --input batch.json --reporter-type 3
//!
//! # Same, reading the batch from stdin
//! cat batch.json | tidewatch --input - --reporter-type 3
//!
//! # Classify a report live against the configured sources
//! OPENROUTER_API_KEY=... tidewatch --classify "water is a meter over the pier" --reporter-type 3
//! ```
//!
//! # Environment Variables
//!
//! - `TIDEWATCH_CONFIG`: Path to a TOML config file
//! - `OPENROUTER_API_KEY`: API key for live classification
//! - `RUST_LOG`: Logging level (default: info)

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use tidewatch::sources::{self, OpenRouterSource};
use tidewatch::types::{HazardType, PriorVote, RawObservation, ReportInput};
use tidewatch::{aggregate, TidewatchConfig};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "tidewatch")]
#[command(about = "Ocean hazard report consensus engine")]
#[command(version)]
struct CliArgs {
    /// Path to a JSON array of raw observations, or "-" for stdin
    #[arg(long, value_name = "FILE")]
    input: Option<String>,

    /// Classify a report description live against the configured sources
    /// (requires OPENROUTER_API_KEY)
    #[arg(long, value_name = "TEXT", conflicts_with = "input")]
    classify: Option<String>,

    /// Reporter's self-declared hazard code (0-9), cast as a weighted prior
    #[arg(long, value_name = "CODE")]
    reporter_type: Option<i64>,

    /// Override the reporter prior ballot weight from config
    #[arg(long, requires = "reporter_type")]
    prior_weight: Option<u32>,

    /// Path to a TOML config file (otherwise the standard search order)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => TidewatchConfig::load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => TidewatchConfig::load(),
    };

    let reporter_hazard = match args.reporter_type {
        Some(code) => Some(
            HazardType::from_code(code)
                .with_context(|| format!("reporter hazard code out of range: {code}"))?,
        ),
        None => None,
    };

    let raw: Vec<RawObservation> = if let Some(description) = &args.classify {
        let report = ReportInput {
            reporter_hazard: reporter_hazard.unwrap_or_default(),
            description: description.clone(),
        };
        let backends = OpenRouterSource::from_config(&config.sources)?;
        info!(sources = backends.len(), "Fanning report out to classification sources");
        let outcomes = sources::collect_observations(&backends, &report).await;
        sources::surviving(outcomes)
    } else if let Some(input) = &args.input {
        let contents = if input == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read observations from stdin")?;
            buf
        } else {
            std::fs::read_to_string(input)
                .with_context(|| format!("failed to read observations from {input}"))?
        };
        serde_json::from_str(&contents).context("input is not a JSON array of observations")?
    } else {
        bail!("nothing to do: pass --input or --classify");
    };

    let prior = reporter_hazard.map(|hazard| PriorVote {
        hazard,
        weight: args.prior_weight.unwrap_or(config.aggregation.reporter_prior_weight),
    });

    let consensus = aggregate(&raw, prior, &config.aggregation);
    println!("{}", serde_json::to_string_pretty(&consensus)?);
    Ok(())
}
