//! ferroclust — reference driver for the iterative cluster scoring engine.
//!
//! ```bash
//! ferroclust --input run.json --config ferroclust.toml --checkpoint state/checkpoint.json
//! ferroclust --input run.json --checkpoint state/checkpoint.json --resume
//! ```

mod driver;
mod input;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ferroclust_common::config::ScoringConfig;
use ferroclust_common::logging::init_logging;
use tracing::info;

use crate::driver::Driver;
use crate::input::RunInput;

#[derive(Parser, Debug)]
#[command(name = "ferroclust", version, about = "Iterative multi-evidence cluster scoring", long_about = None)]
struct Args {
    /// Scoring configuration (.toml, .yaml/.yml or .json). Defaults apply when omitted.
    #[arg(short, long, value_name = "FILE", env = "FERROCLUST_CONFIG")]
    config: Option<PathBuf>,

    /// JSON input with the expression matrix, membership and networks.
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Checkpoint file, written every `checkpoint_interval` iterations.
    #[arg(long, value_name = "FILE")]
    checkpoint: Option<PathBuf>,

    /// Continue from the iteration recorded in the checkpoint file.
    #[arg(long, default_value_t = false, requires = "checkpoint")]
    resume: bool,

    /// Override `num_iterations` from the configuration.
    #[arg(long)]
    iterations: Option<u32>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ScoringConfig> {
    let Some(path) = path else {
        info!("No configuration given, using defaults");
        return Ok(ScoringConfig::default());
    };
    let name = path.to_string_lossy();
    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => ScoringConfig::from_yaml(&name),
        Some("json") => ScoringConfig::from_json(&name),
        _ => ScoringConfig::from_toml(&name),
    }
    .with_context(|| format!("loading configuration {}", path.display()))?;
    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging("info");

    info!("ferroclust v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(args.config.as_deref())?;
    if let Some(iterations) = args.iterations {
        config.num_iterations = iterations;
        config.validate()?;
    }

    let input = RunInput::load(&args.input)?;
    info!(
        "Input: {} genes x {} conditions, {} clusters, {} networks",
        input.matrix.num_rows(),
        input.matrix.num_columns(),
        input.membership.num_clusters,
        input.networks.len()
    );

    let membership = input.membership();
    let organism = Arc::new(input.organism());
    let mut driver = Driver::new(config, input.matrix, membership, organism)?;
    if let Some(path) = args.checkpoint {
        driver = driver.with_checkpoint(path, args.resume)?;
    }

    let summary = driver.run()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
