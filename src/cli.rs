//! Command-line interface built on clap.
//!
//! Every flag is optional. Without flags the run uses `criticality.toml`
//! (or built-in defaults) and uploads the scores.

use std::path::PathBuf;

use clap::Parser;

/// Scores inventory assets by age and dependency count and writes the scores back.
#[derive(Debug, Parser)]
#[command(name = "asset-criticality", version, about)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./criticality.toml when present).
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Asset type to score. Repeat to score several; replaces the configured list.
    #[arg(long = "asset", value_name = "ASSET_TYPE")]
    pub assets: Vec<String>,

    /// Weight applied to asset age, 0 to 10.
    #[arg(long, allow_negative_numbers = true)]
    pub age_weight: Option<i64>,

    /// Weight applied to dependency count, 0 to 10.
    #[arg(long, allow_negative_numbers = true)]
    pub dependency_weight: Option<i64>,

    /// Compute and print scores without uploading them.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Print results as JSON instead of a table.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable debug logging.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}
