//! Command-line interface.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use scenefetch_core::{RunMode, SearchQuery};

const DEFAULT_LATITUDE: f64 = 37.355138;
const DEFAULT_LONGITUDE: f64 = -120.411734;

/// Activate and download satellite imagery for a point of interest and a date window.
#[derive(Debug, Parser)]
#[command(name = "scenefetch", version, about)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "SCENEFETCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search, activate and download matching assets.
    Run(RunArgs),

    /// Show what the ledger records as activated and downloaded.
    Status {
        /// Print the raw ledger as JSON instead of the summary.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Start date (YYYY-MM-DD).
    #[arg(long)]
    pub start_date: NaiveDate,

    /// End date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    pub end_date: NaiveDate,

    /// Latitude of the point of interest.
    #[arg(long, default_value_t = DEFAULT_LATITUDE, allow_negative_numbers = true)]
    pub latitude: f64,

    /// Longitude of the point of interest.
    #[arg(long, default_value_t = DEFAULT_LONGITUDE, allow_negative_numbers = true)]
    pub longitude: f64,

    /// Provider item type.
    #[arg(long, default_value = "PSScene")]
    pub item_type: String,

    /// Asset types to fetch for every scene.
    #[arg(
        long,
        num_args = 1..,
        default_values_t = ["basic_analytic_8b".to_string(), "ortho_visual".to_string()]
    )]
    pub asset_types: Vec<String>,

    /// Maximum cloud cover percentage.
    #[arg(long, default_value_t = 30.0)]
    pub max_cloud_cover: f64,

    /// Output directory; overrides `output.dir` from the configuration.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Only request activation, without waiting or downloading.
    #[arg(long)]
    pub activate_only: bool,
}

impl RunArgs {
    pub fn query(&self) -> SearchQuery {
        SearchQuery {
            start_date: self.start_date,
            end_date: self.end_date,
            latitude: self.latitude,
            longitude: self.longitude,
            item_type: self.item_type.clone(),
            max_cloud_cover: self.max_cloud_cover,
        }
    }

    pub fn mode(&self) -> RunMode {
        RunMode::from_activate_only(self.activate_only)
    }
}
