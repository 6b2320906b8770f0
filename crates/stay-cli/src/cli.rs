//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Residency day-count tracker.
///
/// Stores sparse flight records and computes how many calendar days a
/// traveler was present in each country, checking statutory residency
/// thresholds under calendar-year, tax-year, and rolling 12-month rules.
#[derive(Debug, Parser)]
#[command(name = "stay", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import travel legs from JSONL on stdin.
    Import {
        /// Default traveler to apply when incoming legs omit `traveler`.
        #[arg(long)]
        traveler: Option<String>,
    },

    /// Evaluate residency thresholds per country.
    Report {
        /// Report a single traveler instead of all travelers.
        #[arg(long)]
        traveler: Option<String>,

        /// Analysis range start (YYYY-MM-DD). Requires --to.
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Analysis range end (YYYY-MM-DD). Requires --from.
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        /// Country the traveler was in before the first recorded leg.
        /// Only valid together with --traveler.
        #[arg(long, requires = "traveler")]
        starting_country: Option<String>,

        /// Emit the summary as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show raw presence day counts per country.
    Presence {
        /// Traveler to inspect. Required when several are recorded.
        #[arg(long)]
        traveler: Option<String>,

        /// Analysis range start (YYYY-MM-DD). Requires --to.
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Analysis range end (YYYY-MM-DD). Requires --from.
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        /// Emit the full per-country day sets as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List travelers with recorded legs.
    Travelers,
}
