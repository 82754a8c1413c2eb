//! CLI entry point for adreport.

pub mod report;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::report::ReportKind;

/// Microsoft Advertising report CLI
#[derive(Parser, Debug)]
#[command(name = "adreport", version, about = "Fetch Microsoft Advertising performance reports")]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Account totals over a date range
    Account(RangeArgs),
    /// One row per day of account performance
    Daily(RangeArgs),
    /// One row per campaign over a date range
    Campaign(RangeArgs),
    /// Raw report table with arbitrary columns
    Raw(RawArgs),
}

/// Date range shared by every report command.
#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub start: String,

    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub end: String,
}

/// Arguments for `adreport raw`.
#[derive(Args, Debug, Clone)]
pub struct RawArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Report kind (account, campaign)
    #[arg(long, default_value = "account")]
    pub kind: ReportKind,

    /// Column to request (repeatable)
    #[arg(long = "column", short = 'c')]
    pub columns: Vec<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
