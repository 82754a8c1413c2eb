//! adreport: Microsoft Advertising performance reports.
//!
//! Fetches reports through the asynchronous report-generation workflow:
//! obtain a bearer token, submit a report request, poll until the job is
//! ready, download the artifact (CSV or zipped CSV) and parse it into a
//! [`ReportTable`](report::ReportTable).
//!
//! # Quick Start
//!
//! ```no_run
//! use adreport::prelude::*;
//!
//! # async fn example() -> adreport::error::Result<()> {
//! let fetcher = ReportFetcher::new(ReportingConfig::from_env());
//! let table = fetcher
//!     .fetch_report(ReportKind::Campaign, "2024-01-01", "2024-01-31", &["Spend"])
//!     .await?;
//! for row in &table.rows {
//!     println!("{} spent {}", row["CampaignName"], row["Spend"]);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod performance;
pub mod prelude;
pub mod report;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
