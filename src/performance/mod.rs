//! Dashboard views built on top of report tables.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::report::{ReportFetcher, ReportKind, ReportRow, ReportTable};

/// Columns requested for account-level (daily) reports.
pub const ACCOUNT_COLUMNS: &[&str] = &[
    "TimePeriod",
    "Spend",
    "Impressions",
    "Clicks",
    "Ctr",
    "AverageCpc",
    "Conversions",
    "Revenue",
];

/// Columns requested for campaign summary reports.
pub const CAMPAIGN_COLUMNS: &[&str] = &[
    "CampaignName",
    "CampaignStatus",
    "Spend",
    "Impressions",
    "Clicks",
    "Ctr",
    "AverageCpc",
    "Conversions",
    "Revenue",
];

/// Totals over a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountTotals {
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: f64,
    pub revenue: f64,
}

impl AccountTotals {
    pub fn from_table(table: &ReportTable) -> Self {
        table.rows.iter().fold(Self::default(), |mut acc, row| {
            acc.spend += float(row, "Spend");
            acc.impressions += count(row, "Impressions");
            acc.clicks += count(row, "Clicks");
            acc.conversions += float(row, "Conversions");
            acc.revenue += float(row, "Revenue");
            acc
        })
    }
}

/// One day of account performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPerformance {
    pub date: String,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
    pub cpc: f64,
    pub conversions: f64,
    pub revenue: f64,
}

impl DailyPerformance {
    pub fn from_row(row: &ReportRow) -> Self {
        Self {
            date: text(row, "TimePeriod"),
            spend: float(row, "Spend"),
            impressions: count(row, "Impressions"),
            clicks: count(row, "Clicks"),
            ctr: float(row, "Ctr"),
            cpc: float(row, "AverageCpc"),
            conversions: float(row, "Conversions"),
            revenue: float(row, "Revenue"),
        }
    }
}

/// One campaign's performance over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignPerformance {
    pub name: String,
    pub status: String,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
    pub cpc: f64,
    pub conversions: f64,
    pub revenue: f64,
}

impl CampaignPerformance {
    pub fn from_row(row: &ReportRow) -> Self {
        Self {
            name: text(row, "CampaignName"),
            status: text(row, "CampaignStatus"),
            spend: float(row, "Spend"),
            impressions: count(row, "Impressions"),
            clicks: count(row, "Clicks"),
            ctr: float(row, "Ctr"),
            cpc: float(row, "AverageCpc"),
            conversions: float(row, "Conversions"),
            revenue: float(row, "Revenue"),
        }
    }
}

/// Fetches the dashboard views.
#[derive(Debug, Clone)]
pub struct PerformanceService {
    fetcher: ReportFetcher,
}

impl PerformanceService {
    pub fn new(fetcher: ReportFetcher) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &ReportFetcher {
        &self.fetcher
    }

    pub async fn account_totals(
        &self,
        start: &str,
        end: &str,
        cancel: &CancellationToken,
    ) -> Result<AccountTotals> {
        let table = self
            .fetcher
            .fetch_report_with_cancel(ReportKind::Account, start, end, ACCOUNT_COLUMNS, cancel)
            .await?;
        Ok(AccountTotals::from_table(&table))
    }

    pub async fn daily_performance(
        &self,
        start: &str,
        end: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<DailyPerformance>> {
        let table = self
            .fetcher
            .fetch_report_with_cancel(ReportKind::Account, start, end, ACCOUNT_COLUMNS, cancel)
            .await?;
        Ok(table.rows.iter().map(DailyPerformance::from_row).collect())
    }

    pub async fn campaign_performance(
        &self,
        start: &str,
        end: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<CampaignPerformance>> {
        let table = self
            .fetcher
            .fetch_report_with_cancel(ReportKind::Campaign, start, end, CAMPAIGN_COLUMNS, cancel)
            .await?;
        Ok(table.rows.iter().map(CampaignPerformance::from_row).collect())
    }
}

fn text(row: &ReportRow, column: &str) -> String {
    row.get(column).cloned().unwrap_or_default()
}

/// Lenient number: thousands separators and `%` are dropped, anything
/// unparseable is zero.
fn float(row: &ReportRow, column: &str) -> f64 {
    row.get(column)
        .map(|raw| raw.trim().replace([',', '%'], ""))
        .and_then(|clean| clean.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn count(row: &ReportRow, column: &str) -> u64 {
    let value = float(row, column);
    if value > 0.0 {
        value.trunc() as u64
    } else {
        0
    }
}
