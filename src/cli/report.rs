//! CLI report command handlers.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::{Commands, RangeArgs, RawArgs};
use crate::performance::PerformanceService;

/// Run one report command and print its JSON result to stdout.
pub async fn handle(
    service: &PerformanceService,
    command: Commands,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Account(RangeArgs { start, end }) => {
            print_json(&service.account_totals(&start, &end, cancel).await?)
        }
        Commands::Daily(RangeArgs { start, end }) => {
            print_json(&service.daily_performance(&start, &end, cancel).await?)
        }
        Commands::Campaign(RangeArgs { start, end }) => {
            print_json(&service.campaign_performance(&start, &end, cancel).await?)
        }
        Commands::Raw(args) => handle_raw(service, args, cancel).await,
    }
}

async fn handle_raw(
    service: &PerformanceService,
    args: RawArgs,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let RawArgs {
        range,
        kind,
        columns,
    } = args;
    let table = service
        .fetcher()
        .fetch_report_with_cancel(kind, &range.start, &range.end, &columns, cancel)
        .await?;
    print_json(&table)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
