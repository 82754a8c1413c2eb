//! adreport CLI binary entry point.

use adreport::cli::Cli;
use adreport::config::ReportingConfig;
use adreport::performance::PerformanceService;
use adreport::report::ReportFetcher;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("adreport=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ReportingConfig::load(cli.config.as_deref())?;
    let service = PerformanceService::new(ReportFetcher::new(config));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling report fetch");
            on_signal.cancel();
        }
    });

    adreport::cli::report::handle(&service, cli.command, &cancel).await
}
