use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wallet_lens::{
    api::{retry_with_policy, ApiClientConfig, HeliusClient, HistoryApi, RetryPolicy},
    pipeline::{run_pipeline, CancelFlag, PipelineIssue, PipelineReport},
    Settings,
};

#[derive(Parser)]
#[clap(name = "wallet-lens")]
#[clap(about = "Ingest a wallet's transaction history and derive activity metrics", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a wallet's history and print its activity metrics
    Analyze {
        /// Wallet address to analyze
        address: String,

        /// Cap on the number of transactions to ingest
        #[clap(long)]
        max_transactions: Option<usize>,

        /// Only ingest history newer than this many days
        #[clap(long)]
        window_days: Option<u32>,

        /// Externally supplied SOL price for fiat valuation
        #[clap(long)]
        sol_price: Option<Decimal>,
    },

    /// Print the current native balance of a wallet
    Balance {
        /// Wallet address to query
        address: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::new().unwrap_or_else(|_| {
        eprintln!("Using default settings");
        Settings::default()
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.app.log_level.clone())),
        )
        .init();

    if let Err(e) = settings.validate() {
        error!("Invalid settings: {}", e);
        return Err(anyhow::anyhow!(e));
    }

    let cli = Cli::parse();

    let client = HeliusClient::new(ApiClientConfig::from(&settings.api))
        .map_err(|e| anyhow::anyhow!("Failed to create API client: {}", e))?;
    let api: Arc<dyn HistoryApi> = Arc::new(client);

    match cli.command {
        Commands::Analyze {
            address,
            max_transactions,
            window_days,
            sol_price,
        } => {
            let mut settings = settings;
            if let Some(max) = max_transactions {
                settings.fetch.max_transactions = max;
            }
            if window_days.is_some() {
                settings.fetch.window_days = window_days;
            }

            info!("Fetching data for address: {}", address);
            let cancel = CancelFlag::new();

            match run_pipeline(api, &settings, &address, sol_price, &cancel).await {
                Ok(report) => print_report(&report),
                Err(e) => {
                    error!("Analysis failed: {}", e);
                    return Err(anyhow::anyhow!(e));
                }
            }
        }

        Commands::Balance { address } => {
            let retry = RetryPolicy::new(
                settings.fetch.retry_max_attempts,
                Duration::from_millis(settings.fetch.retry_delay_ms),
            );

            match retry_with_policy(&retry, "native_balance", || api.native_balance(&address))
                .await
            {
                Ok(balance) => {
                    println!("Address: {}", address);
                    println!("Balance: {} SOL", balance);
                }
                Err(e) => {
                    error!("Balance query failed: {}", e);
                    return Err(anyhow::anyhow!(e));
                }
            }
        }
    }

    Ok(())
}

fn print_report(report: &PipelineReport) {
    println!("\nWallet Information:");
    println!("------------------");
    println!("Address: {}", report.address);
    let creation = report
        .metrics
        .first_transaction
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "Unknown".to_string());
    println!("Creation Date: {}", creation);
    println!("Total Transactions: {}", report.metrics.transaction_count);

    println!("\nWallet Metrics:");
    println!("------------------");
    println!("Active Days: {}", report.metrics.active_day_count);
    println!("Total Days: {}", report.metrics.total_day_span);
    match report.metrics.activity_ratio() {
        Some(ratio) => println!("Activity Ratio: {:.2}%", ratio * 100.0),
        None => println!("Activity Ratio: n/a"),
    }
    println!(
        "Unique Interacted Wallets: {}",
        report.metrics.interacted_address_count
    );
    println!("Assets Seen: {}", report.metrics.asset_history.len());

    match &report.issue {
        Some(PipelineIssue::FetchFailed(message)) => {
            println!("\n⚠ Partial history: {}", message);
        }
        Some(PipelineIssue::Cancelled) => {
            println!("\n⚠ Partial history: run was cancelled");
        }
        None => {}
    }

    if !report.unresolved_mints.is_empty() {
        println!(
            "\n⚠ Metadata unresolved for {} mint(s), placeholders used",
            report.unresolved_mints.len()
        );
    }

    print_transactions("10 Latest Transactions", report.transactions.iter().take(10));
    print_transactions(
        "10 Oldest Transactions",
        report.transactions.iter().rev().take(10),
    );
}

fn print_transactions<'a>(
    title: &str,
    transactions: impl Iterator<Item = &'a wallet_lens::NormalizedTransaction>,
) {
    println!("\n{}:", title);
    println!("------------------");

    for (index, tx) in transactions.enumerate() {
        println!("\nTransaction {}:", index + 1);
        println!("Signature: {}", tx.signature);
        match tx.timestamp {
            Some(t) => println!("Timestamp: {}", t.to_rfc3339()),
            None => println!("Timestamp: unconfirmed"),
        }
        println!("Transfers:");
        for (i, transfer) in tx.transfers.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, transfer.name, transfer.symbol);
            println!("     Value: {}", transfer.amount);
            println!("     From: {}", transfer.from.as_deref().unwrap_or("-"));
            println!("     To: {}", transfer.to.as_deref().unwrap_or("-"));
        }
    }
}
