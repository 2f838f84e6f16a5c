pub mod aggregator;
pub mod fetcher;
pub mod normalizer;
pub mod validator;

pub use aggregator::aggregate;
pub use fetcher::{CancelFlag, FetchOptions, FetchOutcome, FetchState, HistoryFetcher, StopReason};
pub use normalizer::Normalizer;
pub use validator::is_valid_address;

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::{HistoryApi, RetryPolicy};
use crate::config::Settings;
use crate::metadata::TokenResolver;
use crate::models::{NormalizedTransaction, Result, WalletLensError, WalletMetrics};

/// Why a run produced partial rather than complete data. A report without an
/// issue is complete; an `Err` from `run_pipeline` is a hard failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineIssue {
    /// A page request exhausted its retry budget; the report carries the
    /// history gathered before the failure.
    FetchFailed(String),
    /// The caller cancelled between page requests.
    Cancelled,
}

/// Everything one pipeline invocation produced for an address.
#[derive(Debug)]
pub struct PipelineReport {
    pub address: String,
    pub metrics: WalletMetrics,
    /// Newest-first, matching the wire order.
    pub transactions: Vec<NormalizedTransaction>,
    pub issue: Option<PipelineIssue>,
    /// Mints that fell back to placeholder metadata.
    pub unresolved_mints: Vec<String>,
}

/// Run the full ingestion pipeline for one address: validate, fetch the
/// paginated history, normalize transfers, aggregate metrics.
///
/// An invalid address fails before any network call. Fetch failure and
/// cancellation are reported as an issue next to the partial data instead of
/// discarding it; unresolvable token metadata never aborts the run.
pub async fn run_pipeline(
    api: Arc<dyn HistoryApi>,
    settings: &Settings,
    address: &str,
    sol_price: Option<Decimal>,
    cancel: &CancelFlag,
) -> Result<PipelineReport> {
    if !is_valid_address(address) {
        return Err(WalletLensError::InvalidAddress(address.to_string()));
    }

    let since_time = settings
        .fetch
        .window_days
        .map(|days| Utc::now() - chrono::Duration::days(i64::from(days)));

    let options = FetchOptions {
        max_transactions: settings.fetch.max_transactions,
        page_size: settings.fetch.page_size,
        since_time,
    };

    let retry = RetryPolicy::new(
        settings.fetch.retry_max_attempts,
        Duration::from_millis(settings.fetch.retry_delay_ms),
    );
    let fetcher = HistoryFetcher::new(
        api.clone(),
        retry,
        Duration::from_millis(settings.fetch.inter_page_delay_ms),
    );

    info!(address, ?since_time, "Starting pipeline run");
    let outcome = fetcher.fetch(address, &options, cancel).await;

    let resolver = Arc::new(TokenResolver::new(api, &settings.metadata));
    let normalizer = Normalizer::new(
        resolver.clone(),
        settings.normalizer.exclude_internal_transfers,
        sol_price,
    );
    let transactions = normalizer.normalize_all(outcome.transactions).await;
    let metrics = aggregate(address, &transactions);

    let issue = if outcome.cancelled {
        Some(PipelineIssue::Cancelled)
    } else {
        outcome.error.map(|e| PipelineIssue::FetchFailed(e.to_string()))
    };

    let unresolved_mints = resolver.unresolved();
    if !unresolved_mints.is_empty() {
        warn!(
            address,
            count = unresolved_mints.len(),
            "Some token metadata stayed unresolved, placeholders were used"
        );
    }

    info!(
        address,
        transactions = transactions.len(),
        issue = ?issue,
        "Pipeline run finished"
    );

    Ok(PipelineReport {
        address: address.to_string(),
        metrics,
        transactions,
        issue,
        unresolved_mints,
    })
}
