use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use wallet_lens::api::HistoryApi;
use wallet_lens::models::{
    RawNativeTransfer, RawTokenTransfer, RawTransaction, Result, TokenMetadata, WalletLensError,
};
use wallet_lens::pipeline::{run_pipeline, CancelFlag, PipelineIssue};
use wallet_lens::Settings;

const WALLET: &str = "4y34oxREo5XJogMEb7B1kJJXYPBH8uYc9vu2fA8HxdFt";
const ALICE: &str = "7VXNe1r6nTqVw6TKyBzt1TNSSQqPqNcEYizv8TduLWpU";
const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
const MYSTERY_MINT: &str = "9n4nbM75f5Ui33ZbPYXn59EwSgE8CGsHtAeTH5YFeJ9E";

/// Upstream stub: serves a fixed page sequence keyed by cursor and a fixed
/// metadata table; optionally fails every request for one cursor.
struct StubApi {
    pages: Vec<Vec<RawTransaction>>,
    metadata: HashMap<String, TokenMetadata>,
    page_calls: AtomicU32,
    metadata_calls: AtomicU32,
    fail_on_cursor: Option<String>,
}

impl StubApi {
    fn new(pages: Vec<Vec<RawTransaction>>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(
            USDC_MINT.to_string(),
            TokenMetadata {
                symbol: "USDC".to_string(),
                name: "USD Coin".to_string(),
                decimals: 6,
            },
        );

        Self {
            pages,
            metadata,
            page_calls: AtomicU32::new(0),
            metadata_calls: AtomicU32::new(0),
            fail_on_cursor: None,
        }
    }
}

#[async_trait]
impl HistoryApi for StubApi {
    async fn fetch_page(
        &self,
        _address: &str,
        before: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<RawTransaction>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);

        if let (Some(fail), Some(cursor)) = (&self.fail_on_cursor, before) {
            if fail == cursor {
                return Err(WalletLensError::UpstreamStatus {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
        }

        let index = match before {
            None => 0,
            Some(cursor) => {
                match self
                    .pages
                    .iter()
                    .position(|p| p.last().map(|t| t.signature.as_str()) == Some(cursor))
                {
                    Some(i) => i + 1,
                    None => return Ok(vec![]),
                }
            }
        };

        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }

    async fn token_metadata(&self, mint: &str) -> Result<Option<TokenMetadata>> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.metadata.get(mint).cloned())
    }

    async fn native_balance(&self, _address: &str) -> Result<Decimal> {
        Ok(Decimal::new(2_500_000_000, 9))
    }
}

fn native(from: &str, to: &str, lamports: u64) -> RawNativeTransfer {
    RawNativeTransfer {
        from_user_account: Some(from.to_string()),
        to_user_account: Some(to.to_string()),
        amount: lamports,
    }
}

fn token(mint: &str, raw_amount: u64, decimals: Option<u8>) -> RawTokenTransfer {
    RawTokenTransfer {
        from_user_account: Some(WALLET.to_string()),
        to_user_account: Some(ALICE.to_string()),
        mint: mint.to_string(),
        token_amount: raw_amount,
        decimals,
    }
}

fn tx(signature: &str, timestamp: Option<i64>) -> RawTransaction {
    RawTransaction {
        signature: signature.to_string(),
        timestamp,
        fee: 5_000,
        transaction_error: None,
        native_transfers: vec![],
        token_transfers: vec![],
    }
}

fn history() -> Vec<Vec<RawTransaction>> {
    // Newest-first: two on 2024-01-02, one late on 2024-01-01, one undated.
    let mut t4 = tx("s4", Some(1_704_160_800));
    t4.native_transfers.push(native(ALICE, WALLET, 1_000_000_000));

    let mut t3 = tx("s3", Some(1_704_157_200));
    t3.token_transfers.push(token(USDC_MINT, 1_500_000, Some(6)));

    let mut t2 = tx("s2", Some(1_704_150_000));
    t2.token_transfers.push(token(MYSTERY_MINT, 2_000_000_000, None));

    let t1 = tx("s1", None);

    vec![vec![t4, t3], vec![t2, t1]]
}

fn fast_settings() -> Settings {
    let mut settings = Settings::default();
    settings.fetch.page_size = 2;
    settings.fetch.inter_page_delay_ms = 1;
    settings.fetch.retry_delay_ms = 1;
    settings.metadata.min_spacing_ms = 1;
    settings
}

#[tokio::test]
async fn invalid_address_fails_before_any_network_call() {
    let api = Arc::new(StubApi::new(history()));
    let settings = fast_settings();

    let result = run_pipeline(
        api.clone(),
        &settings,
        "not_an_address",
        None,
        &CancelFlag::new(),
    )
    .await;

    assert!(matches!(result, Err(WalletLensError::InvalidAddress(_))));
    assert_eq!(api.page_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.metadata_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn full_run_produces_metrics_and_metadata_notes() {
    let api = Arc::new(StubApi::new(history()));
    let settings = fast_settings();

    let report = run_pipeline(api.clone(), &settings, WALLET, None, &CancelFlag::new())
        .await
        .unwrap();

    assert!(report.issue.is_none());

    // Wire order preserved, newest-first.
    let signatures: Vec<&str> = report
        .transactions
        .iter()
        .map(|t| t.signature.as_str())
        .collect();
    assert_eq!(signatures, vec!["s4", "s3", "s2", "s1"]);

    // Unit conversion through the whole pipeline.
    let sol = &report.transactions[0].transfers[0];
    assert_eq!(sol.amount, Decimal::ONE);
    let usdc = &report.transactions[1].transfers[0];
    assert_eq!(usdc.symbol, "USDC");
    assert_eq!(usdc.amount, Decimal::new(15, 1));

    // The unknown mint fell back without aborting the run.
    let mystery = &report.transactions[2].transfers[0];
    assert_eq!(mystery.symbol, "UNKNOWN");
    assert_eq!(mystery.decimals, 9);
    assert_eq!(report.unresolved_mints, vec![MYSTERY_MINT.to_string()]);

    // Date metrics: two UTC calendar days, one undated transaction kept in
    // the raw count only.
    assert_eq!(report.metrics.transaction_count, 4);
    assert_eq!(report.metrics.undated_transaction_count, 1);
    assert_eq!(report.metrics.active_day_count, 2);
    assert_eq!(report.metrics.total_day_span, 1);

    // Counterparty set excludes the queried wallet.
    assert_eq!(report.metrics.interacted_address_count, 1);

    // One metadata call per distinct mint.
    assert_eq!(api.metadata_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn fetch_failure_yields_partial_report_with_issue() {
    let mut stub = StubApi::new(history());
    // The second page request carries the cursor "s3" and always fails.
    stub.fail_on_cursor = Some("s3".to_string());
    let api = Arc::new(stub);
    let settings = fast_settings();

    let report = run_pipeline(api.clone(), &settings, WALLET, None, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(report.transactions.len(), 2);
    assert!(matches!(report.issue, Some(PipelineIssue::FetchFailed(_))));
    // Metrics still computed over the partial history.
    assert_eq!(report.metrics.transaction_count, 2);
}

#[tokio::test]
async fn cancelled_run_reports_partial_data() {
    let api = Arc::new(StubApi::new(history()));
    let settings = fast_settings();
    let cancel = CancelFlag::new();
    cancel.cancel();

    let report = run_pipeline(api.clone(), &settings, WALLET, None, &cancel)
        .await
        .unwrap();

    assert_eq!(report.issue, Some(PipelineIssue::Cancelled));
    assert!(report.transactions.is_empty());
    assert_eq!(api.page_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sol_price_feeds_fiat_values_and_asset_history() {
    let api = Arc::new(StubApi::new(history()));
    let settings = fast_settings();

    let report = run_pipeline(
        api,
        &settings,
        WALLET,
        Some(Decimal::from(100)),
        &CancelFlag::new(),
    )
    .await
    .unwrap();

    let sol = &report.transactions[0].transfers[0];
    assert_eq!(sol.fiat_value, Some(Decimal::from(100)));

    let sol_history = &report.metrics.asset_history["SOL"];
    assert_eq!(sol_history.len(), 1);
    assert_eq!(sol_history[0].value, Decimal::from(100));
}
