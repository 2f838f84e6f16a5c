use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::api::{retry_with_policy, HistoryApi, RetryPolicy};
use crate::models::{RawTransaction, WalletLensError};

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub max_transactions: usize,
    pub page_size: usize,
    /// Stop once the history older than this point has been covered.
    pub since_time: Option<DateTime<Utc>>,
}

/// Cooperative cancellation signal, checked before each page request.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Upstream returned an empty page.
    Exhausted,
    /// The oldest record crossed the time window (or carried no timestamp).
    WindowCovered,
    /// The accumulated count reached `max_transactions`.
    LimitReached,
}

/// Explicit pagination state, threaded through each iteration. The cursor
/// names the oldest record seen so far; None means "start from newest".
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    pub cursor: Option<String>,
    pub fetched: usize,
    pub stop: Option<StopReason>,
}

impl FetchState {
    /// Pure state transition for one received page.
    pub fn advance(mut self, page: &[RawTransaction], options: &FetchOptions) -> FetchState {
        let oldest = match page.last() {
            Some(record) => record,
            None => {
                self.stop = Some(StopReason::Exhausted);
                return self;
            }
        };

        self.fetched += page.len();
        self.cursor = Some(oldest.signature.clone());

        if let Some(since) = options.since_time {
            let covered = match oldest.block_time() {
                Some(time) => time < since,
                // An undated oldest record cannot be placed inside the
                // window, so the window counts as covered.
                None => true,
            };
            if covered {
                self.stop = Some(StopReason::WindowCovered);
                return self;
            }
        }

        if self.fetched >= options.max_transactions {
            self.stop = Some(StopReason::LimitReached);
        }

        self
    }
}

/// Result of one fetch run. A failed or cancelled run still carries the
/// records gathered before the interruption.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Newest-first, as received from the wire.
    pub transactions: Vec<RawTransaction>,
    pub error: Option<WalletLensError>,
    pub cancelled: bool,
}

pub struct HistoryFetcher {
    api: Arc<dyn HistoryApi>,
    retry: RetryPolicy,
    inter_page_delay: Duration,
}

impl HistoryFetcher {
    pub fn new(api: Arc<dyn HistoryApi>, retry: RetryPolicy, inter_page_delay: Duration) -> Self {
        Self {
            api,
            retry,
            inter_page_delay,
        }
    }

    /// Walk the cursor chain until the history is exhausted, the window is
    /// covered, or the transaction limit is reached. Pages are requested
    /// strictly sequentially: each cursor depends on the previous page.
    pub async fn fetch(
        &self,
        address: &str,
        options: &FetchOptions,
        cancel: &CancelFlag,
    ) -> FetchOutcome {
        let mut state = FetchState::default();
        let mut transactions: Vec<RawTransaction> = Vec::new();
        let mut first_request = true;

        while state.stop.is_none() {
            if cancel.is_cancelled() {
                info!(address, fetched = transactions.len(), "Fetch cancelled");
                return FetchOutcome {
                    transactions,
                    error: None,
                    cancelled: true,
                };
            }

            if !first_request {
                sleep(self.inter_page_delay).await;
            }
            first_request = false;

            let remaining = options.max_transactions - state.fetched;
            let limit = options.page_size.min(remaining);
            let cursor = state.cursor.clone();

            let result = retry_with_policy(&self.retry, "history_page", || {
                self.api.fetch_page(address, cursor.as_deref(), limit)
            })
            .await;

            match result {
                Ok(page) => {
                    state = state.advance(&page, options);
                    transactions.extend(page);
                }
                Err(e) => {
                    warn!(
                        address,
                        fetched = transactions.len(),
                        error = %e,
                        "Page fetch exhausted its retry budget, returning partial history"
                    );
                    return FetchOutcome {
                        transactions,
                        error: Some(WalletLensError::FetchFailed {
                            attempts: self.retry.max_attempts,
                            message: e.to_string(),
                        }),
                        cancelled: false,
                    };
                }
            }
        }

        info!(
            address,
            fetched = transactions.len(),
            stop = ?state.stop,
            "History fetch complete"
        );

        FetchOutcome {
            transactions,
            error: None,
            cancelled: false,
        }
    }
}
