use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell, Semaphore};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::api::HistoryApi;
use crate::config::MetadataSettings;
use crate::models::TokenMetadata;

/// Read-through cache over the upstream token-metadata endpoint.
///
/// Concurrent misses for the same mint coalesce onto one in-flight request;
/// all upstream calls share a pacing gate and a concurrency bound. A mint the
/// upstream cannot resolve yields the deterministic fallback metadata and is
/// recorded so the pipeline can surface it, but never aborts a run.
///
/// The cache lives inside the resolver instance: construct one per pipeline
/// run (or share one deliberately) rather than keeping process-wide state.
pub struct TokenResolver {
    api: Arc<dyn HistoryApi>,
    slots: Mutex<HashMap<String, Arc<OnceCell<TokenMetadata>>>>,
    last_lookup: Mutex<Option<Instant>>,
    min_spacing: Duration,
    lookups: Semaphore,
    unresolved: std::sync::Mutex<Vec<String>>,
}

impl TokenResolver {
    pub fn new(api: Arc<dyn HistoryApi>, settings: &MetadataSettings) -> Self {
        Self {
            api,
            slots: Mutex::new(HashMap::new()),
            last_lookup: Mutex::new(None),
            min_spacing: Duration::from_millis(settings.min_spacing_ms),
            lookups: Semaphore::new(settings.lookup_concurrency),
            unresolved: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Resolve metadata for a mint. Cache hits return immediately; misses go
    /// upstream at most once per mint regardless of concurrency.
    pub async fn resolve(&self, mint: &str) -> TokenMetadata {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots
                .entry(mint.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        slot.get_or_init(|| self.lookup(mint)).await.clone()
    }

    /// Mints that fell back to placeholder metadata during this run.
    pub fn unresolved(&self) -> Vec<String> {
        self.unresolved
            .lock()
            .map(|mints| mints.clone())
            .unwrap_or_default()
    }

    async fn lookup(&self, mint: &str) -> TokenMetadata {
        // Closing the semaphore is never done, so acquire cannot fail.
        let _permit = self.lookups.acquire().await.expect("semaphore closed");
        self.pace().await;

        match self.api.token_metadata(mint).await {
            Ok(Some(metadata)) => {
                debug!(mint, symbol = %metadata.symbol, "Resolved token metadata");
                metadata
            }
            Ok(None) => {
                warn!(mint, "No metadata entry upstream, using fallback");
                self.record_unresolved(mint);
                TokenMetadata::fallback()
            }
            Err(e) => {
                warn!(mint, error = %e, "Metadata lookup failed, using fallback");
                self.record_unresolved(mint);
                TokenMetadata::fallback()
            }
        }
    }

    /// Shared gate: every upstream call waits out the minimum spacing since
    /// the previous one, across all outstanding lookups.
    async fn pace(&self) {
        let mut last = self.last_lookup.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_spacing {
                sleep(self.min_spacing - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn record_unresolved(&self, mint: &str) {
        if let Ok(mut mints) = self.unresolved.lock() {
            mints.push(mint.to_string());
        }
    }
}
