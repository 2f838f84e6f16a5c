use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::config::ApiSettings;
use crate::models::{RawTransaction, Result, TokenMetadata};

/// Upstream indexer operations the pipeline depends on. The seam exists so
/// tests can substitute a stub client for the HTTP implementation.
#[async_trait]
pub trait HistoryApi: Send + Sync {
    /// Fetch one page of transaction history, newest-first. `before` is a
    /// signature cursor; None starts from the newest transaction.
    async fn fetch_page(
        &self,
        address: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RawTransaction>>;

    /// Look up metadata for a fungible-asset mint. Ok(None) when the
    /// upstream has no entry for it.
    async fn token_metadata(&self, mint: &str) -> Result<Option<TokenMetadata>>;

    /// Current native-asset balance, in SOL.
    async fn native_balance(&self, address: &str) -> Result<Decimal>;
}

/// Configuration for API clients.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub rpc_url: String,
    pub timeout_seconds: u64,
}

impl From<&ApiSettings> for ApiClientConfig {
    fn from(settings: &ApiSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            rpc_url: settings.rpc_url.clone(),
            timeout_seconds: settings.timeout_seconds,
        }
    }
}
