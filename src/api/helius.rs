use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use async_trait::async_trait;

use crate::api::client::{ApiClientConfig, HistoryApi};
use crate::models::{RawTransaction, Result, TokenMetadata, WalletLensError, NATIVE_DECIMALS};

/// HTTP client for the enhanced-history indexer plus a JSON-RPC balance
/// endpoint.
pub struct HeliusClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    rpc_url: String,
}

#[derive(Serialize)]
struct RpcRequest {
    jsonrpc: String,
    id: u64,
    method: String,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct GetBalanceResult {
    value: u64,
}

/// One entry of the token-metadata response. Every field may be absent.
#[derive(Deserialize)]
struct TokenMetadataEntry {
    symbol: Option<String>,
    name: Option<String>,
    decimals: Option<u8>,
}

impl HeliusClient {
    pub fn new(config: ApiClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                WalletLensError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            rpc_url: config.rpc_url,
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WalletLensError::UpstreamStatus {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn make_rpc_request<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let request = RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: 1,
            method: method.to_string(),
            params,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?;

        let rpc_response: RpcResponse<T> = Self::check_status(response).await?.json().await?;

        if let Some(error) = rpc_response.error {
            return Err(WalletLensError::UpstreamStatus {
                status: 200,
                message: format!("RPC error {}: {}", error.code, error.message),
            });
        }

        rpc_response.result.ok_or_else(|| WalletLensError::UpstreamStatus {
            status: 200,
            message: "Empty result from RPC".to_string(),
        })
    }
}

#[async_trait]
impl HistoryApi for HeliusClient {
    async fn fetch_page(
        &self,
        address: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RawTransaction>> {
        let mut url = format!(
            "{}/addresses/{}/transactions?api-key={}&limit={}",
            self.base_url, address, self.api_key, limit
        );
        if let Some(cursor) = before {
            url.push_str("&before=");
            url.push_str(cursor);
        }

        debug!(address, cursor = ?before, limit, "Requesting history page");

        let response = self.http_client.get(&url).send().await?;
        let page: Vec<RawTransaction> = Self::check_status(response).await?.json().await?;

        debug!(address, records = page.len(), "Received history page");
        Ok(page)
    }

    async fn token_metadata(&self, mint: &str) -> Result<Option<TokenMetadata>> {
        let url = format!("{}/token-metadata?api-key={}", self.base_url, self.api_key);
        let body = json!({ "mintAccounts": [mint] });

        let response = self.http_client.post(&url).json(&body).send().await?;
        let entries: Vec<TokenMetadataEntry> =
            Self::check_status(response).await?.json().await?;

        Ok(entries.into_iter().next().map(|entry| TokenMetadata {
            symbol: entry.symbol.unwrap_or_else(|| "UNKNOWN".to_string()),
            name: entry.name.unwrap_or_else(|| mint.to_string()),
            decimals: entry.decimals.unwrap_or(NATIVE_DECIMALS),
        }))
    }

    async fn native_balance(&self, address: &str) -> Result<Decimal> {
        let params = json!([address, { "commitment": "confirmed" }]);
        let balance: GetBalanceResult = self.make_rpc_request("getBalance", params).await?;

        Ok(Decimal::from_i128_with_scale(
            balance.value as i128,
            NATIVE_DECIMALS as u32,
        ))
    }
}
