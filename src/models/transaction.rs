use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The chain's base currency uses 9-decimal base units (lamports).
pub const NATIVE_SYMBOL: &str = "SOL";
pub const NATIVE_NAME: &str = "Solana";
pub const NATIVE_DECIMALS: u8 = 9;

/// System program account, the endpoint of program-internal movements.
pub const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";

/// One raw transaction record as returned by the enhanced-history API.
/// Pages are ephemeral: consumed by the normalizer and not retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub signature: String,
    /// Unix seconds; absent for unconfirmed transactions.
    #[serde(default, alias = "blockTime")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub fee: u64,
    /// Null/absent means the transaction succeeded.
    #[serde(default)]
    pub transaction_error: Option<serde_json::Value>,
    #[serde(default)]
    pub native_transfers: Vec<RawNativeTransfer>,
    #[serde(default)]
    pub token_transfers: Vec<RawTokenTransfer>,
}

impl RawTransaction {
    pub fn is_success(&self) -> bool {
        self.transaction_error.is_none()
    }

    pub fn block_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNativeTransfer {
    #[serde(default, alias = "from")]
    pub from_user_account: Option<String>,
    #[serde(default, alias = "to")]
    pub to_user_account: Option<String>,
    /// Lamports.
    #[serde(default)]
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenTransfer {
    #[serde(default)]
    pub from_user_account: Option<String>,
    #[serde(default)]
    pub to_user_account: Option<String>,
    pub mint: String,
    /// Raw base units of the token.
    #[serde(default)]
    pub token_amount: u64,
    /// Wire-supplied decimals; the metadata resolver fills the gap.
    #[serde(default)]
    pub decimals: Option<u8>,
}

/// Descriptive metadata for a fungible-asset mint. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

impl TokenMetadata {
    /// Deterministic stand-in when the upstream cannot resolve a mint.
    pub fn fallback() -> Self {
        Self {
            symbol: "UNKNOWN".to_string(),
            name: "Unknown Token".to_string(),
            decimals: NATIVE_DECIMALS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Native,
    Token,
}

/// A native or token transfer in human-meaningful units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTransfer {
    pub kind: TransferKind,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Raw integer amount divided by 10^decimals.
    pub amount: Decimal,
    /// Present only when a price was supplied externally.
    pub fiat_value: Option<Decimal>,
}

/// Built once from exactly one raw record; immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTransaction {
    pub signature: String,
    /// None when the raw record had no block time. Such transactions are
    /// retained but excluded from date-bucketed metrics.
    pub timestamp: Option<DateTime<Utc>>,
    pub success: bool,
    /// Fee in SOL units.
    pub fee: Decimal,
    pub transfers: Vec<NormalizedTransfer>,
}
