use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One observed transfer of an asset, ordered by timestamp within
/// `WalletMetrics::asset_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPoint {
    pub timestamp: DateTime<Utc>,
    /// Fiat value when a price was supplied, otherwise the token amount.
    pub value: Decimal,
}

/// Aggregate activity and diversity statistics for one wallet.
///
/// A pure function of the normalized transaction sequence: recomputed fully
/// on every run, never mutated incrementally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletMetrics {
    /// Distinct UTC calendar dates with at least one dated transaction.
    pub active_day_count: u32,
    /// Ceiling of the span between first and last dated transaction, in days.
    /// Zero when fewer than two dated transactions exist.
    pub total_day_span: u32,
    /// Distinct non-null counterparties across all transfers, excluding the
    /// queried address itself.
    pub interacted_address_count: u32,
    /// Per-symbol transfer history, ordered by timestamp.
    pub asset_history: HashMap<String, Vec<AssetPoint>>,
    pub first_transaction: Option<DateTime<Utc>>,
    pub last_transaction: Option<DateTime<Utc>>,
    /// All transactions, dated or not.
    pub transaction_count: u32,
    /// Transactions without a block time, excluded from date metrics.
    pub undated_transaction_count: u32,
}

impl WalletMetrics {
    /// Active days over total span. None when the span is zero, so callers
    /// never divide by zero.
    pub fn activity_ratio(&self) -> Option<f64> {
        if self.total_day_span == 0 {
            return None;
        }
        Some(self.active_day_count as f64 / self.total_day_span as f64)
    }
}
