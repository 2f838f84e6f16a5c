use std::collections::{HashMap, HashSet};

use crate::models::{AssetPoint, NormalizedTransaction, WalletMetrics};

const SECONDS_PER_DAY: i64 = 86_400;

/// Derive activity, diversity and counterparty statistics from a normalized
/// transaction sequence. Pure function: no I/O, no hidden state, identical
/// output for identical input.
///
/// `address` is the queried wallet; it is excluded from the counterparty set.
/// Transactions without a timestamp stay out of every date-based metric but
/// are included in the raw counts.
pub fn aggregate(address: &str, transactions: &[NormalizedTransaction]) -> WalletMetrics {
    let mut dated: Vec<&NormalizedTransaction> = transactions
        .iter()
        .filter(|tx| tx.timestamp.is_some())
        .collect();
    dated.sort_by_key(|tx| tx.timestamp);

    let mut active_days = HashSet::new();
    let mut asset_history: HashMap<String, Vec<AssetPoint>> = HashMap::new();

    for tx in &dated {
        // Filtered above.
        let timestamp = match tx.timestamp {
            Some(t) => t,
            None => continue,
        };
        active_days.insert(timestamp.date_naive());

        for transfer in &tx.transfers {
            asset_history
                .entry(transfer.symbol.clone())
                .or_default()
                .push(AssetPoint {
                    timestamp,
                    value: transfer.fiat_value.unwrap_or(transfer.amount),
                });
        }
    }

    let mut counterparties: HashSet<&str> = HashSet::new();
    for tx in transactions {
        for transfer in &tx.transfers {
            for endpoint in [&transfer.from, &transfer.to] {
                if let Some(account) = endpoint.as_deref() {
                    if account != address {
                        counterparties.insert(account);
                    }
                }
            }
        }
    }

    let first_transaction = dated.first().and_then(|tx| tx.timestamp);
    let last_transaction = dated.last().and_then(|tx| tx.timestamp);

    let total_day_span = match (first_transaction, last_transaction) {
        (Some(first), Some(last)) if dated.len() >= 2 => {
            let seconds = (last - first).num_seconds().max(0);
            ((seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY) as u32
        }
        _ => 0,
    };

    WalletMetrics {
        active_day_count: active_days.len() as u32,
        total_day_span,
        interacted_address_count: counterparties.len() as u32,
        asset_history,
        first_transaction,
        last_transaction,
        transaction_count: transactions.len() as u32,
        undated_transaction_count: transactions
            .iter()
            .filter(|tx| tx.timestamp.is_none())
            .count() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NormalizedTransfer, TransferKind};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn transfer(from: Option<&str>, to: Option<&str>, symbol: &str, amount: i64) -> NormalizedTransfer {
        NormalizedTransfer {
            kind: TransferKind::Native,
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            decimals: 9,
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            amount: Decimal::from(amount),
            fiat_value: None,
        }
    }

    fn tx(signature: &str, timestamp: Option<i64>, transfers: Vec<NormalizedTransfer>) -> NormalizedTransaction {
        NormalizedTransaction {
            signature: signature.to_string(),
            timestamp: timestamp.map(|secs| Utc.timestamp_opt(secs, 0).unwrap()),
            success: true,
            fee: Decimal::ZERO,
            transfers,
        }
    }

    // 2024-01-01T23:00:00Z and two transactions on 2024-01-02.
    const DAY1_LATE: i64 = 1_704_150_000;
    const DAY2_EARLY: i64 = 1_704_157_200;
    const DAY2_LATER: i64 = 1_704_160_800;

    fn sample() -> Vec<NormalizedTransaction> {
        vec![
            tx("s3", Some(DAY2_LATER), vec![transfer(Some("me"), Some("carol"), "SOL", 3)]),
            tx("s2", Some(DAY2_EARLY), vec![transfer(Some("bob"), Some("me"), "USDC", 2)]),
            tx("s1", Some(DAY1_LATE), vec![transfer(Some("alice"), Some("me"), "SOL", 1)]),
            tx("s0", None, vec![transfer(Some("dave"), None, "SOL", 9)]),
        ]
    }

    #[test]
    fn two_calendar_days_with_one_undated_transaction() {
        let metrics = aggregate("me", &sample());

        assert_eq!(metrics.active_day_count, 2);
        // Three hours between first and last dated transaction rounds up to
        // one day.
        assert_eq!(metrics.total_day_span, 1);
        assert_eq!(metrics.transaction_count, 4);
        assert_eq!(metrics.undated_transaction_count, 1);
        assert_eq!(
            metrics.first_transaction,
            Some(Utc.timestamp_opt(DAY1_LATE, 0).unwrap())
        );
        assert_eq!(
            metrics.last_transaction,
            Some(Utc.timestamp_opt(DAY2_LATER, 0).unwrap())
        );
    }

    #[test]
    fn counterparties_skip_nulls_and_the_queried_address() {
        let metrics = aggregate("me", &sample());
        // alice, bob, carol, dave; "me" and the null endpoint are skipped.
        assert_eq!(metrics.interacted_address_count, 4);
    }

    #[test]
    fn asset_history_is_ordered_and_falls_back_to_amount() {
        let metrics = aggregate("me", &sample());

        let sol = &metrics.asset_history["SOL"];
        // Dated SOL transfers only, ascending by timestamp.
        assert_eq!(sol.len(), 2);
        assert!(sol[0].timestamp < sol[1].timestamp);
        assert_eq!(sol[0].value, Decimal::from(1));
        assert_eq!(sol[1].value, Decimal::from(3));

        assert_eq!(metrics.asset_history["USDC"].len(), 1);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let transactions = sample();
        let first = aggregate("me", &transactions);
        let second = aggregate("me", &transactions);

        assert_eq!(first.active_day_count, second.active_day_count);
        assert_eq!(first.total_day_span, second.total_day_span);
        assert_eq!(first.interacted_address_count, second.interacted_address_count);
        assert_eq!(first.asset_history, second.asset_history);
        assert_eq!(first.first_transaction, second.first_transaction);
        assert_eq!(first.last_transaction, second.last_transaction);
    }

    #[test]
    fn span_and_ratio_guard_small_inputs() {
        let single = vec![tx("s1", Some(DAY1_LATE), vec![])];
        let metrics = aggregate("me", &single);
        assert_eq!(metrics.total_day_span, 0);
        assert!(metrics.activity_ratio().is_none());

        let metrics = aggregate("me", &sample());
        assert_eq!(metrics.activity_ratio(), Some(2.0));
    }
}
