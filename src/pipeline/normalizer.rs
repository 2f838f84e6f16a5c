use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::metadata::TokenResolver;
use crate::models::{
    NormalizedTransaction, NormalizedTransfer, RawTransaction, TokenMetadata, TransferKind,
    NATIVE_DECIMALS, NATIVE_NAME, NATIVE_SYMBOL, SYSTEM_PROGRAM,
};

/// Raw base units to decimal units: raw / 10^decimals, exact.
fn from_base_units(raw: u64, decimals: u8) -> Decimal {
    Decimal::from_i128_with_scale(raw as i128, u32::from(decimals.min(28)))
}

fn is_internal(from: &Option<String>, to: &Option<String>) -> bool {
    from.as_deref() == Some(SYSTEM_PROGRAM) && to.as_deref() == Some(SYSTEM_PROGRAM)
}

/// Converts raw transaction records into the uniform transfer shape.
pub struct Normalizer {
    resolver: Arc<TokenResolver>,
    /// Drop transfers whose endpoints are both the system program account.
    exclude_internal_transfers: bool,
    /// Externally supplied native-asset price; absent means no fiat values.
    sol_price: Option<Decimal>,
}

impl Normalizer {
    pub fn new(
        resolver: Arc<TokenResolver>,
        exclude_internal_transfers: bool,
        sol_price: Option<Decimal>,
    ) -> Self {
        Self {
            resolver,
            exclude_internal_transfers,
            sol_price,
        }
    }

    pub async fn normalize_all(&self, raw: Vec<RawTransaction>) -> Vec<NormalizedTransaction> {
        let mut normalized = Vec::with_capacity(raw.len());
        for record in raw {
            normalized.push(self.normalize(record).await);
        }
        normalized
    }

    /// Build one normalized transaction from one raw record. A record with
    /// no block time yields `timestamp: None`; a transaction left with zero
    /// transfers after filtering is still retained so transaction counts
    /// stay consistent with the raw input.
    pub async fn normalize(&self, raw: RawTransaction) -> NormalizedTransaction {
        let timestamp = raw.block_time();
        let success = raw.is_success();
        let fee = from_base_units(raw.fee, NATIVE_DECIMALS);

        // Distinct mints resolve concurrently; the resolver coalesces and
        // bounds the actual upstream calls.
        let mints: BTreeSet<String> = raw
            .token_transfers
            .iter()
            .map(|t| t.mint.clone())
            .collect();
        let resolved: HashMap<String, TokenMetadata> = join_all(mints.into_iter().map(|mint| {
            let resolver = self.resolver.clone();
            async move {
                let metadata = resolver.resolve(&mint).await;
                (mint, metadata)
            }
        }))
        .await
        .into_iter()
        .collect();

        let mut transfers = Vec::new();

        for transfer in raw.token_transfers {
            if self.exclude_internal_transfers
                && is_internal(&transfer.from_user_account, &transfer.to_user_account)
            {
                continue;
            }

            // The resolver filled every mint in the set above.
            let metadata = resolved
                .get(&transfer.mint)
                .cloned()
                .unwrap_or_else(TokenMetadata::fallback);
            let decimals = transfer.decimals.unwrap_or(metadata.decimals);

            transfers.push(NormalizedTransfer {
                kind: TransferKind::Token,
                symbol: metadata.symbol,
                name: metadata.name,
                decimals,
                from: transfer.from_user_account,
                to: transfer.to_user_account,
                amount: from_base_units(transfer.token_amount, decimals),
                fiat_value: None,
            });
        }

        for transfer in raw.native_transfers {
            if self.exclude_internal_transfers
                && is_internal(&transfer.from_user_account, &transfer.to_user_account)
            {
                continue;
            }

            let amount = from_base_units(transfer.amount, NATIVE_DECIMALS);
            transfers.push(NormalizedTransfer {
                kind: TransferKind::Native,
                symbol: NATIVE_SYMBOL.to_string(),
                name: NATIVE_NAME.to_string(),
                decimals: NATIVE_DECIMALS,
                from: transfer.from_user_account,
                to: transfer.to_user_account,
                amount,
                fiat_value: self.sol_price.map(|price| price * amount),
            });
        }

        NormalizedTransaction {
            signature: raw.signature,
            timestamp,
            success,
            fee,
            transfers,
        }
    }
}
