use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    pub api: ApiSettings,
    pub fetch: FetchSettings,
    pub metadata: MetadataSettings,
    pub normalizer: NormalizerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the transaction-indexer API.
    pub base_url: String,
    pub api_key: String,
    /// JSON-RPC endpoint used for the balance query.
    pub rpc_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    pub max_transactions: usize,
    pub page_size: usize,
    /// Optional time window: only history newer than now minus this many
    /// days is fetched. None means the full history.
    pub window_days: Option<u32>,
    pub inter_page_delay_ms: u64,
    pub retry_max_attempts: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataSettings {
    /// Bound on concurrent metadata lookups.
    pub lookup_concurrency: usize,
    /// Minimum spacing between upstream metadata calls.
    pub min_spacing_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerSettings {
    /// Drop transfers whose endpoints are both the system program account.
    pub exclude_internal_transfers: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "Wallet Lens".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                log_level: "info".to_string(),
            },
            api: ApiSettings {
                base_url: "https://api.helius.xyz/v0".to_string(),
                api_key: String::new(),
                rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
                timeout_seconds: 30,
            },
            fetch: FetchSettings {
                max_transactions: 1000,
                page_size: 100,
                window_days: None,
                inter_page_delay_ms: 150,
                retry_max_attempts: 3,
                retry_delay_ms: 1500,
            },
            metadata: MetadataSettings {
                lookup_concurrency: 4,
                min_spacing_ms: 200,
            },
            normalizer: NormalizerSettings {
                exclude_internal_transfers: false,
            },
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("WALLET_LENS"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(path.as_ref()))
            .build()?;

        s.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.fetch.page_size == 0 || self.fetch.page_size > 100 {
            return Err(format!(
                "Page size must be between 1 and 100, got {}",
                self.fetch.page_size
            ));
        }

        if self.fetch.max_transactions == 0 {
            return Err("Max transactions must be at least 1".to_string());
        }

        if self.fetch.retry_max_attempts == 0 {
            return Err("Retry attempts must be at least 1".to_string());
        }

        if self.metadata.lookup_concurrency == 0 {
            return Err("Metadata lookup concurrency must be at least 1".to_string());
        }

        Ok(())
    }
}
