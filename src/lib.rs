pub mod api;
pub mod config;
pub mod metadata;
pub mod models;
pub mod pipeline;

pub use config::Settings;
pub use models::{NormalizedTransaction, Result, TokenMetadata, WalletLensError, WalletMetrics};
pub use pipeline::{run_pipeline, CancelFlag, PipelineIssue, PipelineReport};

// Re-export commonly used types
pub use rust_decimal::Decimal;
