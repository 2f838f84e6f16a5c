pub mod client;
pub mod helius;
pub mod resilience;

pub use client::{ApiClientConfig, HistoryApi};
pub use helius::HeliusClient;
pub use resilience::{retry_with_policy, RetryPolicy};
