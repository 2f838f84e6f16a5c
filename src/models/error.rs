use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletLensError {
    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    #[error("History fetch failed after {attempts} attempts: {message}")]
    FetchFailed { attempts: u32, message: String },

    #[error("Upstream returned status {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Metadata unresolved for mint {0}")]
    MetadataUnresolved(String),

    #[error("Cancellation requested")]
    CancellationRequested,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, WalletLensError>;
