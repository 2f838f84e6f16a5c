pub mod error;
pub mod metrics;
pub mod transaction;

pub use error::*;
pub use metrics::*;
pub use transaction::*;
