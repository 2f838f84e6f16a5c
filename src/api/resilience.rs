use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Bounded-retry policy with a fixed inter-retry delay. Decoupled from the
/// operation being retried so the same policy governs page fetches and
/// balance queries.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

/// Run an operation under a retry policy, sleeping the fixed delay between
/// attempts. Returns the last error once the attempt budget is exhausted.
pub async fn retry_with_policy<F, T, Fut, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!("Operation {} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                warn!("Operation {} failed on attempt {}: {}", operation_name, attempt, e);
                last_error = Some(e);

                if attempt < policy.max_attempts {
                    sleep(policy.delay).await;
                }
            }
        }
    }

    error!(
        "Operation {} failed after {} attempts",
        operation_name, policy.max_attempts
    );
    Err(last_error.unwrap())
}
