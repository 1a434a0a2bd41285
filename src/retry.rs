use tokio::time::{self, Duration};
use tracing::*;

/// Decides how long to hold the loop after a failed attempt.
///
/// Retries are unbounded by design of the telemetry loop: the policy only shapes the pause,
/// callers keep trying until the operation succeeds.
#[async_trait::async_trait]
pub trait RetryPolicy: Send {
    /// Called after failed attempt number `attempt` (1-based)
    async fn backoff(&mut self, attempt: u32);
}

/// Blocks the loop for a fixed delay after every failure
#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait::async_trait]
impl RetryPolicy for FixedBackoff {
    async fn backoff(&mut self, attempt: u32) {
        debug!("attempt {attempt} failed, retrying in {:?}", self.delay);
        time::sleep(self.delay).await;
    }
}
