//! Capped exponential backoff for rate-limited upstream calls.

use std::time::Duration;

use crate::config::ProviderConfig;

use super::{GenerationRequest, ModelProvider, ModelReply, ProviderError};

/// How many times to call the provider and how long to wait between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first call. Treated as at least 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: config.initial_backoff(),
        }
    }

    /// Delay after the given failed attempt (1-based): 2s, 4s, 8s, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(2u32.saturating_pow(exp))
    }
}

/// Call `provider`, retrying only on rate-limit responses.
///
/// Every other error is returned immediately. When the last attempt is also
/// rate limited, [`ProviderError::RateLimited`] is returned.
pub async fn generate_with_retry(
    provider: &dyn ModelProvider,
    request: &GenerationRequest,
    policy: RetryPolicy,
) -> Result<ModelReply, ProviderError> {
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match provider.generate(request).await {
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let wait = policy.backoff(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    wait_ms = wait.as_millis() as u64,
                    "rate limited by upstream model, backing off"
                );
                tokio::time::sleep(wait).await;
            }
            other => return other,
        }
    }

    Err(ProviderError::RateLimited)
}
