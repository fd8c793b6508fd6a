use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::{AttemptError, BuildError, UpstreamError};
use crate::transport::{HttpTransport, Transport};
use crate::types::ChatMessage;

// ─── Completer ────────────────────────────────────────────────────────────

/// Anything that can turn a conversation into completion text.
///
/// Either returns clean text or an [`UpstreamError`]; never a partial result.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, UpstreamError>;
}

// ─── RetryPolicy ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Wait after the `attempt`-th (1-based) rate-limited attempt: base × 2^attempt.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_base: config.backoff_base(),
        }
    }
}

// ─── CompletionClient ─────────────────────────────────────────────────────

/// Applies [`RetryPolicy`] around a [`Transport`].
///
/// Every failed attempt counts toward the ceiling. A 429 additionally waits
/// `base × 2^attempt` before the next attempt, but only when one remains.
/// Other failures retry immediately. The last attempt's error is surfaced.
pub struct CompletionClient<T = HttpTransport> {
    transport: T,
    policy: RetryPolicy,
}

impl CompletionClient<HttpTransport> {
    /// Production client: HTTP transport keyed from the environment.
    pub fn from_config(config: &ClientConfig) -> Result<Self, BuildError> {
        let transport = HttpTransport::from_env(config)?;
        Ok(Self::new(transport, RetryPolicy::from(config)))
    }
}

impl<T: Transport> CompletionClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: Transport> Completer for CompletionClient<T> {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, UpstreamError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last: Option<AttemptError> = None;

        for attempt in 1..=max_attempts {
            match self.transport.send(messages, max_tokens).await {
                Ok(text) => {
                    debug!(attempt, chars = text.len(), "completion succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "completion attempt failed");
                    let rate_limited = e.is_rate_limited();
                    last = Some(e);
                    if rate_limited && attempt < max_attempts {
                        let wait = self.policy.backoff_for(attempt);
                        debug!(?wait, "rate limited, backing off");
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        let last_message = last.map(|e| e.to_string()).unwrap_or_default();
        error!(attempts = max_attempts, %last_message, "completion attempts exhausted");
        Err(UpstreamError {
            attempts: max_attempts,
            last_message,
        })
    }
}
