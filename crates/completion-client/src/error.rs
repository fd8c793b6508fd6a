use std::time::Duration;

use thiserror::Error;

/// Failure of a single request to the completion endpoint.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("rate limited (429): {0}")]
    RateLimited(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

impl AttemptError {
    /// Only a 429 earns the exponential backoff; everything else retries at once.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AttemptError::RateLimited(_))
    }
}

/// The completion endpoint failed on every allowed attempt.
#[derive(Debug, Clone, Error)]
#[error("completion endpoint failed after {attempts} attempts: {last_message}")]
pub struct UpstreamError {
    pub attempts: u32,
    pub last_message: String,
}

/// Errors raised while constructing a client from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("environment variable {0} is not set: the completion endpoint needs an API key")]
    MissingApiKey(String),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
