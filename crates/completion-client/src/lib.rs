//! `completion-client`: chat-completion client for OpenAI-compatible endpoints.
//!
//! The pipeline stages in `raos-core` depend only on the [`Completer`] trait;
//! this crate provides the production implementation and the retry policy
//! that wraps every outbound call.
//!
//! # Architecture
//!
//! ```text
//! &[ChatMessage], max_tokens
//!     │
//!     ▼
//! CompletionClient   ← retry policy: bounded attempts, 2^n backoff on 429 only
//!     │
//!     ▼
//! Transport          ← exactly one HTTP attempt (HttpTransport in production)
//!     │
//!     ▼
//! POST {base_url}/chat/completions
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use completion_client::{ChatMessage, ClientConfig, Completer, CompletionClient};
//!
//! let client = CompletionClient::from_config(&ClientConfig::default())?;
//! let text = client.complete(&[ChatMessage::user("say hello")], 64).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{Completer, CompletionClient, RetryPolicy};
pub use config::ClientConfig;
pub use error::{AttemptError, BuildError, UpstreamError};
pub use transport::{HttpTransport, Transport};
pub use types::{ChatMessage, Role};
