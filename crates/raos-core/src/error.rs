use completion_client::UpstreamError;
use thiserror::Error;
use uuid::Uuid;

use crate::mockup::MarkupDefect;
use crate::types::RecordState;

/// The extraction stage could not produce structured data.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The model was unreachable; propagated unchanged from the client.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The model answered, but not with the required JSON shape.
    #[error("invalid JSON from model: {source}")]
    InvalidJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Every mockup attempt failed validation or the final call failed upstream.
#[derive(Debug, Error)]
#[error("mockup generation failed after {attempts} attempts")]
pub struct GenerationError {
    pub attempts: u32,
    /// Set when the final attempt failed at the completion endpoint.
    #[source]
    pub upstream: Option<UpstreamError>,
    /// Set when the final attempt returned markup that failed validation.
    pub defect: Option<MarkupDefect>,
}

#[derive(Debug, Error)]
pub enum RaosError {
    #[error("requirement not found: {0}")]
    RequirementNotFound(Uuid),

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: RecordState,
        to: RecordState,
        reason: String,
    },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("concurrency gate is closed")]
    GateClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, RaosError>;
