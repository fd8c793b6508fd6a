use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use raos_core::{ExtractionError, RaosError};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 401 Unauthorized errors
// ---------------------------------------------------------------------------

/// Private sentinel error type used to carry an explicit HTTP 401 through
/// the `anyhow::Error` chain without touching the `RaosError` enum.
#[derive(Debug)]
struct UnauthorizedError(String);

impl std::fmt::Display for UnauthorizedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UnauthorizedError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
///
/// `record_id` is echoed in the body when a pipeline stage failed after the
/// record was created, so the client can retry that stage by id.
#[derive(Debug)]
pub struct AppError {
    pub error: anyhow::Error,
    pub record_id: Option<Uuid>,
}

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        RaosError::Validation(msg.into()).into()
    }

    /// Construct a 401 Unauthorized error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        UnauthorizedError(msg.into()).into()
    }

    pub fn with_record(mut self, id: Uuid) -> Self {
        self.record_id = Some(id);
        self
    }

    /// HTTP status and machine-readable kind for this error.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        if self.error.downcast_ref::<UnauthorizedError>().is_some() {
            return (StatusCode::UNAUTHORIZED, "unauthorized");
        }
        let Some(e) = self.error.downcast_ref::<RaosError>() else {
            return (StatusCode::INTERNAL_SERVER_ERROR, "internal");
        };
        match e {
            RaosError::RequirementNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            RaosError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            RaosError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            RaosError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
            RaosError::Extraction(ExtractionError::Upstream(_)) => {
                (StatusCode::BAD_GATEWAY, "upstream")
            }
            RaosError::Extraction(ExtractionError::InvalidJson { .. }) => {
                (StatusCode::BAD_GATEWAY, "extraction")
            }
            RaosError::Generation(_) => (StatusCode::BAD_GATEWAY, "generation"),
            RaosError::GateClosed => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            RaosError::Io(_) | RaosError::Yaml(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();
        if status.is_server_error() {
            tracing::error!(error = %self.error, kind, "request failed");
        }

        let mut body = serde_json::json!({
            "error": self.error.to_string(),
            "kind": kind,
        });
        if let Some(id) = self.record_id {
            body["id"] = serde_json::json!(id);
        }
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            error: err.into(),
            record_id: None,
        }
    }
}
