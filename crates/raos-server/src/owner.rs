use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

/// Header carrying the authenticated caller id, set by the fronting proxy.
pub const OWNER_HEADER: &str = "x-owner-id";

/// Caller identity taken from [`OWNER_HEADER`]. Rejects with 401 when the
/// header is missing, blank or not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::unauthorized(format!("missing {OWNER_HEADER} header")))?;
        Ok(Owner(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    async fn extract(req: Request<()>) -> Result<Owner, AppError> {
        let (mut parts, _) = req.into_parts();
        Owner::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_trimmed_header() {
        let req = Request::builder()
            .header(OWNER_HEADER, " user-7 ")
            .body(())
            .unwrap();
        assert_eq!(extract(req).await.unwrap(), Owner("user-7".into()));
    }

    #[tokio::test]
    async fn missing_or_blank_header_is_401() {
        let missing = Request::builder().body(()).unwrap();
        let err = extract(missing).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);

        let blank = Request::builder().header(OWNER_HEADER, "  ").body(()).unwrap();
        assert!(extract(blank).await.is_err());
    }
}
