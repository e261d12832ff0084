use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use corae_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `corae_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a domain error to an HTTP status, error code, and message.
///
/// Server-side failures are logged here and answered with a generic message.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::TokenNotFound { .. } => {
            (StatusCode::NOT_FOUND, "TOKEN_NOT_FOUND", err.to_string())
        }
        CoreError::AssignmentMismatch { .. } => {
            (StatusCode::BAD_REQUEST, "ASSIGNMENT_MISMATCH", err.to_string())
        }
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::TokenExhaustion { .. }
        | CoreError::Storage(_)
        | CoreError::MetadataProbe(_)
        | CoreError::Internal(_) => {
            tracing::error!(error = %err, "Request failed");
            internal()
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: CoreError) -> StatusCode {
        AppError::Core(err).into_response().status()
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(
            status_of(CoreError::NotFound { entity: "Session", id: 1 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(CoreError::TokenNotFound { entity: "Participant" }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(CoreError::AssignmentMismatch { participants: 2, videos: 1 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(CoreError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(CoreError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(CoreError::TokenExhaustion { entity: "Video" }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(CoreError::Storage("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_request_is_400() {
        let response = AppError::BadRequest("no file".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
