//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use services::ServiceError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No caller identity on the request.
    Unauthorized(String),
    /// The caller lacks the admin role.
    Forbidden(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Cart or order service error.
    Service(ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Service(err) => service_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn service_error_to_response(err: ServiceError) -> (StatusCode, String) {
    let status = match &err {
        ServiceError::NotFound(_) | ServiceError::ItemNotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::AccessDenied(_) => StatusCode::FORBIDDEN,
        ServiceError::EmptyCart
        | ServiceError::InvalidInput(_)
        | ServiceError::ProductUnavailable(_) => StatusCode::BAD_REQUEST,
        ServiceError::InvalidTransition { .. }
        | ServiceError::CancellationNotAllowed { .. }
        | ServiceError::OptimisticLockConflict { .. } => StatusCode::CONFLICT,
        ServiceError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
        ServiceError::DataIntegrity(_) => {
            tracing::error!(error = %err, "data integrity error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}
