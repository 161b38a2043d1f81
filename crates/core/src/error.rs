//! Mapping from fleet errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bloomnet_fleet::Error;
use serde_json::json;

/// Wrapper turning fleet errors into HTTP error responses.
///
/// Retryable ledger unavailability maps to 503 with the same "warming up"
/// phrasing operators already watch for; everything else keeps its
/// message in the `detail` field.
pub struct ApiError(pub Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            Error::InvalidArgument(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Error::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            Error::LedgerUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Ledger is warming up, please wait.".to_owned(),
            ),
            Error::ControlPlaneUnavailable(message) => {
                (StatusCode::SERVICE_UNAVAILABLE, message.clone())
            }
            Error::Ledger(message) | Error::Replication(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}
