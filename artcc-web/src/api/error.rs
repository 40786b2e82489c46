//! HTTP error mapping

use artcc_common::Error;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Handler-level error. Internal error details never reach the client;
/// they are logged and replaced with a generic message.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    App(Error),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::App(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "not authenticated".to_string())
            }
            ApiError::App(e) => match e {
                Error::NotFound(m) => (StatusCode::NOT_FOUND, m),
                Error::InvalidInput(m) => (StatusCode::BAD_REQUEST, m),
                Error::Forbidden(m) => (StatusCode::FORBIDDEN, m),
                Error::Conflict(m) => (StatusCode::CONFLICT, m),
                Error::ExternalFetch(m) => {
                    error!("upstream fetch failed: {}", m);
                    (StatusCode::BAD_GATEWAY, m)
                }
                other => {
                    error!("internal error: {}", other);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal server error".to_string(),
                    )
                }
            },
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
