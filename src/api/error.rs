use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rmp_client::NotFound;
use serde::Serialize;

use crate::engine::EngineError;

/// API-layer error type
#[derive(Debug)]
pub enum ApiError {
    /// 400 - Bad request (invalid input)
    BadRequest(String),

    /// 404 - Professor data could not be retrieved
    NotFound(String),

    /// 500 - Internal error
    Internal(String),

    /// 503 - Service unavailable (model produced nothing)
    Unavailable(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg),
        };

        let body = ErrorBody {
            error: error_type.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<NotFound> for ApiError {
    fn from(err: NotFound) -> Self {
        ApiError::NotFound(err.to_string())
    }
}

// Convert engine errors to API errors
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::EmptyCompletion => ApiError::Unavailable(
                "The model returned no answer. Try rephrasing the question.".into(),
            ),
            EngineError::Generation(e) => ApiError::Internal(format!("LLM error: {}", e)),
        }
    }
}
