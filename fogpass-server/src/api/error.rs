use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use fogpass::IntakeError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

pub fn bad_request(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: msg.into() }),
    )
}

pub fn not_found(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse { error: msg.into() }),
    )
}

pub fn internal_error(e: impl std::fmt::Display) -> ApiError {
    tracing::error!(error = %e, "Request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// Maps intake rejections to their HTTP status.
pub fn intake_error(e: IntakeError) -> ApiError {
    match e {
        IntakeError::MissingFile
        | IntakeError::EmptyFile
        | IntakeError::UnsupportedFileType(_) => bad_request(e.to_string()),
        IntakeError::RouteNotFound(_) => not_found(e.to_string()),
        IntakeError::Staging { .. } | IntakeError::Database(_) | IntakeError::Worker(_) => {
            internal_error(e)
        }
    }
}
