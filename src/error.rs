use axum::{http::StatusCode, response::Json};
use pipeline::PipelineError;
use tracing::{error, warn};

use crate::schemas::ErrorResponse;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Maps a pipeline failure onto a status code and error body.
pub fn error_response(err: PipelineError) -> ApiError {
    match err {
        PipelineError::Validation { .. } => {
            warn!("Validation failed: {}", err);
            api_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string())
        }
        PipelineError::NotFound(message) => {
            warn!("Not found: {}", message);
            api_error(StatusCode::NOT_FOUND, "NOT_FOUND", message)
        }
        PipelineError::Conflict(message) => {
            warn!("Rejected by current state: {}", message);
            api_error(StatusCode::BAD_REQUEST, "CONFLICT", message)
        }
        PipelineError::Forbidden(message) => {
            warn!("Forbidden: {}", message);
            api_error(StatusCode::FORBIDDEN, "PERMISSION_DENIED", message)
        }
        PipelineError::Unauthenticated => api_error(
            StatusCode::UNAUTHORIZED,
            "NOT_AUTHENTICATED",
            err.to_string(),
        ),
        PipelineError::Database(db_error) => {
            error!("Database error: {}", db_error);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Internal server error",
            )
        }
    }
}
