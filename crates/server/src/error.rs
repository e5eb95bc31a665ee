use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::DbErr;
use services::services::error::ServiceError;
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Service(err) => match err {
                ServiceError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
                ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
                ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
                ServiceError::Conflict(_) => (StatusCode::CONFLICT, "ConflictError"),
                ServiceError::Transport(_) => (StatusCode::BAD_GATEWAY, "TransportError"),
                ServiceError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
                ServiceError::Unknown(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
            },
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };

        // Server-side failures are logged in full; the client gets a short message.
        let error_message = match &self {
            ApiError::Service(err) => match err {
                ServiceError::Database(_) | ServiceError::Unknown(_) => {
                    "Internal server error".to_string()
                }
                ServiceError::Transport(_) => "Failed to send email".to_string(),
                other => other.to_string(),
            },
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::BadRequest(msg) => msg.clone(),
            _ if status_code.is_server_error() => "Internal server error".to_string(),
            _ => format!("{}: {}", error_type, self),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
