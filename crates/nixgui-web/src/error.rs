use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nixgui_core::CoreError;
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    RateLimited,
    Auth(String),
    BadRequest(String),
    PayloadTooLarge,
    NotFound(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl AppError {
    /// The one rejection every protected route returns, whatever the cause.
    pub fn unauthorized() -> Self {
        AppError::Auth("Unauthorized".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::RateLimited => "Too many requests".to_string(),
            AppError::PayloadTooLarge => "Request body too large".to_string(),
            AppError::Auth(msg) | AppError::BadRequest(msg) | AppError::NotFound(msg) => msg,
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let body = ErrorBody {
            success: false,
            error: message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{e:#}"))
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidQuery(msg) => AppError::BadRequest(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}
