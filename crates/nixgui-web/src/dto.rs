use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use nixgui_core::User;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JSON request body where an empty body reads as `{}`.
///
/// Unlike `axum::Json` this ignores `Content-Type` and reports every
/// decoding failure as a 400 with the crate's error shape.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::debug!("Failed to read request body: {e}");
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge
            } else {
                AppError::BadRequest("Failed to read request body".to_string())
            }
        })?;

        let raw: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes[..]
        };

        let value: serde_json::Value = serde_json::from_slice(raw)
            .map_err(|_| AppError::BadRequest("Invalid JSON".to_string()))?;

        decode(value).map(JsonBody)
    }
}

/// Converts an already parsed body into a request type. Protected routes
/// take `JsonBody<Value>` first so malformed JSON is reported before the
/// token is checked, then decode once the caller is known.
pub fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: u64,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigurationResponse {
    pub content: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub ticket: String,
}
