use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use nixgui_core::User;

use crate::error::AppError;
use crate::state::AppState;

/// Caller identity taken from a valid `Authorization: Bearer` token.
///
/// Missing header, wrong scheme, bad signature and expiry all reject with
/// the same 401.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        AuthUser::from_headers(&parts.headers, state)
    }
}

impl AuthUser {
    /// Same check as the extractor, for handlers that must read the body
    /// before authenticating.
    pub fn from_headers(headers: &HeaderMap, state: &AppState) -> Result<Self, AppError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(AppError::unauthorized)?;

        let claims = state.tokens.verify(token).map_err(|e| {
            tracing::debug!("Rejected bearer token: {e}");
            AppError::unauthorized()
        })?;

        Ok(AuthUser(claims.user()))
    }
}
