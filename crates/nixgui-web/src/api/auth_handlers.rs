use axum::extract::State;
use axum::Json;

use crate::auth::middleware::AuthUser;
use crate::dto::{JsonBody, LoginRequest, LoginResponse, VerifyResponse};
use crate::error::AppError;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = body.username.filter(|u| !u.is_empty());
    let password = body.password.filter(|p| !p.is_empty());
    let (Some(username), Some(password)) = (username, password) else {
        return Err(AppError::BadRequest("Missing credentials".to_string()));
    };

    // Configured stores run argon2, keep it off the async workers.
    let users = state.users.clone();
    let candidate = username.clone();
    let user = tokio::task::spawn_blocking(move || users.authenticate(&candidate, &password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let Some(user) = user else {
        tracing::warn!(username = ?username, "Failed login attempt");
        return Err(AppError::Auth("Invalid credentials".to_string()));
    };

    let (token, expires_at) = state.tokens.issue_for(&user)?;
    tracing::info!("Issued token for user: {} (role: {})", user.username, user.role);

    Ok(Json(LoginResponse {
        token,
        expires_at,
        user,
    }))
}

pub async fn verify(AuthUser(user): AuthUser) -> Json<VerifyResponse> {
    Json(VerifyResponse { valid: true, user })
}
