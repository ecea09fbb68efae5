use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use nixgui_core::fixtures::{self, Service, SystemStats, ValidationReport};

use crate::auth::middleware::AuthUser;
use crate::dto::{ConfigurationResponse, HealthResponse, JsonBody};
use crate::error::AppError;
use crate::state::AppState;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn services(_user: AuthUser) -> Json<Vec<Service>> {
    Json(fixtures::services())
}

pub async fn configuration(_user: AuthUser) -> Json<ConfigurationResponse> {
    Json(ConfigurationResponse {
        content: fixtures::CONFIGURATION,
    })
}

pub async fn validate_configuration(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<serde_json::Value>,
) -> Result<Json<ValidationReport>, AppError> {
    AuthUser::from_headers(&headers, &state)?;
    let content = body.get("content").and_then(|c| c.as_str());
    Ok(Json(fixtures::validate_configuration(content)))
}

pub async fn stats(_user: AuthUser) -> Json<SystemStats> {
    Json(fixtures::system_stats())
}
