use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use nixgui_core::PackageRecord;

use crate::auth::middleware::AuthUser;
use crate::dto::{self, JsonBody, SearchRequest};
use crate::error::AppError;
use crate::state::AppState;

pub async fn installed(_user: AuthUser, State(state): State<AppState>) -> Json<Vec<PackageRecord>> {
    Json(state.catalog.installed().to_vec())
}

pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(body): JsonBody<serde_json::Value>,
) -> Result<Json<Vec<PackageRecord>>, AppError> {
    AuthUser::from_headers(&headers, &state)?;
    let body: SearchRequest = dto::decode(body)?;
    let query = body.query.unwrap_or_default();
    let results = state.catalog.search(&query)?;
    tracing::debug!("Package search {query:?}: {} result(s)", results.len());
    Ok(Json(results))
}
