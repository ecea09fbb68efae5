mod auth_handlers;
mod packages;
mod system;

use std::time::Instant;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;

use crate::auth::middleware::AuthUser;
use crate::dto::TicketResponse;
use crate::error::AppError;
use crate::state::{AppState, WsTicket};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/verify", get(auth_handlers::verify))
        .route("/packages/installed", get(packages::installed))
        .route("/packages/search", post(packages::search))
        .route("/services", get(system::services))
        .route("/configuration", get(system::configuration))
        .route("/configuration/validate", post(system::validate_configuration))
        .route("/system/stats", get(system::stats))
        .route("/ws/ticket", post(create_ws_ticket))
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

/// Creates a single-use, short-lived ticket for the stats WebSocket.
/// Browsers cannot attach an `Authorization` header to an upgrade request,
/// so the bearer token is exchanged here instead of travelling in the URL.
async fn create_ws_ticket(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Json<TicketResponse> {
    let ticket = uuid::Uuid::new_v4().to_string();
    state.ws_tickets.insert(
        ticket.clone(),
        WsTicket {
            username: user.username,
            created_at: Instant::now(),
        },
    );
    Json(TicketResponse { ticket })
}
