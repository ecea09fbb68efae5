use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::AppState;

/// Key used when the connection address is unavailable.
const UNKNOWN_CLIENT: &str = "unknown";

/// Per-IP sliding-window limit, checked before auth and routing.
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&req);

    if !state.rate_limiter.allow(&key) {
        tracing::warn!("Rate limit exceeded for {key}");
        return AppError::RateLimited.into_response();
    }

    next.run(req).await
}

fn client_key(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_peer_ip_without_port() {
        let mut req = Request::new(Body::empty());
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 50123))));
        assert_eq!(client_key(&req), "10.0.0.7");
    }

    #[test]
    fn missing_connect_info_uses_shared_key() {
        let req = Request::new(Body::empty());
        assert_eq!(client_key(&req), UNKNOWN_CLIENT);
    }
}
