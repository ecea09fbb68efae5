use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{api, middleware, ws};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Full application: routes plus, from the outside in, tracing, CORS
/// (with the preflight short-circuit), security headers, rate limiting
/// and the body size cap.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api::router())
        .nest("/ws", ws::router())
        .fallback(api::not_found)
        .method_not_allowed_fallback(api::not_found)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::rate_limit::rate_limit,
        ))
        .layer(from_fn(middleware::security_headers::security_headers))
        .layer(from_fn(middleware::cors::cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{Method, Request, Response, StatusCode};
    use http_body_util::BodyExt;
    use nixgui_core::{DemoUserStore, PackageRecord, StaticCatalog, User, UserStore};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::jwt::Claims;
    use crate::config::ServerConfig;

    const PROTECTED_GETS: &[&str] = &[
        "/api/auth/verify",
        "/api/packages/installed",
        "/api/services",
        "/api/configuration",
        "/api/system/stats",
    ];

    const PROTECTED_POSTS: &[(&str, &str)] = &[
        ("/api/packages/search", r#"{"query":"git"}"#),
        ("/api/configuration/validate", r#"{"content":"{ }"}"#),
        ("/api/ws/ticket", ""),
    ];

    fn test_state() -> AppState {
        state_with(ServerConfig::default())
    }

    fn state_with(config: ServerConfig) -> AppState {
        AppState::new(
            config,
            Arc::new(DemoUserStore),
            Arc::new(StaticCatalog::default()),
        )
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        if !body.is_empty() {
            builder = builder.header("content-type", "application/json");
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(state: &AppState, req: Request<Body>) -> Response<Body> {
        build_router(state.clone()).oneshot(req).await.unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(state: &AppState, username: &str, password: &str) -> Response<Body> {
        let body = json!({ "username": username, "password": password }).to_string();
        send(state, request(Method::POST, "/api/auth/login", None, &body)).await
    }

    async fn token_for(state: &AppState, password: &str) -> String {
        let response = login(state, "admin", password).await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["token"].as_str().unwrap().to_string()
    }

    fn assert_cors_headers<B>(response: &Response<B>) {
        let h = response.headers();
        assert_eq!(h["access-control-allow-origin"], "*");
        assert_eq!(h["access-control-allow-methods"], "GET, POST, PUT, DELETE, OPTIONS");
        assert_eq!(h["access-control-allow-headers"], "Content-Type, Authorization");
    }

    fn assert_security_headers<B>(response: &Response<B>) {
        let h = response.headers();
        assert_eq!(h["x-content-type-options"], "nosniff");
        assert_eq!(h["x-frame-options"], "DENY");
        assert_eq!(h["x-xss-protection"], "1; mode=block");
        assert_eq!(h["strict-transport-security"], "max-age=31536000");
        assert_eq!(h["content-security-policy"], "default-src 'self'");
    }

    #[tokio::test]
    async fn health_is_public() {
        let state = test_state();
        let response = send(&state, request(Method::GET, "/api/health", None, "")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/json");
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn login_accepts_both_demo_passwords() {
        let state = test_state();
        for password in ["testpass", "changeme"] {
            let response = login(&state, "admin", password).await;
            assert_eq!(response.status(), StatusCode::OK);

            let body = json_body(response).await;
            assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
            assert!(body["expires_at"].as_u64().is_some());
            assert_eq!(body["user"], json!({ "username": "admin", "role": "admin" }));
        }
    }

    #[tokio::test]
    async fn login_rejects_other_pairs_without_token() {
        let state = test_state();
        for (username, password) in [("admin", "wrong"), ("root", "testpass"), ("guest", "guest")] {
            let response = login(&state, username, password).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = json_body(response).await;
            assert!(body.get("token").is_none());
            assert_eq!(body["error"], "Invalid credentials");
        }
    }

    #[tokio::test]
    async fn login_missing_fields_is_bad_request() {
        let state = test_state();
        for body in [r#"{"username":"admin"}"#, r#"{"password":"testpass"}"#, r#"{"username":"","password":"x"}"#, ""] {
            let response = send(&state, request(Method::POST, "/api/auth/login", None, body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body:?}");
            assert_eq!(json_body(response).await["error"], "Missing credentials");
        }
    }

    #[tokio::test]
    async fn invalid_json_is_bad_request() {
        let state = test_state();
        let response = send(&state, request(Method::POST, "/api/auth/login", None, "{oops")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_security_headers(&response);
        assert_eq!(json_body(response).await["error"], "Invalid JSON");
    }

    #[tokio::test]
    async fn invalid_json_on_protected_posts_is_bad_request_before_auth() {
        let state = test_state();
        let token = token_for(&state, "testpass").await;
        for uri in ["/api/packages/search", "/api/configuration/validate"] {
            for auth in [None, Some(token.as_str())] {
                let response = send(&state, request(Method::POST, uri, auth, "{bad json")).await;
                assert_eq!(response.status(), StatusCode::BAD_REQUEST, "POST {uri} auth={}", auth.is_some());
                assert_security_headers(&response);
                assert_eq!(json_body(response).await["error"], "Invalid JSON");
            }
        }
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let state = test_state();
        for uri in PROTECTED_GETS {
            let response = send(&state, request(Method::GET, uri, None, "")).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "GET {uri}");
        }
        for (uri, body) in PROTECTED_POSTS {
            let response = send(&state, request(Method::POST, uri, None, body)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "POST {uri}");
        }
    }

    #[tokio::test]
    async fn login_token_opens_every_protected_route() {
        let state = test_state();
        for password in ["testpass", "changeme"] {
            let token = token_for(&state, password).await;
            for uri in PROTECTED_GETS {
                let response = send(&state, request(Method::GET, uri, Some(token.as_str()), "")).await;
                assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
            }
            for (uri, body) in PROTECTED_POSTS {
                let response = send(&state, request(Method::POST, uri, Some(token.as_str()), body)).await;
                assert_eq!(response.status(), StatusCode::OK, "POST {uri}");
            }
        }
    }

    #[tokio::test]
    async fn expired_token_is_rejected_everywhere() {
        let state = test_state();
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let expired = state
            .tokens
            .sign(&Claims {
                username: "admin".into(),
                role: "admin".into(),
                exp: now - 1,
            })
            .unwrap();

        for uri in PROTECTED_GETS {
            let response = send(&state, request(Method::GET, uri, Some(expired.as_str()), "")).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "GET {uri}");
            assert_eq!(json_body(response).await["error"], "Unauthorized");
        }
    }

    #[tokio::test]
    async fn token_from_other_secret_is_rejected() {
        let state = test_state();
        let mut other_config = ServerConfig::default();
        other_config.auth.jwt_secret = "someone-else".to_string();
        let other = state_with(other_config);
        let foreign = token_for(&other, "testpass").await;

        let response = send(&state, request(Method::GET, "/api/services", Some(foreign.as_str()), "")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_authorization_is_rejected_identically() {
        let state = test_state();
        let token = token_for(&state, "testpass").await;

        for value in [format!("Token {token}"), "Bearer".to_string(), "Bearer garbage".to_string()] {
            let req = Request::builder()
                .uri("/api/system/stats")
                .header("authorization", value)
                .body(Body::empty())
                .unwrap();
            let response = send(&state, req).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(json_body(response).await["error"], "Unauthorized");
        }
    }

    #[tokio::test]
    async fn verify_echoes_token_user() {
        let state = test_state();
        let token = token_for(&state, "changeme").await;
        let response = send(&state, request(Method::GET, "/api/auth/verify", Some(token.as_str()), "")).await;

        assert_eq!(
            json_body(response).await,
            json!({ "valid": true, "user": { "username": "admin", "role": "admin" } })
        );
    }

    #[tokio::test]
    async fn package_search_filters_case_insensitively() {
        let state = test_state();
        let token = token_for(&state, "testpass").await;

        let search = |query: &'static str| {
            let state = state.clone();
            let token = token.clone();
            async move {
                let body = json!({ "query": query }).to_string();
                send(&state, request(Method::POST, "/api/packages/search", Some(token.as_str()), &body)).await
            }
        };

        let response = search("git").await;
        assert_eq!(response.status(), StatusCode::OK);
        let names: Vec<String> = json_body(response).await.as_array().unwrap().iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["git", "git-lfs", "gitui"]);

        let response = search("LFS").await;
        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "git-lfs");

        let response = search("x").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Query too short");
    }

    #[tokio::test]
    async fn search_without_query_is_bad_request() {
        let state = test_state();
        let token = token_for(&state, "testpass").await;
        let response = send(&state, request(Method::POST, "/api/packages/search", Some(token.as_str()), "{}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn fixture_payloads() {
        let state = test_state();
        let token = token_for(&state, "testpass").await;

        let installed = json_body(send(&state, request(Method::GET, "/api/packages/installed", Some(token.as_str()), "")).await).await;
        assert_eq!(installed[0], json!({ "name": "nodejs", "version": "20.5.0" }));

        let services = json_body(send(&state, request(Method::GET, "/api/services", Some(token.as_str()), "")).await).await;
        assert_eq!(services[0], json!({ "name": "nginx", "status": "active", "enabled": true }));

        let config = json_body(send(&state, request(Method::GET, "/api/configuration", Some(token.as_str()), "")).await).await;
        assert!(config["content"].as_str().unwrap().contains("networking.hostName = \"nixos\";"));

        let stats = json_body(send(&state, request(Method::GET, "/api/system/stats", Some(token.as_str()), "")).await).await;
        assert_eq!(stats["cpu"]["cores"], 4);
        assert_eq!(stats["disk"]["free"], 50u64 * 1024 * 1024 * 1024);

        let report = json_body(
            send(&state, request(Method::POST, "/api/configuration/validate", Some(token.as_str()), "[]")).await,
        )
        .await;
        assert_eq!(report, json!({ "valid": true, "warnings": [], "errors": [] }));
    }

    #[tokio::test]
    async fn injected_stores_replace_demo_data() {
        struct OnlyBob;
        impl UserStore for OnlyBob {
            fn authenticate(&self, username: &str, password: &str) -> Option<User> {
                (username == "bob" && password == "pw").then(|| User::new("bob", "viewer"))
            }
        }

        let catalog = StaticCatalog::new(
            vec![PackageRecord::new("htop", "3.2.2")],
            vec![PackageRecord::new("ripgrep", "14.0.3")],
        );
        let state = AppState::new(ServerConfig::default(), Arc::new(OnlyBob), Arc::new(catalog));

        assert_eq!(login(&state, "admin", "testpass").await.status(), StatusCode::UNAUTHORIZED);
        let response = login(&state, "bob", "pw").await;
        let body = json_body(response).await;
        assert_eq!(body["user"]["role"], "viewer");
        let token = body["token"].as_str().unwrap();

        let installed = json_body(send(&state, request(Method::GET, "/api/packages/installed", Some(token), "")).await).await;
        assert_eq!(installed, json!([{ "name": "htop", "version": "3.2.2" }]));
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found_regardless_of_auth() {
        let state = test_state();
        let token = token_for(&state, "testpass").await;

        for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
            for auth in [None, Some(token.as_str())] {
                for uri in ["/", "/api", "/api/nope", "/api/packages", "/ws/nope"] {
                    let response = send(&state, request(method.clone(), uri, auth, "")).await;
                    assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
                    assert_cors_headers(&response);
                    assert_security_headers(&response);
                }
            }
        }
    }

    #[tokio::test]
    async fn wrong_method_on_known_path_is_not_found() {
        let state = test_state();
        for (method, uri) in [
            (Method::GET, "/api/auth/login"),
            (Method::POST, "/api/health"),
            (Method::DELETE, "/api/services"),
            (Method::GET, "/api/packages/search"),
        ] {
            let response = send(&state, request(method.clone(), uri, None, "")).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn preflight_is_bare_ok_with_cors_only() {
        let state = test_state();
        for uri in ["/api/health", "/api/services", "/anything/at/all"] {
            let response = send(&state, request(Method::OPTIONS, uri, None, "")).await;

            assert_eq!(response.status(), StatusCode::OK);
            assert_cors_headers(&response);
            assert!(response.headers().get("content-security-policy").is_none());
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            assert!(bytes.is_empty());
        }
    }

    #[tokio::test]
    async fn every_response_carries_fixed_headers() {
        let state = test_state();
        let token = token_for(&state, "testpass").await;
        let requests = vec![
            request(Method::GET, "/api/health", None, ""),
            request(Method::GET, "/api/services", None, ""),
            request(Method::GET, "/api/services", Some(token.as_str()), ""),
            request(Method::POST, "/api/auth/login", None, "{bad"),
            request(Method::POST, "/api/packages/search", Some(token.as_str()), r#"{"query":"x"}"#),
        ];

        for req in requests {
            let response = send(&state, req).await;
            assert_cors_headers(&response);
            assert_security_headers(&response);
        }
    }

    #[tokio::test]
    async fn rate_limit_applies_before_auth_and_routing() {
        let mut config = ServerConfig::default();
        config.rate_limit.requests_per_window = 3;
        let state = state_with(config);
        let client = SocketAddr::from(([203, 0, 113, 5], 40000));
        let other = SocketAddr::from(([203, 0, 113, 6], 40000));

        let from = |addr: SocketAddr, uri: &str| {
            let mut req = request(Method::GET, uri, None, "");
            req.extensions_mut().insert(ConnectInfo(addr));
            req
        };

        assert_eq!(send(&state, from(client, "/api/health")).await.status(), StatusCode::OK);
        assert_eq!(send(&state, from(client, "/api/services")).await.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(send(&state, from(client, "/nope")).await.status(), StatusCode::NOT_FOUND);

        for uri in ["/api/health", "/api/services", "/nope"] {
            let response = send(&state, from(client, uri)).await;
            assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS, "{uri}");
            assert_cors_headers(&response);
            assert_security_headers(&response);
            assert_eq!(json_body(response).await["error"], "Too many requests");
        }

        // Preflight is exempt, and other clients are unaffected.
        let mut preflight = request(Method::OPTIONS, "/api/health", None, "");
        preflight.extensions_mut().insert(ConnectInfo(client));
        assert_eq!(send(&state, preflight).await.status(), StatusCode::OK);
        assert_eq!(send(&state, from(other, "/api/health")).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn default_limit_admits_one_hundred_requests() {
        let state = test_state();
        let client = SocketAddr::from(([198, 51, 100, 9], 1234));

        for i in 1..=101 {
            let mut req = request(Method::GET, "/api/health", None, "");
            req.extensions_mut().insert(ConnectInfo(client));
            let status = send(&state, req).await.status();
            if i <= 100 {
                assert_eq!(status, StatusCode::OK, "request {i}");
            } else {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS, "request {i}");
            }
        }
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let state = test_state();
        let big = "a".repeat(MAX_BODY_BYTES + 1);
        let body = format!(r#"{{"username":"{big}","password":"x"}}"#);
        let mut req = request(Method::POST, "/api/auth/login", None, &body);
        req.headers_mut()
            .insert("content-length", body.len().to_string().parse().unwrap());
        let response = send(&state, req).await;

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_cors_headers(&response);
    }

    #[tokio::test]
    async fn ws_ticket_is_single_use() {
        let state = test_state();
        let token = token_for(&state, "testpass").await;

        let response = send(&state, request(Method::POST, "/api/ws/ticket", Some(token.as_str()), "")).await;
        let ticket = json_body(response).await["ticket"].as_str().unwrap().to_string();
        assert_eq!(state.ws_tickets.len(), 1);

        // No `Connection: upgrade`: the ticket is burned, then the upgrade
        // extractor refuses the request.
        let uri = format!("/ws/stats?ticket={ticket}");
        let response = send(&state, request(Method::GET, &uri, None, "")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.ws_tickets.is_empty());

        let response = send(&state, request(Method::GET, &uri, None, "")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn ws_stats_without_ticket_is_unauthorized() {
        let state = test_state();
        let response = send(&state, request(Method::GET, "/ws/stats", None, "")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_security_headers(&response);
    }

    #[test]
    fn state_ttl_follows_config() {
        let mut config = ServerConfig::default();
        config.auth.token_ttl_hours = 2;
        let state = state_with(config);
        assert_eq!(state.tokens.ttl(), Duration::from_secs(7200));
    }
}
