//! Permissive CORS for development clients.
//!
//! Preflight requests never reach rate limiting, auth or routing: any
//! `OPTIONS` gets an empty 200 carrying only the CORS headers.

use axum::body::Body;
use axum::http::{header, header::HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

pub fn add_cors_headers(response: &mut Response) {
    let headers = response.headers_mut();

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

pub async fn cors(req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut response = StatusCode::OK.into_response();
        add_cors_headers(&mut response);
        return response;
    }

    let mut response = next.run(req).await;
    add_cors_headers(&mut response);
    response
}
