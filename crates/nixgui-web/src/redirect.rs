//! Optional plain-HTTP listener that bounces every request to HTTPS.

use std::net::SocketAddr;

use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;

pub fn router(https_port: u16) -> Router {
    Router::new().fallback(move |headers: HeaderMap, uri: Uri| async move {
        redirect(&headers, &uri, https_port)
    })
}

pub async fn serve(addr: SocketAddr, https_port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP redirect server on http://{}", addr);
    axum::serve(listener, router(https_port)).await?;
    Ok(())
}

fn redirect(headers: &HeaderMap, uri: &Uri, https_port: u16) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok());
    let location = https_location(host, uri, https_port);
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

/// Rewrites the request target onto the HTTPS port of the same host.
pub fn https_location(host: Option<&str>, uri: &Uri, https_port: u16) -> String {
    let host = host.map(strip_port).unwrap_or("localhost");
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    if https_port == 443 {
        format!("https://{host}{target}")
    } else {
        format!("https://{host}:{https_port}{target}")
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal: keep through the closing bracket.
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}
