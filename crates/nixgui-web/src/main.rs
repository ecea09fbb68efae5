mod api;
mod app;
mod auth;
mod config;
mod dto;
mod error;
mod middleware;
mod redirect;
mod state;
mod tls;
mod ws;

use std::net::SocketAddr;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nixgui_web=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::load()?;
    let bind_addr = config.bind_addr;
    let http_addr = config.http_addr();
    let redirect_http = config.redirect_http;
    let tls_config = config.tls.clone();

    tracing::info!(
        "HTTPS port: {}, HTTP port: {} ({})",
        bind_addr.port(),
        http_addr.port(),
        if redirect_http { "redirecting" } else { "not started" }
    );

    let state = AppState::from_config(config)?;
    tracing::info!("Token lifetime: {}h", state.tokens.ttl().as_secs() / 3600);

    // Expired WebSocket ticket cleanup
    let cleanup_tickets = state.ws_tickets.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            crate::ws::sweep_expired_tickets(&cleanup_tickets);
        }
    });

    let app = app::build_router(state);

    tls::ensure_certificate(&tls_config).await?;
    let rustls_config = RustlsConfig::from_pem_file(&tls_config.cert_path, &tls_config.key_path).await?;

    if redirect_http {
        let https_port = bind_addr.port();
        tokio::spawn(async move {
            if let Err(e) = redirect::serve(http_addr, https_port).await {
                tracing::error!("HTTP redirect server failed: {e:#}");
            }
        });
    }

    tracing::info!("nixgui-web listening on https://{}", bind_addr);
    axum_server::bind_rustls(bind_addr, rustls_config)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}
