use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use nixgui_core::{DemoUserStore, PackageCatalog, SlidingWindowLimiter, StaticCatalog, UserStore};

use crate::auth::jwt::TokenAuthority;
use crate::auth::password::ConfiguredUserStore;
use crate::config::ServerConfig;

/// A single-use, short-lived ticket for WebSocket authentication.
pub struct WsTicket {
    pub username: String,
    pub created_at: Instant,
}

/// Everything a request handler may touch. Built once per server instance.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub tokens: Arc<TokenAuthority>,
    pub users: Arc<dyn UserStore>,
    pub catalog: Arc<dyn PackageCatalog>,
    pub rate_limiter: Arc<SlidingWindowLimiter>,
    pub ws_tickets: Arc<DashMap<String, WsTicket>>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        users: Arc<dyn UserStore>,
        catalog: Arc<dyn PackageCatalog>,
    ) -> Self {
        let tokens = TokenAuthority::new(&config.auth.jwt_secret, config.auth.token_ttl());
        let rate_limiter = SlidingWindowLimiter::new(
            config.rate_limit.requests_per_window,
            config.rate_limit.window(),
        );

        Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            users,
            catalog,
            rate_limiter: Arc::new(rate_limiter),
            ws_tickets: Arc::new(DashMap::new()),
        }
    }

    /// Picks the user store and catalog named by `config`, falling back to
    /// the built-in demo data.
    pub fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let users: Arc<dyn UserStore> = if config.users.is_empty() {
            tracing::info!("Using demo credentials (admin)");
            Arc::new(DemoUserStore)
        } else {
            tracing::info!("Using {} configured user(s)", config.users.len());
            Arc::new(ConfiguredUserStore::new(config.users.clone()))
        };

        let catalog: Arc<dyn PackageCatalog> = match &config.catalog_path {
            Some(path) => Arc::new(StaticCatalog::load(path)?),
            None => Arc::new(StaticCatalog::default()),
        };

        Ok(Self::new(config, users, catalog))
    }
}
