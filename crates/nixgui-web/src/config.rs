use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_JWT_SECRET: &str = "test-secret-key";

#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password_hash: String,
    #[serde(default = "default_role")]
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Plain HTTP port. Only bound when `redirect_http` is set.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default)]
    pub redirect_http: bool,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub ws: WsConfig,
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: usize,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    #[serde(default = "default_cert_path")]
    pub cert_path: PathBuf,
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,
    #[serde(default = "default_openssl_bin")]
    pub openssl_bin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WsConfig {
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8443))
}
fn default_http_port() -> u16 { 8080 }
fn default_role() -> String { "user".to_string() }
fn default_jwt_secret() -> String { DEFAULT_JWT_SECRET.to_string() }
fn default_token_ttl_hours() -> u64 { 24 }
fn default_requests_per_window() -> usize { 100 }
fn default_window_secs() -> u64 { 60 }
fn default_cert_path() -> PathBuf { PathBuf::from("ssl/cert.pem") }
fn default_key_path() -> PathBuf { PathBuf::from("ssl/key.pem") }
fn default_openssl_bin() -> String { "openssl".to_string() }
fn default_stats_interval_secs() -> u64 { 5 }

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: default_requests_per_window(),
            window_secs: default_window_secs(),
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: default_cert_path(),
            key_path: default_key_path(),
            openssl_bin: default_openssl_bin(),
        }
    }
}

impl Default for WsConfig {
    fn default() -> Self {
        Self { stats_interval_secs: default_stats_interval_secs() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            http_port: default_http_port(),
            redirect_http: false,
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            tls: TlsConfig::default(),
            ws: WsConfig::default(),
            catalog_path: None,
            users: Vec::new(),
        }
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.saturating_mul(3600))
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl ServerConfig {
    /// Address of the plain HTTP redirect listener: same interface as the
    /// HTTPS listener, on `http_port`.
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr.ip(), self.http_port)
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("NIXGUI_MOCK_CONFIG")
            .map(PathBuf::from)
            .ok();

        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)?;
            tracing::info!("Loaded configuration from {}", path.display());
            toml::from_str(&contents)?
        } else {
            ServerConfig::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;

        if config.auth.jwt_secret == DEFAULT_JWT_SECRET {
            tracing::warn!("JWT secret: [DEFAULT]. Set JWT_SECRET to override.");
        } else {
            tracing::info!("JWT secret: [CONFIGURED]");
        }

        Ok(config)
    }

    /// Applies environment-style overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("JWT_SECRET") {
            if !secret.is_empty() {
                self.auth.jwt_secret = secret;
            }
        }

        if let Some(addr) = lookup("NIXGUI_BIND_ADDR") {
            self.bind_addr = addr.parse()?;
        }

        if let Some(port) = lookup("NIXGUI_HTTP_PORT") {
            self.http_port = port.parse()?;
        }

        if let Some(flag) = lookup("NIXGUI_REDIRECT_HTTP") {
            self.redirect_http = matches!(flag.as_str(), "1" | "true" | "yes");
        }

        if let Some(cert) = lookup("NIXGUI_TLS_CERT") {
            self.tls.cert_path = PathBuf::from(cert);
        }
        if let Some(key) = lookup("NIXGUI_TLS_KEY") {
            self.tls.key_path = PathBuf::from(key);
        }

        if let Some(path) = lookup("NIXGUI_CATALOG") {
            self.catalog_path = Some(PathBuf::from(path));
        }

        Ok(())
    }
}
