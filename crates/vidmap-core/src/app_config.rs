use std::net::SocketAddr;

use crate::types::Coordinate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Backend settings. Provider settings live in [`ProviderConfig`].
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub token_secret: String,
    pub token_ttl_secs: u64,
    pub google_client_id: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub provider: ProviderConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("token_secret", &"[redacted]")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("google_client_id", &self.google_client_id)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("provider", &self.provider)
            .finish()
    }
}

/// Geocoding and video provider settings, shared by the server and the CLI.
#[derive(Clone)]
pub struct ProviderConfig {
    pub youtube_api_key: Option<String>,
    pub mapbox_access_token: Option<String>,
    pub http_timeout_secs: u64,
    pub search_radius_km: u32,
    pub jitter_radius_km: f64,
    pub max_results: u32,
    pub language: String,
    pub default_region: String,
    pub default_center: Coordinate,
    pub geolocation_timeout_ms: u64,
    pub trending_timeout_ms: u64,
    pub video_max_retries: u32,
    pub video_retry_backoff_base_ms: u64,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field(
                "youtube_api_key",
                &self.youtube_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "mapbox_access_token",
                &self.mapbox_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("search_radius_km", &self.search_radius_km)
            .field("jitter_radius_km", &self.jitter_radius_km)
            .field("max_results", &self.max_results)
            .field("language", &self.language)
            .field("default_region", &self.default_region)
            .field("default_center", &self.default_center)
            .field("geolocation_timeout_ms", &self.geolocation_timeout_ms)
            .field("trending_timeout_ms", &self.trending_timeout_ms)
            .field("video_max_retries", &self.video_max_retries)
            .field(
                "video_retry_backoff_base_ms",
                &self.video_retry_backoff_base_ms,
            )
            .finish()
    }
}
