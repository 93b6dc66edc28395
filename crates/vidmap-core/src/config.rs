use std::env::VarError;
use std::net::SocketAddr;

use crate::app_config::{AppConfig, Environment, ProviderConfig};
use crate::types::Coordinate;
use crate::ConfigError;

const MIN_TOKEN_SECRET_LEN: usize = 32;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load provider configuration only, loading `.env` first.
///
/// Unlike [`load_app_config`] this needs neither `DATABASE_URL` nor the
/// token secret, so clients that only talk to the providers can use it.
///
/// # Errors
///
/// Returns `ConfigError` if a provider value is invalid.
pub fn load_provider_config() -> Result<ProviderConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_provider_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup, no `set_var`/`remove_var` needed.
///
/// # Errors
///
/// Returns `ConfigError` if required vars are missing or values are invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let database_url = require(&lookup, "DATABASE_URL")?;
    let token_secret = require(&lookup, "VIDMAP_TOKEN_SECRET")?;
    if token_secret.len() < MIN_TOKEN_SECRET_LEN {
        return Err(ConfigError::InvalidEnvVar {
            var: "VIDMAP_TOKEN_SECRET".to_string(),
            reason: format!("must be at least {MIN_TOKEN_SECRET_LEN} bytes"),
        });
    }

    let env = parse_environment(&or_default(&lookup, "VIDMAP_ENV", "development"))?;

    let bind_raw = or_default(&lookup, "VIDMAP_BIND_ADDR", "0.0.0.0:3000");
    let bind_addr = bind_raw
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "VIDMAP_BIND_ADDR".to_string(),
            reason: e.to_string(),
        })?;
    let log_level = or_default(&lookup, "VIDMAP_LOG_LEVEL", "info");
    let token_ttl_secs = parse_int(&lookup, "VIDMAP_TOKEN_TTL_SECS", "604800")?;
    let google_client_id = optional(&lookup, "GOOGLE_CLIENT_ID");

    let db_max_connections = parse_int(&lookup, "VIDMAP_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_int(&lookup, "VIDMAP_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_int(&lookup, "VIDMAP_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let provider = build_provider_config(&lookup)?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        token_secret,
        token_ttl_secs,
        google_client_id,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        provider,
    })
}

/// Build provider configuration using the provided env-var lookup function.
///
/// Every provider value has a default; the API credentials are optional.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn build_provider_config<F>(lookup: F) -> Result<ProviderConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let youtube_api_key = optional(&lookup, "YOUTUBE_API_KEY");
    let mapbox_access_token = optional(&lookup, "MAPBOX_ACCESS_TOKEN");

    let http_timeout_secs = parse_int(&lookup, "VIDMAP_HTTP_TIMEOUT_SECS", "15")?;
    let search_radius_km = parse_int(&lookup, "VIDMAP_SEARCH_RADIUS_KM", "50")?;
    let jitter_radius_km = parse_float(&lookup, "VIDMAP_JITTER_RADIUS_KM", "2.0")?;
    if jitter_radius_km < 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "VIDMAP_JITTER_RADIUS_KM".to_string(),
            reason: "must not be negative".to_string(),
        });
    }
    let max_results = parse_int::<u32, _>(&lookup, "VIDMAP_MAX_RESULTS", "25")?.clamp(1, 50);
    let language = or_default(&lookup, "VIDMAP_LANGUAGE", "es");

    let default_region = or_default(&lookup, "VIDMAP_DEFAULT_REGION", "ES").to_uppercase();
    let default_latitude = parse_float(&lookup, "VIDMAP_DEFAULT_LATITUDE", "40.4168")?;
    let default_longitude = parse_float(&lookup, "VIDMAP_DEFAULT_LONGITUDE", "-3.7038")?;
    let default_center = Coordinate::new(default_latitude, default_longitude).map_err(|e| {
        ConfigError::InvalidEnvVar {
            var: "VIDMAP_DEFAULT_LATITUDE/VIDMAP_DEFAULT_LONGITUDE".to_string(),
            reason: e.to_string(),
        }
    })?;

    let geolocation_timeout_ms = parse_int(&lookup, "VIDMAP_GEOLOCATION_TIMEOUT_MS", "8000")?;
    let trending_timeout_ms = parse_int(&lookup, "VIDMAP_TRENDING_TIMEOUT_MS", "5000")?;
    let video_max_retries = parse_int(&lookup, "VIDMAP_VIDEO_MAX_RETRIES", "2")?;
    let video_retry_backoff_base_ms =
        parse_int(&lookup, "VIDMAP_VIDEO_RETRY_BACKOFF_BASE_MS", "500")?;

    Ok(ProviderConfig {
        youtube_api_key,
        mapbox_access_token,
        http_timeout_secs,
        search_radius_km,
        jitter_radius_km,
        max_results,
        language,
        default_region,
        default_center,
        geolocation_timeout_ms,
        trending_timeout_ms,
        video_max_retries,
        video_retry_backoff_base_ms,
    })
}

fn require<F>(lookup: &F, var: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
}

fn or_default<F>(lookup: &F, var: &str, default: &str) -> String
where
    F: Fn(&str) -> Result<String, VarError>,
{
    lookup(var).unwrap_or_else(|_| default.to_string())
}

/// Blank values count as unset.
fn optional<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    lookup(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_int<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
    F: Fn(&str) -> Result<String, VarError>,
{
    let raw = or_default(lookup, var, default);
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

fn parse_float<F>(lookup: &F, var: &str, default: &str) -> Result<f64, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let raw = or_default(lookup, var, default);
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("not a finite number: {raw}"),
        })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VIDMAP_ENV".to_string(),
            reason: format!("expected development, test or production, got {other:?}"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
