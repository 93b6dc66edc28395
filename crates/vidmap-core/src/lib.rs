//! Shared domain types, configuration, and pure logic for vidmap.
//!
//! Everything in this crate is free of I/O apart from reading environment
//! variables: coordinates and resolved places, video results, the
//! restriction deny-list, category keyword lists, and small geo/duration
//! helpers used by the provider clients.

pub mod app_config;
pub mod category;
pub mod config;
pub mod duration;
pub mod geo;
pub mod restriction;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, ProviderConfig};
pub use category::Category;
pub use config::{
    build_app_config, build_provider_config, load_app_config, load_app_config_from_env,
    load_provider_config,
};
pub use restriction::{evaluate, is_restricted_country, RestrictionReason, RestrictionVerdict};
pub use types::{Coordinate, FeatureKind, ResolvedPlace, VideoResult};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("coordinate out of range: lat={latitude}, lng={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("unknown category: {0}")]
    UnknownCategory(String),
}
