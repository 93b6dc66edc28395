//! Client for the place-search / reverse-geocode provider.

pub mod client;
pub mod error;
pub mod types;

pub use client::GeocodingClient;
pub use error::GeocodeError;
