//! Provider seams used by the orchestrator, with implementations for the
//! real HTTP clients.

use async_trait::async_trait;
use vidmap_core::{Coordinate, ResolvedPlace, VideoResult};
use vidmap_geocode::{GeocodeError, GeocodingClient};
use vidmap_youtube::{LocationQuery, VideoError, VideoPage, YoutubeClient};

/// Place resolution.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    /// Resolves free text to a place.
    async fn resolve_text(&self, query: &str) -> Result<ResolvedPlace, GeocodeError>;

    /// Reverse-geocodes a coordinate.
    async fn resolve_coordinate(&self, coordinate: Coordinate)
        -> Result<ResolvedPlace, GeocodeError>;
}

/// Video retrieval.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// One page of results near `query.center`.
    async fn search_by_location(&self, query: &LocationQuery) -> Result<VideoPage, VideoError>;

    /// Popular videos for a region, placed around `anchor`.
    async fn fetch_trending(
        &self,
        region: &str,
        anchor: Coordinate,
    ) -> Result<Vec<VideoResult>, VideoError>;
}

#[async_trait]
impl PlaceLookup for GeocodingClient {
    async fn resolve_text(&self, query: &str) -> Result<ResolvedPlace, GeocodeError> {
        GeocodingClient::resolve_text(self, query).await
    }

    async fn resolve_coordinate(
        &self,
        coordinate: Coordinate,
    ) -> Result<ResolvedPlace, GeocodeError> {
        GeocodingClient::resolve_coordinate(self, coordinate).await
    }
}

#[async_trait]
impl VideoSource for YoutubeClient {
    async fn search_by_location(&self, query: &LocationQuery) -> Result<VideoPage, VideoError> {
        YoutubeClient::search_by_location(self, query).await
    }

    async fn fetch_trending(
        &self,
        region: &str,
        anchor: Coordinate,
    ) -> Result<Vec<VideoResult>, VideoError> {
        YoutubeClient::fetch_trending(self, region, anchor).await
    }
}
