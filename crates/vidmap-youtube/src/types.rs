//! Video platform response types, plus the request/response shapes the
//! client exposes to callers.
//!
//! Wire types model only the fields the client reads. The platform encodes
//! counters as decimal strings, so `view_count` stays a `String` here and is
//! parsed during normalization.

use serde::{Deserialize, Serialize};
use vidmap_core::{Coordinate, VideoResult};

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchListResponse {
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
    #[serde(default)]
    pub snippet: Option<Snippet>,
}

/// `id` of a search hit. Channel and playlist hits carry no `videoId`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    #[serde(default)]
    pub video_id: Option<String>,
}

// ---------------------------------------------------------------------------
// videos (details + chart)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<Snippet>,
    #[serde(default)]
    pub statistics: Option<Statistics>,
    #[serde(default)]
    pub content_details: Option<ContentDetails>,
    #[serde(default)]
    pub recording_details: Option<RecordingDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    #[serde(default)]
    pub default: Option<Thumbnail>,
    #[serde(default)]
    pub medium: Option<Thumbnail>,
    #[serde(default)]
    pub high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default)]
    pub view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentDetails {
    /// ISO-8601 duration, e.g. `PT4M13S`.
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordingDetails {
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

// ---------------------------------------------------------------------------
// errors
// ---------------------------------------------------------------------------

/// Error body: `{"error": {"code": 403, "message": "...", "errors": [{"reason": "quotaExceeded"}]}}`.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// client-facing shapes
// ---------------------------------------------------------------------------

/// Inputs for one location-biased search page.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationQuery {
    pub center: Coordinate,
    pub place_name: String,
    /// Free text. When blank, the leading segment of `place_name` is used.
    pub query: String,
    pub page_token: Option<String>,
}

/// One page of map-ready results.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoPage {
    pub results: Vec<VideoResult>,
    pub next_page_token: Option<String>,
}

impl VideoPage {
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}

/// A video without a display position, as returned by plain text search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSummary {
    pub external_video_id: String,
    pub title: String,
    pub description: String,
    pub channel_name: String,
    pub thumbnail_url: Option<String>,
    pub view_count: u64,
    pub duration_iso8601: Option<String>,
    pub published_at: Option<String>,
    pub recording_location: Option<Coordinate>,
}

impl VideoSummary {
    /// Pins the summary to a display coordinate.
    #[must_use]
    pub fn place_at(self, coordinate: Coordinate, is_search_result: bool) -> VideoResult {
        let confirmed_location = self.recording_location.is_some();
        VideoResult {
            external_video_id: self.external_video_id,
            title: self.title,
            description: self.description,
            channel_name: self.channel_name,
            thumbnail_url: self.thumbnail_url,
            view_count: self.view_count,
            duration_iso8601: self.duration_iso8601,
            published_at: self.published_at,
            coordinate,
            recording_location: self.recording_location,
            is_search_result,
            confirmed_location,
        }
    }
}

/// A page of text-search summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSummaryPage {
    pub items: Vec<VideoSummary>,
    pub next_page_token: Option<String>,
}
