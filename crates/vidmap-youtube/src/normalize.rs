//! Normalization of platform wire types into domain results.
//!
//! Everything here is synchronous and takes the random source as a
//! parameter, so marker placement is reproducible under a seeded RNG.

use std::collections::HashMap;

use rand::Rng;
use vidmap_core::geo::jitter_around;
use vidmap_core::{Coordinate, VideoResult};

use crate::types::{SearchItem, Snippet, Thumbnails, VideoItem, VideoSummary};

/// Picks the largest available thumbnail.
#[must_use]
pub fn best_thumbnail(thumbnails: &Thumbnails) -> Option<String> {
    thumbnails
        .high
        .as_ref()
        .or(thumbnails.medium.as_ref())
        .or(thumbnails.default.as_ref())
        .map(|t| t.url.clone())
}

/// Parses the platform's string-encoded counter. Missing or malformed
/// values count as zero.
#[must_use]
pub fn parse_view_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}

/// Summary from a details (`videos`) item, including any verified
/// recording location.
#[must_use]
pub fn summary_from_details(item: &VideoItem) -> VideoSummary {
    let empty = Snippet::default();
    let snippet = item.snippet.as_ref().unwrap_or(&empty);

    let recording_location = item
        .recording_details
        .as_ref()
        .and_then(|r| r.location.as_ref())
        .and_then(|p| match (p.latitude, p.longitude) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng).ok(),
            _ => None,
        });

    VideoSummary {
        external_video_id: item.id.clone(),
        title: snippet.title.clone(),
        description: snippet.description.clone(),
        channel_name: snippet.channel_title.clone(),
        thumbnail_url: best_thumbnail(&snippet.thumbnails),
        view_count: parse_view_count(
            item.statistics
                .as_ref()
                .and_then(|s| s.view_count.as_deref()),
        ),
        duration_iso8601: item
            .content_details
            .as_ref()
            .and_then(|c| c.duration.clone()),
        published_at: snippet.published_at.clone(),
        recording_location,
    }
}

/// Summary from a bare search hit, used when no details are available.
/// Returns `None` for hits without a video id.
#[must_use]
pub fn summary_from_search(item: &SearchItem) -> Option<VideoSummary> {
    let id = item.id.video_id.clone()?;
    let empty = Snippet::default();
    let snippet = item.snippet.as_ref().unwrap_or(&empty);
    Some(VideoSummary {
        external_video_id: id,
        title: snippet.title.clone(),
        description: snippet.description.clone(),
        channel_name: snippet.channel_title.clone(),
        thumbnail_url: best_thumbnail(&snippet.thumbnails),
        view_count: 0,
        duration_iso8601: None,
        published_at: snippet.published_at.clone(),
        recording_location: None,
    })
}

/// Merges search hits with their details, in search order.
#[must_use]
pub fn merge_summaries(hits: &[SearchItem], details: Vec<VideoItem>) -> Vec<VideoSummary> {
    let mut by_id: HashMap<String, VideoItem> =
        details.into_iter().map(|d| (d.id.clone(), d)).collect();

    hits.iter()
        .filter_map(|hit| {
            let id = hit.id.video_id.as_deref()?;
            match by_id.remove(id) {
                Some(detail) => Some(summary_from_details(&detail)),
                None => summary_from_search(hit),
            }
        })
        .collect()
}

/// Places a batch of search summaries on the map around `center`.
///
/// When at least one summary has a verified recording location only those
/// are kept and marked confirmed; otherwise the whole batch is returned
/// unconfirmed. Every display coordinate is within `radius_km` of `center`.
pub fn place_batch<R: Rng + ?Sized>(
    summaries: Vec<VideoSummary>,
    center: Coordinate,
    radius_km: f64,
    rng: &mut R,
) -> Vec<VideoResult> {
    let any_verified = summaries.iter().any(|s| s.recording_location.is_some());

    summaries
        .into_iter()
        .filter(|s| !any_verified || s.recording_location.is_some())
        .map(|s| {
            let coordinate = jitter_around(center, radius_km, rng);
            s.place_at(coordinate, true)
        })
        .collect()
}

/// Places chart items around `anchor`. Chart items are never search results
/// and carry no verified location.
pub fn place_trending<R: Rng + ?Sized>(
    items: &[VideoItem],
    anchor: Coordinate,
    radius_km: f64,
    rng: &mut R,
) -> Vec<VideoResult> {
    items
        .iter()
        .map(|item| {
            let mut summary = summary_from_details(item);
            summary.recording_location = None;
            summary.place_at(jitter_around(anchor, radius_km, rng), false)
        })
        .collect()
}
