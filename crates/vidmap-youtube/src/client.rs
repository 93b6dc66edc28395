//! HTTP client for the video platform's data API.
//!
//! Wraps `reqwest` with key management, quota detection, and retry of
//! transient failures. Location searches make two calls per page: one
//! `search` call for the hits and one batched `videos` call to enrich them
//! with statistics, durations, and verified recording locations.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use vidmap_core::{Coordinate, ProviderConfig, VideoResult};

use crate::error::VideoError;
use crate::normalize::{merge_summaries, place_batch, place_trending};
use crate::retry::retry_with_backoff;
use crate::types::{
    ErrorEnvelope, LocationQuery, SearchItem, SearchListResponse, VideoItem, VideoListResponse,
    VideoPage, VideoSummaryPage,
};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

const DETAIL_PARTS: &str = "snippet,statistics,contentDetails,recordingDetails";
const TRENDING_PARTS: &str = "snippet,statistics,contentDetails";

/// Tunables for [`YoutubeClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct VideoClientSettings {
    pub timeout_secs: u64,
    /// Radius of the provider-side location filter.
    pub location_radius_km: u32,
    /// Radius of the marker jitter around the search center.
    pub jitter_radius_km: f64,
    /// Page size, 1..=50.
    pub max_results: u32,
    /// Region bias for location searches.
    pub region_code: Option<String>,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for VideoClientSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            location_radius_km: 50,
            jitter_radius_km: 2.0,
            max_results: 25,
            region_code: None,
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

impl VideoClientSettings {
    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            timeout_secs: config.http_timeout_secs,
            location_radius_km: config.search_radius_km,
            jitter_radius_km: config.jitter_radius_km,
            max_results: config.max_results,
            region_code: Some(config.default_region.clone()),
            max_retries: config.video_max_retries,
            backoff_base_ms: config.video_retry_backoff_base_ms,
        }
    }
}

/// Client for the video platform.
///
/// Use [`YoutubeClient::new`] for production or
/// [`YoutubeClient::with_base_url`] to point at a mock server in tests.
pub struct YoutubeClient {
    client: Client,
    api_key: String,
    base_url: Url,
    settings: VideoClientSettings,
}

impl YoutubeClient {
    /// Creates a new client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, settings: VideoClientSettings) -> Result<Self, VideoError> {
        Self::with_base_url(api_key, settings, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`VideoError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`VideoError::InvalidBaseUrl`] if `base_url` is not a
    /// usable base URL.
    pub fn with_base_url(
        api_key: &str,
        settings: VideoClientSettings,
        base_url: &str,
    ) -> Result<Self, VideoError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("vidmap/0.1 (location-video-search)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| VideoError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(VideoError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            settings,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &VideoClientSettings {
        &self.settings
    }

    /// Fetches one page of videos near `query.center`.
    ///
    /// A blank `query.query` falls back to the leading segment of
    /// `query.place_name`. The details lookup is an enrichment: if it fails
    /// with anything but a quota error the page is returned unconfirmed.
    ///
    /// # Errors
    ///
    /// - [`VideoError::QuotaExceeded`] on 401/403/429 from either call.
    /// - [`VideoError::Http`], [`VideoError::UnexpectedStatus`],
    ///   [`VideoError::Deserialize`] when the search call itself fails.
    pub async fn search_by_location(&self, query: &LocationQuery) -> Result<VideoPage, VideoError> {
        let text = effective_query(&query.query, &query.place_name);
        let location = format!(
            "{},{}",
            query.center.latitude(),
            query.center.longitude()
        );
        let radius = format!("{}km", self.settings.location_radius_km);
        let max_results = self.settings.max_results.to_string();

        let mut params = vec![
            ("part", "snippet"),
            ("type", "video"),
            ("maxResults", max_results.as_str()),
            ("q", text),
            ("location", location.as_str()),
            ("locationRadius", radius.as_str()),
        ];
        if let Some(region) = self.settings.region_code.as_deref() {
            params.push(("regionCode", region));
        }
        if let Some(token) = query.page_token.as_deref() {
            params.push(("pageToken", token));
        }

        let url = self.endpoint_url("search", &params);
        let search: SearchListResponse = self
            .get_json(&url, &format!("search(q={text}, location={location})"))
            .await?;

        let details = self.enrich(&search.items).await?;
        let summaries = merge_summaries(&search.items, details);

        let results = {
            let mut rng = rand::rng();
            place_batch(
                summaries,
                query.center,
                self.settings.jitter_radius_km,
                &mut rng,
            )
        };

        tracing::debug!(
            q = text,
            hits = search.items.len(),
            placed = results.len(),
            has_more = search.next_page_token.is_some(),
            "location search page fetched"
        );

        Ok(VideoPage {
            results,
            next_page_token: search.next_page_token,
        })
    }

    /// Fetches the most popular videos for `region`, placed around `anchor`.
    /// Single page, no continuation.
    ///
    /// # Errors
    ///
    /// Same as [`YoutubeClient::search_by_location`].
    pub async fn fetch_trending(
        &self,
        region: &str,
        anchor: Coordinate,
    ) -> Result<Vec<VideoResult>, VideoError> {
        let region = region.trim().to_uppercase();
        let max_results = self.settings.max_results.to_string();
        let url = self.endpoint_url(
            "videos",
            &[
                ("part", TRENDING_PARTS),
                ("chart", "mostPopular"),
                ("regionCode", region.as_str()),
                ("maxResults", max_results.as_str()),
            ],
        );
        let chart: VideoListResponse = self
            .get_json(&url, &format!("videos(chart=mostPopular, region={region})"))
            .await?;

        let mut rng = rand::rng();
        Ok(place_trending(
            &chart.items,
            anchor,
            self.settings.jitter_radius_km,
            &mut rng,
        ))
    }

    /// Plain text search without location bias. Results carry no display
    /// position.
    ///
    /// # Errors
    ///
    /// Same as [`YoutubeClient::search_by_location`].
    pub async fn search_text(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<VideoSummaryPage, VideoError> {
        let max_results = self.settings.max_results.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("type", "video"),
            ("maxResults", max_results.as_str()),
            ("q", query),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        let url = self.endpoint_url("search", &params);
        let search: SearchListResponse = self.get_json(&url, &format!("search(q={query})")).await?;
        let details = self.enrich(&search.items).await?;

        Ok(VideoSummaryPage {
            items: merge_summaries(&search.items, details),
            next_page_token: search.next_page_token,
        })
    }

    /// Batched details lookup for a page of hits. Quota errors propagate;
    /// anything else degrades to an empty list.
    async fn enrich(&self, hits: &[SearchItem]) -> Result<Vec<VideoItem>, VideoError> {
        let ids: Vec<&str> = hits
            .iter()
            .filter_map(|h| h.id.video_id.as_deref())
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let url = self.endpoint_url("videos", &[("part", DETAIL_PARTS), ("id", joined.as_str())]);
        match self
            .get_json::<VideoListResponse>(&url, &format!("videos(id={joined})"))
            .await
        {
            Ok(list) => Ok(list.items),
            Err(e @ VideoError::QuotaExceeded(_)) => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, count = ids.len(), "video details unavailable, returning unconfirmed page");
                Ok(Vec::new())
            }
        }
    }

    /// Builds `{base}/{endpoint}?key=...&...` with percent-encoded parameters.
    fn endpoint_url(&self, endpoint: &str, extra: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(endpoint);
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        url
    }

    /// GET with retry of transient failures.
    async fn get_json<T: DeserializeOwned>(&self, url: &Url, context: &str) -> Result<T, VideoError> {
        retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || self.get_once(url, context),
        )
        .await
    }

    /// Sends a single GET request and maps the status before parsing.
    async fn get_once<T: DeserializeOwned>(&self, url: &Url, context: &str) -> Result<T, VideoError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
        ) {
            return Err(VideoError::QuotaExceeded(quota_reason(status, &body)));
        }
        if !status.is_success() {
            return Err(VideoError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&body).map_err(|e| VideoError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// The free-text query, or the place's leading name when the text is blank.
fn effective_query<'a>(query: &'a str, place_name: &'a str) -> &'a str {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        place_name.split(',').next().unwrap_or_default().trim()
    } else {
        trimmed
    }
}

/// Extracts the most specific reason from an error body: the first
/// `errors[].reason`, then `message`, then the bare status.
fn quota_reason(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| {
            let error = envelope.error;
            error
                .errors
                .into_iter()
                .find_map(|d| d.reason)
                .or(error.message)
        })
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
