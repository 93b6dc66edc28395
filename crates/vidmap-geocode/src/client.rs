//! HTTP client for the place-search / reverse-geocode provider.
//!
//! Every operation issues at most one request: there is no retry and no
//! cache. Provider failures surface as [`GeocodeError`]; `suggest` is the
//! exception and degrades to an empty list.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::{Client, Url};
use vidmap_core::{is_restricted_country, Coordinate, FeatureKind, ResolvedPlace};

use crate::error::GeocodeError;
use crate::types::{Feature, FeatureCollection};

const DEFAULT_BASE_URL: &str = "https://api.mapbox.com/";

/// Feature types requested from the provider; anything else is rejected.
const ACCEPTED_TYPES: &str = "country,region,place,locality,neighborhood,address";

const MAX_SUGGESTIONS: usize = 5;

/// Names we never search videos for: open water and unnamed roads.
static EXCLUDED_NAMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:ocean|océano|oceano|sea|gulf|golfo|strait|estrecho)\b|unnamed road|sin nombre",
    )
    .expect("exclusion pattern is valid")
});

/// Client for the geocoding provider.
///
/// Use [`GeocodingClient::new`] for production or
/// [`GeocodingClient::with_base_url`] to point at a mock server in tests.
pub struct GeocodingClient {
    client: Client,
    access_token: String,
    language: String,
    base_url: Url,
}

impl GeocodingClient {
    /// Creates a new client pointed at the production provider.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(access_token: &str, timeout_secs: u64, language: &str) -> Result<Self, GeocodeError> {
        Self::with_base_url(access_token, timeout_secs, language, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`GeocodeError::InvalidBaseUrl`] if `base_url` does
    /// not parse or cannot carry a path.
    pub fn with_base_url(
        access_token: &str,
        timeout_secs: u64,
        language: &str,
        base_url: &str,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("vidmap/0.1 (location-video-search)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| GeocodeError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GeocodeError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            access_token: access_token.to_owned(),
            language: language.to_owned(),
            base_url,
        })
    }

    /// Resolves free text to the provider's top match.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::NotFound`] if the provider returns no features.
    /// - [`GeocodeError::InvalidFeatureKind`] if the top match is not an
    ///   accepted place.
    /// - [`GeocodeError::Http`], [`GeocodeError::UnexpectedStatus`],
    ///   [`GeocodeError::Deserialize`] on provider failure.
    pub async fn resolve_text(&self, query: &str) -> Result<ResolvedPlace, GeocodeError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(GeocodeError::NotFound {
                query: query.to_owned(),
            });
        }

        let url = self.places_url(
            trimmed,
            &[("types", ACCEPTED_TYPES), ("limit", "1")],
        );
        let collection = self.request(&url, &format!("forward({trimmed})")).await?;

        let top = collection
            .features
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound {
                query: trimmed.to_owned(),
            })?;

        validate_feature(&top)
    }

    /// Reverse-geocodes a coordinate to its most specific accepted place.
    ///
    /// When the place lies in a deny-listed country the result is returned
    /// with [`FeatureKind::Restricted`] and no further validation.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::InvalidFeatureKind`] if nothing resolvable is found
    ///   (open ocean) or the match is not an accepted place.
    /// - [`GeocodeError::Http`], [`GeocodeError::UnexpectedStatus`],
    ///   [`GeocodeError::Deserialize`] on provider failure.
    pub async fn resolve_coordinate(
        &self,
        coordinate: Coordinate,
    ) -> Result<ResolvedPlace, GeocodeError> {
        let search = format!("{},{}", coordinate.longitude(), coordinate.latitude());
        let url = self.places_url(&search, &[("types", ACCEPTED_TYPES)]);
        let collection = self.request(&url, &format!("reverse({coordinate})")).await?;

        let Some(top) = collection.features.into_iter().next() else {
            return Err(GeocodeError::InvalidFeatureKind {
                kind: FeatureKind::Unknown,
                name: String::new(),
            });
        };

        if let Some(code) = top.country_code().filter(|c| is_restricted_country(c)) {
            return Ok(ResolvedPlace {
                coordinate,
                display_name: top.place_name.trim().to_owned(),
                feature_kind: FeatureKind::Restricted,
                country_code: Some(code),
            });
        }

        let mut place = validate_feature(&top)?;
        // Keep the clicked position rather than the feature's centroid.
        place.coordinate = coordinate;
        Ok(place)
    }

    /// Autocomplete suggestions for a partial query, best effort.
    ///
    /// `limit` is clamped to `1..=5`. Provider errors are logged and yield an
    /// empty list.
    pub async fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let limit = limit.clamp(1, MAX_SUGGESTIONS).to_string();
        let url = self.places_url(
            trimmed,
            &[
                ("types", ACCEPTED_TYPES),
                ("autocomplete", "true"),
                ("limit", &limit),
            ],
        );

        match self.request(&url, &format!("suggest({trimmed})")).await {
            Ok(collection) => collection
                .features
                .into_iter()
                .map(|f| f.place_name.trim().to_owned())
                .filter(|name| !name.is_empty())
                .collect(),
            Err(e) => {
                tracing::debug!(error = %e, query = trimmed, "place suggestions unavailable");
                Vec::new()
            }
        }
    }

    /// Builds `{base}/geocoding/v5/mapbox.places/{search}.json` with the access
    /// token, language, and any extra parameters percent-encoded.
    fn places_url(&self, search: &str, extra: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["geocoding", "v5", "mapbox.places"])
                .push(&format!("{search}.json"));
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("access_token", &self.access_token);
            pairs.append_pair("language", &self.language);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Sends a GET request, asserts a 2xx status, and parses the feature
    /// collection.
    async fn request(&self, url: &Url, context: &str) -> Result<FeatureCollection, GeocodeError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// Checks a feature against the accepted kinds and exclusion patterns and
/// converts it into a [`ResolvedPlace`].
fn validate_feature(feature: &Feature) -> Result<ResolvedPlace, GeocodeError> {
    let kind = feature
        .place_type
        .first()
        .map_or(FeatureKind::Unknown, |t| FeatureKind::from_provider(t));
    let name = feature.place_name.trim();

    if !kind.is_accepted()
        || name.is_empty()
        || EXCLUDED_NAMES.is_match(name)
        || EXCLUDED_NAMES.is_match(&feature.text)
    {
        return Err(GeocodeError::InvalidFeatureKind {
            kind,
            name: name.to_owned(),
        });
    }

    let (lng, lat) = match feature.center.as_slice() {
        [lng, lat, ..] => (*lng, *lat),
        _ => {
            return Err(GeocodeError::InvalidResponse(format!(
                "feature {} has no center",
                feature.id
            )))
        }
    };
    let coordinate = Coordinate::new(lat, lng)
        .map_err(|e| GeocodeError::InvalidResponse(format!("feature {}: {e}", feature.id)))?;

    Ok(ResolvedPlace {
        coordinate,
        display_name: name.to_owned(),
        feature_kind: kind,
        country_code: feature.country_code(),
    })
}
