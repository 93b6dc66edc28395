use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A WGS84 position. Construct through [`Coordinate::new`] so the bounds
/// `lat ∈ [-90, 90]`, `lng ∈ [-180, 180]` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinateParts")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct CoordinateParts {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<CoordinateParts> for Coordinate {
    type Error = CoreError;

    fn try_from(parts: CoordinateParts) -> Result<Self, Self::Error> {
        Self::new(parts.latitude, parts.longitude)
    }
}

impl Coordinate {
    /// Validates and builds a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] when either component is out of
    /// range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        if Self::is_valid(latitude, longitude) {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(CoreError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    #[must_use]
    pub fn is_valid(latitude: f64, longitude: f64) -> bool {
        latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5},{:.5}", self.latitude, self.longitude)
    }
}

/// Granularity of a resolved place.
///
/// `Restricted` is never returned by the provider; the reverse lookup sets
/// it when the place's country is deny-listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Country,
    Region,
    Place,
    Locality,
    Neighborhood,
    Address,
    Restricted,
    Unknown,
}

impl FeatureKind {
    /// Maps a provider `place_type` entry. Types outside the known set
    /// (`poi`, `postcode`, `district`, ...) map to `Unknown`.
    #[must_use]
    pub fn from_provider(raw: &str) -> Self {
        match raw {
            "country" => Self::Country,
            "region" => Self::Region,
            "place" => Self::Place,
            "locality" => Self::Locality,
            "neighborhood" => Self::Neighborhood,
            "address" => Self::Address,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            Self::Country
                | Self::Region
                | Self::Place
                | Self::Locality
                | Self::Neighborhood
                | Self::Address
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Region => "region",
            Self::Place => "place",
            Self::Locality => "locality",
            Self::Neighborhood => "neighborhood",
            Self::Address => "address",
            Self::Restricted => "restricted",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A place description produced by the geocoding client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub coordinate: Coordinate,
    pub display_name: String,
    pub feature_kind: FeatureKind,
    /// ISO 3166-1 alpha-2, upper-case.
    pub country_code: Option<String>,
}

impl ResolvedPlace {
    /// The segment of `display_name` before the first comma
    /// (`"Sevilla, Andalucía, España"` → `"Sevilla"`).
    #[must_use]
    pub fn leading_name(&self) -> &str {
        leading_segment(&self.display_name)
    }
}

pub(crate) fn leading_segment(name: &str) -> &str {
    name.split(',').next().unwrap_or(name).trim()
}

/// One video marker. Created fresh per search response and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResult {
    pub external_video_id: String,
    pub title: String,
    pub description: String,
    pub channel_name: String,
    pub thumbnail_url: Option<String>,
    pub view_count: u64,
    pub duration_iso8601: Option<String>,
    pub published_at: Option<String>,
    /// Display position, jittered around the search center.
    pub coordinate: Coordinate,
    /// Recording position reported by the platform, when verified.
    pub recording_location: Option<Coordinate>,
    pub is_search_result: bool,
    pub confirmed_location: bool,
}

impl VideoResult {
    #[must_use]
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.external_video_id)
    }
}
