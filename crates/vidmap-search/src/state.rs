//! Orchestrator state and the views handed to callers.

use std::time::Duration;

use serde::Serialize;
use vidmap_core::{Coordinate, ProviderConfig, ResolvedPlace, RestrictionVerdict, VideoResult};

/// Where the last search ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Idle,
    Searching,
    Populated,
    Empty,
    Restricted,
    QuotaBlocked,
}

/// The active search: query, place, and continuation cursor.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchContext {
    pub active_query: String,
    pub active_place: Option<ResolvedPlace>,
    pub page_token: Option<String>,
    pub has_more: bool,
}

/// Result of an orchestrator operation that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Results were committed. `appended` is the size of the newest page.
    Populated { total: usize, appended: usize },
    /// The provider returned nothing for this search.
    Empty,
    /// A newer operation started while this one was in flight; nothing was
    /// committed.
    Superseded,
    /// `load_more` had nothing to do.
    Skipped,
    /// A location was resolved and stored; no query was pending.
    Located(ResolvedPlace),
}

/// A map click. `place` is `None` when the click could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickedLocation {
    pub coordinate: Coordinate,
    pub place: Option<ResolvedPlace>,
}

impl ClickedLocation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.place.is_some()
    }
}

/// Cloned view of the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSnapshot {
    pub status: SearchStatus,
    pub context: SearchContext,
    pub results: Vec<VideoResult>,
    pub sticky_query: Option<String>,
    pub clicked: Option<ClickedLocation>,
    pub user_location: Option<ResolvedPlace>,
    pub last_verdict: Option<RestrictionVerdict>,
    pub quota_blocked: bool,
    pub provider_available: bool,
}

/// Orchestrator tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub default_region: String,
    /// Used when geolocation fails and as the trending anchor.
    pub default_center: Coordinate,
    pub geolocation_timeout: Duration,
    pub trending_timeout: Duration,
}

impl SearchSettings {
    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            default_region: config.default_region.clone(),
            default_center: config.default_center,
            geolocation_timeout: Duration::from_millis(config.geolocation_timeout_ms),
            trending_timeout: Duration::from_millis(config.trending_timeout_ms),
        }
    }
}
