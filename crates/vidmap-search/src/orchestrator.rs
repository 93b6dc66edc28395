//! The location-search workflow.
//!
//! All mutation goes through the operations on [`Orchestrator`]. Each
//! operation that commits results takes a sequence ticket before its first
//! await and commits only if the ticket is still current, so the last
//! started search always wins regardless of completion order. The state
//! lock is never held across a provider call.

use std::future::Future;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::sync::Mutex;
use vidmap_core::{
    evaluate, Category, Coordinate, FeatureKind, ResolvedPlace, RestrictionVerdict, VideoResult,
};
use vidmap_youtube::{LocationQuery, VideoError, VideoPage};

use crate::error::SearchError;
use crate::provider::{PlaceLookup, VideoSource};
use crate::state::{
    ClickedLocation, SearchContext, SearchOutcome, SearchSettings, SearchSnapshot, SearchStatus,
};

struct State {
    status: SearchStatus,
    context: SearchContext,
    results: Vec<VideoResult>,
    sequence: u64,
    /// Ticket of the `load_more` currently in flight.
    loading_more: Option<u64>,
    clicked: Option<ClickedLocation>,
    user_location: Option<ResolvedPlace>,
    sticky_query: Option<String>,
    last_verdict: Option<RestrictionVerdict>,
    quota_blocked: bool,
    provider_available: bool,
    rng: Box<dyn RngCore + Send>,
}

impl State {
    fn new(rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            status: SearchStatus::Idle,
            context: SearchContext::default(),
            results: Vec::new(),
            sequence: 0,
            loading_more: None,
            clicked: None,
            user_location: None,
            sticky_query: None,
            last_verdict: None,
            quota_blocked: false,
            provider_available: true,
            rng,
        }
    }

    /// Starts a new operation: invalidates anything in flight.
    fn issue_ticket(&mut self) -> u64 {
        self.sequence += 1;
        self.loading_more = None;
        self.status = SearchStatus::Searching;
        self.sequence
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.sequence == ticket
    }

    /// The clicked place if valid, else the user's place.
    fn active_location(&self) -> Option<ResolvedPlace> {
        self.clicked
            .as_ref()
            .and_then(|c| c.place.clone())
            .or_else(|| self.user_location.clone())
    }

    fn ensure_searchable(&self) -> Result<(), SearchError> {
        if self.quota_blocked {
            Err(SearchError::QuotaBlocked)
        } else {
            Ok(())
        }
    }

    fn mark_quota_blocked(&mut self, ticket: u64) {
        self.quota_blocked = true;
        if self.is_current(ticket) {
            self.status = SearchStatus::QuotaBlocked;
            self.results.clear();
            self.context.has_more = false;
            self.context.page_token = None;
        }
    }
}

/// Drives location-biased video searches against a place lookup and a
/// video source.
pub struct Orchestrator<G, V> {
    places: G,
    videos: V,
    settings: SearchSettings,
    state: Mutex<State>,
}

impl<G: PlaceLookup, V: VideoSource> Orchestrator<G, V> {
    /// Creates an orchestrator with an OS-seeded random source.
    pub fn new(places: G, videos: V, settings: SearchSettings) -> Self {
        Self::with_rng(places, videos, settings, Box::new(StdRng::from_os_rng()))
    }

    /// Creates an orchestrator with an injected random source for category
    /// keyword selection.
    pub fn with_rng(
        places: G,
        videos: V,
        settings: SearchSettings,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        Self {
            places,
            videos,
            settings,
            state: Mutex::new(State::new(rng)),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Cloned view of the current state.
    pub async fn snapshot(&self) -> SearchSnapshot {
        let state = self.state.lock().await;
        SearchSnapshot {
            status: state.status,
            context: state.context.clone(),
            results: state.results.clone(),
            sticky_query: state.sticky_query.clone(),
            clicked: state.clicked.clone(),
            user_location: state.user_location.clone(),
            last_verdict: state.last_verdict.clone(),
            quota_blocked: state.quota_blocked,
            provider_available: state.provider_available,
        }
    }

    /// Handles a map click.
    ///
    /// Out-of-range coordinates are rejected before any geocoding call. A
    /// click that resolves is stored as the active location and re-runs the
    /// sticky query there; an unresolvable click is stored as invalid and
    /// no search is performed.
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidCoordinate`], [`SearchError::InvalidFeatureKind`],
    /// [`SearchError::Restricted`] for deny-listed places, or any error from
    /// the re-run search.
    pub async fn click_location(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<SearchOutcome, SearchError> {
        let coordinate = Coordinate::new(latitude, longitude)?;

        let ticket = self.state.lock().await.issue_ticket();
        let resolved = self.places.resolve_coordinate(coordinate).await;

        let mut state = self.state.lock().await;
        if !state.is_current(ticket) {
            return Ok(SearchOutcome::Superseded);
        }

        let place = match resolved {
            Ok(place) => place,
            Err(e) => {
                let err = SearchError::from(e);
                tracing::info!(%coordinate, error = %err, "map click rejected");
                state.clicked = Some(ClickedLocation {
                    coordinate,
                    place: None,
                });
                state.status = SearchStatus::Idle;
                return Err(err);
            }
        };

        tracing::debug!(%coordinate, place = %place.display_name, "map click resolved");
        state.clicked = Some(ClickedLocation {
            coordinate,
            place: Some(place.clone()),
        });

        if place.feature_kind == FeatureKind::Restricted {
            let verdict = evaluate("", Some(&place));
            if let (Some(reason), Some(message)) = (verdict.reason, verdict.message.clone()) {
                state.status = SearchStatus::Restricted;
                state.results.clear();
                state.context = SearchContext {
                    active_place: Some(place),
                    ..SearchContext::default()
                };
                state.last_verdict = Some(verdict);
                return Err(SearchError::Restricted { reason, message });
            }
        }

        match state.sticky_query.clone() {
            Some(query) if !state.quota_blocked => {
                drop(state);
                self.search_at(ticket, &query, place, true).await
            }
            _ => {
                state.status = SearchStatus::Idle;
                Ok(SearchOutcome::Located(place))
            }
        }
    }

    /// Stores a new user position (reverse-geocoded) and re-runs the sticky
    /// query against it.
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidCoordinate`], geocoding errors, or any error
    /// from the re-run search. The previous user location is kept on error.
    pub async fn set_user_location(
        &self,
        coordinate: Coordinate,
    ) -> Result<SearchOutcome, SearchError> {
        let ticket = self.state.lock().await.issue_ticket();
        let resolved = self.places.resolve_coordinate(coordinate).await;

        let mut state = self.state.lock().await;
        if !state.is_current(ticket) {
            return Ok(SearchOutcome::Superseded);
        }
        let place = match resolved {
            Ok(place) => place,
            Err(e) => {
                state.status = SearchStatus::Idle;
                return Err(e.into());
            }
        };

        tracing::debug!(%coordinate, place = %place.display_name, "user location updated");
        state.user_location = Some(place.clone());

        match state.sticky_query.clone() {
            Some(query) if !state.quota_blocked => {
                drop(state);
                self.search_at(ticket, &query, place, true).await
            }
            _ => {
                state.status = SearchStatus::Idle;
                Ok(SearchOutcome::Located(place))
            }
        }
    }

    /// Acquires the user's position from `probe`, falling back to the
    /// default center when the probe fails or exceeds the geolocation
    /// timeout.
    ///
    /// # Errors
    ///
    /// Same as [`Orchestrator::set_user_location`].
    pub async fn locate_user<F>(&self, probe: F) -> Result<SearchOutcome, SearchError>
    where
        F: Future<Output = Option<Coordinate>> + Send,
    {
        let coordinate =
            match tokio::time::timeout(self.settings.geolocation_timeout, probe).await {
                Ok(Some(coordinate)) => coordinate,
                Ok(None) => {
                    tracing::info!("geolocation unavailable, using default center");
                    self.settings.default_center
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = self.settings.geolocation_timeout.as_millis(),
                        "geolocation timed out, using default center"
                    );
                    self.settings.default_center
                }
            };
        self.set_user_location(coordinate).await
    }

    /// Searches `text` at the active location: the valid clicked place,
    /// else the user's place, else the place `text` itself geocodes to.
    ///
    /// On success `text` becomes the sticky query.
    ///
    /// # Errors
    ///
    /// [`SearchError::EmptyQuery`], [`SearchError::QuotaBlocked`], geocoding
    /// errors when no location is active, [`SearchError::Restricted`], or
    /// video provider errors.
    pub async fn search_by_term(&self, text: &str) -> Result<SearchOutcome, SearchError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let (ticket, location) = {
            let mut state = self.state.lock().await;
            state.ensure_searchable()?;
            (state.issue_ticket(), state.active_location())
        };

        let place = match location {
            Some(place) => place,
            None => match self.places.resolve_text(text).await {
                Ok(place) => place,
                Err(e) => {
                    let mut state = self.state.lock().await;
                    if !state.is_current(ticket) {
                        return Ok(SearchOutcome::Superseded);
                    }
                    state.status = SearchStatus::Idle;
                    return Err(e.into());
                }
            },
        };

        self.search_at(ticket, text, place, true).await
    }

    /// Fetches the next page for the active search and appends it.
    ///
    /// Returns [`SearchOutcome::Skipped`] without touching state when there
    /// is no further page, a page load is already in flight, or a newer
    /// search has not committed yet. The page is only appended if no other
    /// operation started while it was loading.
    ///
    /// # Errors
    ///
    /// [`SearchError::QuotaBlocked`] or video provider errors.
    pub async fn load_more(&self) -> Result<SearchOutcome, SearchError> {
        let (ticket, query) = {
            let mut state = self.state.lock().await;
            if state.status == SearchStatus::Searching
                || !state.context.has_more
                || state.loading_more.is_some()
            {
                return Ok(SearchOutcome::Skipped);
            }
            state.ensure_searchable()?;
            let Some(place) = state.context.active_place.clone() else {
                return Ok(SearchOutcome::Skipped);
            };
            let ticket = state.sequence;
            state.loading_more = Some(ticket);
            let query = LocationQuery {
                center: place.coordinate,
                place_name: place.display_name,
                query: state.context.active_query.clone(),
                page_token: state.context.page_token.clone(),
            };
            (ticket, query)
        };

        let page = self.videos.search_by_location(&query).await;

        let mut state = self.state.lock().await;
        if state.loading_more == Some(ticket) {
            state.loading_more = None;
        }

        match page {
            Ok(_) if !state.is_current(ticket) => Ok(SearchOutcome::Superseded),
            Ok(page) => {
                let appended = page.results.len();
                let has_more = page.has_more();
                state.results.extend(page.results);
                state.context.page_token = page.next_page_token;
                state.context.has_more = has_more;
                if !state.results.is_empty() {
                    state.status = SearchStatus::Populated;
                }
                tracing::debug!(
                    sequence = ticket,
                    appended,
                    total = state.results.len(),
                    has_more,
                    "page appended"
                );
                Ok(SearchOutcome::Populated {
                    total: state.results.len(),
                    appended,
                })
            }
            Err(e) => {
                let err = SearchError::from(e);
                if err.is_quota() {
                    tracing::warn!(error = %err, "video quota exhausted, searches disabled");
                    state.mark_quota_blocked(ticket);
                } else {
                    tracing::warn!(error = %err, "next page failed, keeping current results");
                }
                Err(err)
            }
        }
    }

    /// Searches a random keyword of `category` combined with the active
    /// location's name. Does not change the sticky query.
    ///
    /// # Errors
    ///
    /// [`SearchError::NoActiveLocation`] without a clicked or user
    /// location; otherwise as [`Orchestrator::search_by_term`].
    pub async fn search_by_category(
        &self,
        category: Category,
    ) -> Result<SearchOutcome, SearchError> {
        let (ticket, query, place) = {
            let mut state = self.state.lock().await;
            state.ensure_searchable()?;
            let place = state
                .active_location()
                .ok_or(SearchError::NoActiveLocation)?;
            let keyword = category.pick_keyword(&mut *state.rng);
            let query = format!("{keyword} {}", place.leading_name());
            (state.issue_ticket(), query, place)
        };

        tracing::debug!(%category, query = %query, "category search");
        self.search_at(ticket, &query, place, false).await
    }

    /// Resets the search context to idle. The sticky query survives so a
    /// later location change can resume it.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.issue_ticket();
        state.status = SearchStatus::Idle;
        state.context = SearchContext::default();
        state.results.clear();
        state.last_verdict = None;
    }

    /// Drops the sticky query.
    pub async fn forget_query(&self) {
        self.state.lock().await.sticky_query = None;
    }

    /// Loads trending videos for the default region around the user's
    /// position (or the default center).
    ///
    /// A probe slower than the trending timeout marks the provider
    /// unavailable for the rest of the session.
    ///
    /// # Errors
    ///
    /// [`SearchError::QuotaBlocked`], [`SearchError::ProviderUnavailable`],
    /// [`SearchError::QuotaExceeded`], or other provider errors.
    pub async fn load_trending(&self) -> Result<SearchOutcome, SearchError> {
        let (ticket, anchor) = {
            let mut state = self.state.lock().await;
            state.ensure_searchable()?;
            if !state.provider_available {
                return Err(SearchError::ProviderUnavailable);
            }
            let anchor = state
                .user_location
                .as_ref()
                .map_or(self.settings.default_center, |p| p.coordinate);
            (state.issue_ticket(), anchor)
        };

        let fetched = tokio::time::timeout(
            self.settings.trending_timeout,
            self.videos
                .fetch_trending(&self.settings.default_region, anchor),
        )
        .await;

        let mut state = self.state.lock().await;
        let Ok(fetched) = fetched else {
            tracing::warn!(
                timeout_ms = self.settings.trending_timeout.as_millis(),
                "trending probe timed out, video provider marked unavailable"
            );
            state.provider_available = false;
            if state.is_current(ticket) {
                state.status = SearchStatus::Idle;
            }
            return Err(SearchError::ProviderUnavailable);
        };

        match fetched {
            Ok(_) if !state.is_current(ticket) => Ok(SearchOutcome::Superseded),
            Ok(results) => {
                state.context = SearchContext::default();
                state.results = results;
                Ok(Self::commit_status(&mut state))
            }
            Err(e) => Err(Self::record_video_error(&mut state, ticket, e)),
        }
    }

    /// Restriction check, video search, and commit for a resolved place.
    async fn search_at(
        &self,
        ticket: u64,
        query: &str,
        place: ResolvedPlace,
        sticky: bool,
    ) -> Result<SearchOutcome, SearchError> {
        let verdict = evaluate(query, Some(&place));
        {
            let mut state = self.state.lock().await;
            if !state.is_current(ticket) {
                return Ok(SearchOutcome::Superseded);
            }
            if let (true, Some(reason), Some(message)) =
                (verdict.restricted, verdict.reason, verdict.message.clone())
            {
                tracing::info!(query, ?reason, place = %place.display_name, "search restricted");
                state.status = SearchStatus::Restricted;
                state.results.clear();
                state.context = SearchContext {
                    active_query: query.to_owned(),
                    active_place: Some(place),
                    page_token: None,
                    has_more: false,
                };
                state.last_verdict = Some(verdict);
                return Err(SearchError::Restricted { reason, message });
            }
            state.last_verdict = Some(verdict);
        }

        let request = LocationQuery {
            center: place.coordinate,
            place_name: place.display_name.clone(),
            query: query.to_owned(),
            page_token: None,
        };
        let page = self.videos.search_by_location(&request).await;

        let mut state = self.state.lock().await;
        match page {
            Ok(_) if !state.is_current(ticket) => {
                tracing::debug!(sequence = ticket, current = state.sequence, "stale search dropped");
                Ok(SearchOutcome::Superseded)
            }
            Ok(page) => Ok(Self::commit_page(&mut state, query, place, page, sticky)),
            Err(e) => Err(Self::record_video_error(&mut state, ticket, e)),
        }
    }

    fn commit_page(
        state: &mut State,
        query: &str,
        place: ResolvedPlace,
        page: VideoPage,
        sticky: bool,
    ) -> SearchOutcome {
        let has_more = page.has_more();
        state.context = SearchContext {
            active_query: query.to_owned(),
            active_place: Some(place),
            page_token: page.next_page_token,
            has_more,
        };
        state.results = page.results;
        if sticky {
            state.sticky_query = Some(query.to_owned());
        }
        tracing::debug!(
            sequence = state.sequence,
            query,
            results = state.results.len(),
            has_more,
            "search committed"
        );
        Self::commit_status(state)
    }

    /// Status for a freshly replaced result set.
    fn commit_status(state: &mut State) -> SearchOutcome {
        if state.results.is_empty() {
            state.status = SearchStatus::Empty;
            SearchOutcome::Empty
        } else {
            state.status = SearchStatus::Populated;
            SearchOutcome::Populated {
                total: state.results.len(),
                appended: state.results.len(),
            }
        }
    }

    /// Maps a provider failure into state. Quota exhaustion is recorded
    /// even when the failing request is stale.
    fn record_video_error(state: &mut State, ticket: u64, err: VideoError) -> SearchError {
        let err = SearchError::from(err);
        if err.is_quota() {
            tracing::warn!(error = %err, "video quota exhausted, searches disabled");
            state.mark_quota_blocked(ticket);
        } else {
            tracing::warn!(error = %err, "video search failed");
            if state.is_current(ticket) {
                state.status = SearchStatus::Idle;
            }
        }
        err
    }
}
