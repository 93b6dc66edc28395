//! Location-search commands: everything that drives the orchestrator.

use clap::Args;
use vidmap_core::{duration, Category, Coordinate, ProviderConfig, ResolvedPlace, VideoResult};
use vidmap_geocode::GeocodingClient;
use vidmap_search::{Orchestrator, SearchError, SearchOutcome, SearchSettings, SearchSnapshot};
use vidmap_youtube::{VideoClientSettings, YoutubeClient};

use crate::store::StoredSession;

const SUGGESTION_LIMIT: usize = 5;

/// Command-line overrides for the provider settings read from the
/// environment (see [`vidmap_core::load_provider_config`]).
#[derive(Debug, Clone, Default, Args)]
pub struct ProviderArgs {
    /// Geocoding provider access token (overrides MAPBOX_ACCESS_TOKEN)
    #[arg(long)]
    pub mapbox_token: Option<String>,

    /// Video platform API key (overrides YOUTUBE_API_KEY)
    #[arg(long)]
    pub youtube_key: Option<String>,

    /// Language for place names (overrides VIDMAP_LANGUAGE)
    #[arg(long)]
    pub language: Option<String>,

    /// Region for trending videos (overrides VIDMAP_DEFAULT_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Search radius in kilometres (overrides VIDMAP_SEARCH_RADIUS_KM)
    #[arg(long)]
    pub radius_km: Option<u32>,
}

impl ProviderArgs {
    /// Applies the flags that were given on top of `config`.
    #[must_use]
    pub fn apply(&self, mut config: ProviderConfig) -> ProviderConfig {
        if let Some(token) = &self.mapbox_token {
            config.mapbox_access_token = Some(token.clone());
        }
        if let Some(key) = &self.youtube_key {
            config.youtube_api_key = Some(key.clone());
        }
        if let Some(language) = &self.language {
            config.language.clone_from(language);
        }
        if let Some(region) = &self.region {
            config.default_region = region.to_uppercase();
        }
        if let Some(radius_km) = self.radius_km {
            config.search_radius_km = radius_km;
        }
        config
    }
}

pub type CliOrchestrator = Orchestrator<GeocodingClient, YoutubeClient>;

/// Loads provider settings from the environment and applies the flags.
///
/// # Errors
///
/// Returns an error if a provider environment variable is invalid.
pub fn provider_config(args: &ProviderArgs) -> anyhow::Result<ProviderConfig> {
    Ok(args.apply(vidmap_core::load_provider_config()?))
}

/// # Errors
///
/// Returns an error if the geocoding token is missing.
pub fn build_geocoder(config: &ProviderConfig) -> anyhow::Result<GeocodingClient> {
    let token = config
        .mapbox_access_token
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("MAPBOX_ACCESS_TOKEN is required for this command"))?;
    Ok(GeocodingClient::new(token, config.http_timeout_secs, &config.language)?)
}

/// # Errors
///
/// Returns an error if either provider credential is missing.
pub fn build_orchestrator(config: &ProviderConfig) -> anyhow::Result<CliOrchestrator> {
    let places = build_geocoder(config)?;
    let key = config
        .youtube_api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("YOUTUBE_API_KEY is required for this command"))?;
    let videos = YoutubeClient::new(key, VideoClientSettings::from_config(config))?;
    Ok(Orchestrator::new(places, videos, SearchSettings::from_config(config)))
}

/// Restores the remembered user location (or the default center) into the
/// orchestrator. Only a remembered position is written back to the session.
pub async fn restore_location(orchestrator: &CliOrchestrator, session: &mut StoredSession) {
    let remembered = session.user_location;
    let outcome = orchestrator
        .locate_user(std::future::ready(remembered))
        .await;

    match outcome {
        Ok(SearchOutcome::Located(place)) => record_location(session, remembered, place),
        Ok(_) => {}
        Err(e) => {
            // Searching still works from a clicked or geocoded place.
            tracing::warn!(error = %e, "could not resolve the user location");
        }
    }
}

/// Stores the resolved name for a remembered position. The default-center
/// fallback is never persisted.
fn record_location(
    session: &mut StoredSession,
    remembered: Option<Coordinate>,
    place: ResolvedPlace,
) {
    if remembered.is_none() {
        tracing::debug!(place = %place.display_name, "using default center for this run");
        return;
    }
    session.user_location = Some(place.coordinate);
    session.user_location_name = Some(place.display_name);
}

/// Prints the outcome of a search, or the localized error message.
///
/// # Errors
///
/// Returns the search error (with its user-facing message) so the process
/// exits non-zero.
pub async fn report(
    orchestrator: &CliOrchestrator,
    outcome: Result<SearchOutcome, SearchError>,
) -> anyhow::Result<()> {
    match outcome {
        Ok(SearchOutcome::Located(place)) => {
            println!("Ubicación: {}", place.display_name);
            Ok(())
        }
        Ok(SearchOutcome::Empty) => {
            println!("No se encontraron videos en esta zona.");
            Ok(())
        }
        Ok(SearchOutcome::Skipped) => {
            println!("No hay más resultados.");
            print_snapshot(&orchestrator.snapshot().await);
            Ok(())
        }
        Ok(SearchOutcome::Superseded) => Ok(()),
        Ok(SearchOutcome::Populated { .. }) => {
            print_snapshot(&orchestrator.snapshot().await);
            Ok(())
        }
        Err(e) => anyhow::bail!(e.user_message()),
    }
}

pub async fn run_search(orchestrator: &CliOrchestrator, text: &str) -> anyhow::Result<()> {
    let outcome = orchestrator.search_by_term(text).await;
    report(orchestrator, outcome).await
}

pub async fn run_more(orchestrator: &CliOrchestrator, text: &str) -> anyhow::Result<()> {
    let first = orchestrator.search_by_term(text).await;
    if first.is_err() {
        return report(orchestrator, first).await;
    }
    let outcome = orchestrator.load_more().await;
    report(orchestrator, outcome).await
}

pub async fn run_click(
    orchestrator: &CliOrchestrator,
    latitude: f64,
    longitude: f64,
    query: Option<&str>,
) -> anyhow::Result<()> {
    let clicked = orchestrator.click_location(latitude, longitude).await;
    match query {
        Some(text) if clicked.is_ok() => run_search(orchestrator, text).await,
        _ => report(orchestrator, clicked).await,
    }
}

pub async fn run_category(orchestrator: &CliOrchestrator, name: &str) -> anyhow::Result<()> {
    let category: Category = name.parse()?;
    let outcome = orchestrator.search_by_category(category).await;
    report(orchestrator, outcome).await
}

pub async fn run_trending(orchestrator: &CliOrchestrator) -> anyhow::Result<()> {
    let outcome = orchestrator.load_trending().await;
    report(orchestrator, outcome).await
}

pub async fn run_suggest(geocoder: &GeocodingClient, text: &str) {
    for name in geocoder.suggest(text, SUGGESTION_LIMIT).await {
        println!("{name}");
    }
}

fn print_snapshot(snapshot: &SearchSnapshot) {
    if let Some(place) = snapshot.context.active_place.as_ref() {
        println!(
            "{}: «{}» ({} videos)",
            place.display_name,
            snapshot.context.active_query,
            snapshot.results.len()
        );
    }
    for video in &snapshot.results {
        println!("{}", format_result(video));
    }
    if snapshot.context.has_more {
        println!("(hay más resultados: use `more`)");
    }
}

/// One result line: title, channel, stats, position, link.
#[must_use]
pub fn format_result(video: &VideoResult) -> String {
    let length = video
        .duration_iso8601
        .as_deref()
        .and_then(duration::parse_iso8601)
        .map_or_else(|| "--:--".to_string(), duration::format_clock);
    let marker = if video.confirmed_location { "*" } else { "~" };
    format!(
        "{marker} {title} · {channel} · {views} vistas · {length} · ({lat:.4}, {lng:.4}) {url}",
        title = video.title,
        channel = video.channel_name,
        views = video.view_count,
        lat = video.coordinate.latitude(),
        lng = video.coordinate.longitude(),
        url = video.watch_url(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(confirmed: bool, duration: Option<&str>) -> VideoResult {
        VideoResult {
            external_video_id: "abc123".to_string(),
            title: "Feria de Abril".to_string(),
            description: String::new(),
            channel_name: "Canal Sur".to_string(),
            thumbnail_url: None,
            view_count: 1500,
            duration_iso8601: duration.map(str::to_string),
            published_at: None,
            coordinate: Coordinate::new(37.38, -5.99).expect("coordinate"),
            recording_location: None,
            is_search_result: true,
            confirmed_location: confirmed,
        }
    }

    fn sevilla() -> ResolvedPlace {
        ResolvedPlace {
            coordinate: Coordinate::new(37.3891, -5.9845).expect("coordinate"),
            display_name: "Sevilla, Andalucía, España".to_string(),
            feature_kind: vidmap_core::FeatureKind::Place,
            country_code: Some("ES".to_string()),
        }
    }

    #[test]
    fn default_center_fallback_is_not_persisted() {
        let mut session = StoredSession::default();
        record_location(&mut session, None, sevilla());
        assert!(session.user_location.is_none());
        assert!(session.user_location_name.is_none());
    }

    #[test]
    fn remembered_location_gets_its_resolved_name() {
        let mut session = StoredSession::default();
        let place = sevilla();
        record_location(&mut session, Some(place.coordinate), place);
        assert_eq!(session.user_location, Some(sevilla().coordinate));
        assert_eq!(
            session.user_location_name.as_deref(),
            Some("Sevilla, Andalucía, España")
        );
    }

    #[test]
    fn format_result_shows_clock_duration_and_link() {
        let line = format_result(&video(true, Some("PT1H2M3S")));
        assert!(line.starts_with("* Feria de Abril"));
        assert!(line.contains("1:02:03"));
        assert!(line.contains("1500 vistas"));
        assert!(line.contains("abc123"));
    }

    #[test]
    fn format_result_marks_unconfirmed_and_unknown_length() {
        let line = format_result(&video(false, None));
        assert!(line.starts_with("~ "));
        assert!(line.contains("--:--"));
    }
}
