//! Location-driven video search.
//!
//! [`Orchestrator`] owns the search context and decides which coordinate
//! to search, runs the restriction filter, calls the video source, and
//! merges pages. Providers are reached through the [`PlaceLookup`] and
//! [`VideoSource`] seams so tests can substitute fakes.

pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod state;

pub use error::SearchError;
pub use orchestrator::Orchestrator;
pub use provider::{PlaceLookup, VideoSource};
pub use state::{
    ClickedLocation, SearchContext, SearchOutcome, SearchSettings, SearchSnapshot, SearchStatus,
};
