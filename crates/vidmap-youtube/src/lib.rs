//! Client for the video platform's search, details, and chart endpoints.

pub mod client;
pub mod error;
pub mod normalize;
pub(crate) mod retry;
pub mod types;

pub use client::{VideoClientSettings, YoutubeClient};
pub use error::VideoError;
pub use types::{LocationQuery, VideoPage, VideoSummary, VideoSummaryPage};
