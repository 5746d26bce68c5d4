//! Upstream show feed: typed records and the HTTP client that fetches them.
//!
//! The rest of the crate talks to the feed through the [`ShowFeed`] trait so
//! tests can substitute fixture documents for the network.

mod http_client;
mod records;

pub use http_client::HttpShowFeed;
pub use records::{
    EventRecord, LeaderRecord, SessionRecord, TimeSlotRecord, UpstreamShow, VenueRecord,
};

use thiserror::Error;

/// Failures while fetching or decoding one upstream show document.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("undecodable payload: {0}")]
    Decode(#[from] serde_json::Error),
}

pub trait ShowFeed: Send + Sync {
    /// Fetch the full document for one upstream show.
    fn fetch_show(&self, show_id: i64) -> Result<UpstreamShow, FeedError>;
}
