//! Blocking HTTP client for the upstream show feed.

use super::{FeedError, ShowFeed, UpstreamShow};
use anyhow::Result;
use reqwest::blocking::Client;
use std::time::Duration;

pub struct HttpShowFeed {
    client: Client,
    base_url: String,
}

impl HttpShowFeed {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("showsync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl ShowFeed for HttpShowFeed {
    fn fetch_show(&self, show_id: i64) -> Result<UpstreamShow, FeedError> {
        let url = format!("{}/shows/{}.json", self.base_url, show_id);

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}
