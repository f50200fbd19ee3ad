//! Feed fetching

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::errors::{FeedError, FeedResult};

/// Something that can return the raw body of a feed URL.
#[async_trait]
pub trait FeedSource: Send + Sync + Debug {
    async fn fetch(&self, url: &str) -> FeedResult<String>;
}

/// HTTP GET with a fixed timeout. Non-2xx responses are errors.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> FeedResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Transport(format!("Failed to build client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> FeedResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::Transport(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FeedError::Transport(format!("Failed to read body: {}", e)))
    }
}
