//! Feed document decoding
//!
//! A feed is a JSON object with a `posts` array. Entries are passed
//! through untouched; remote posts need not match the local schema.

use serde::Deserialize;
use serde_json::Value;

use super::errors::{FeedError, FeedResult};

#[derive(Debug, Deserialize)]
struct FeedBody {
    posts: Vec<Value>,
}

/// Decode a feed body into its posts
pub fn parse_feed(body: &str) -> FeedResult<Vec<Value>> {
    let feed: FeedBody = serde_json::from_str(body).map_err(|e| FeedError::Parse(e.to_string()))?;
    Ok(feed.posts)
}
