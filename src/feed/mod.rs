//! Remote feeds
//!
//! Retrieval of subscribed feeds, kept separate from the subscription
//! registry. The post service looks the URL up first, then fetches and
//! decodes through a [`FeedSource`].

mod errors;
mod parse;
mod source;

pub use errors::{FeedError, FeedResult};
pub use parse::parse_feed;
pub use source::{FeedSource, HttpFeedSource};
