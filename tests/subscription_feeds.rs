//! Subscription Feed Tests
//!
//! Subscribed URLs are looked up locally, then fetched through the feed
//! source and decoded. Unknown URLs never reach the network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use postline::feed::{FeedError, FeedResult, FeedSource};
use postline::kv::StoreHandle;
use postline::post::{Owner, PostError, PostService};
use serde_json::json;

/// Serves canned bodies and records every URL it was asked for.
#[derive(Debug, Default)]
struct CannedFeeds {
    bodies: HashMap<String, FeedResult<String>>,
    requested: Mutex<Vec<String>>,
}

impl CannedFeeds {
    fn with(mut self, url: &str, body: FeedResult<String>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FeedSource for CannedFeeds {
    async fn fetch(&self, url: &str) -> FeedResult<String> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.bodies.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(FeedError::Status(code))) => Err(FeedError::Status(*code)),
            Some(Err(e)) => Err(FeedError::Transport(e.to_string())),
            None => Err(FeedError::Status(404)),
        }
    }
}

fn service_with(feeds: Arc<CannedFeeds>) -> PostService {
    let owner = Owner::new("alice", "Alice", "http://alice.example/");
    PostService::new(StoreHandle::in_memory(), owner, feeds).unwrap()
}

#[tokio::test]
async fn test_recent_posts_of_subscribed_feed() {
    let feeds = Arc::new(CannedFeeds::default().with(
        "http://bob.example/feed",
        Ok(r#"{"posts": [{"id": 2, "content": {"body": "b2"}}, {"id": 1}]}"#.to_string()),
    ));
    let svc = service_with(feeds.clone());

    svc.subscribe("  HTTP://Bob.example/feed").await.unwrap();
    let posts = svc
        .get_subscription_recent("http://bob.example/feed")
        .await
        .unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0], json!({"id": 2, "content": {"body": "b2"}}));
    assert_eq!(feeds.requested(), vec!["http://bob.example/feed"]);
}

#[tokio::test]
async fn test_unsubscribed_url_is_not_fetched() {
    let feeds = Arc::new(CannedFeeds::default());
    let svc = service_with(feeds.clone());

    let err = svc
        .get_subscription_recent("http://stranger.example/")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(feeds.requested().is_empty());
}

#[tokio::test]
async fn test_malformed_feed_is_parse_error() {
    let feeds = Arc::new(
        CannedFeeds::default().with("http://bad.example/", Ok("<html>nope</html>".to_string())),
    );
    let svc = service_with(feeds.clone());
    svc.subscribe("http://bad.example/").await.unwrap();

    let err = svc
        .get_subscription_recent("http://bad.example/")
        .await
        .unwrap_err();
    assert!(matches!(err, PostError::Parse(_)));

    // Not retried
    assert_eq!(feeds.requested().len(), 1);
}

#[tokio::test]
async fn test_http_failure_is_feed_error() {
    let feeds = Arc::new(
        CannedFeeds::default().with("http://down.example/", Err(FeedError::Status(503))),
    );
    let svc = service_with(feeds);
    svc.subscribe("http://down.example/").await.unwrap();

    let err = svc
        .get_subscription_recent("http://down.example/")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "POST_FEED_ERROR");
    assert_eq!(err.status_code(), 502);
}

#[tokio::test]
async fn test_unsubscribe_stops_lookup() {
    let feeds = Arc::new(
        CannedFeeds::default().with("http://bob.example/", Ok(r#"{"posts": []}"#.to_string())),
    );
    let svc = service_with(feeds);

    svc.subscribe("http://bob.example/").await.unwrap();
    assert!(svc
        .get_subscription_recent("http://bob.example/")
        .await
        .unwrap()
        .is_empty());

    svc.unsubscribe("http://bob.example/").await.unwrap();
    assert!(svc
        .get_subscription_recent("http://bob.example/")
        .await
        .unwrap_err()
        .is_not_found());
}
