//! Subscribed feed URLs
//!
//! One JSON mapping `url -> true` per namespace. Every mutation reads the
//! whole mapping, changes it and writes it back, so callers must hold the
//! namespace writer lock around `subscribe`/`unsubscribe`.

use std::collections::BTreeMap;

use super::errors::{PostError, PostResult};
use super::keys::{decode_value, encode_value, Namespace};
use crate::kv::{BatchOp, StoreHandle};

/// Trimmed and lower-cased form used as the set member
pub fn normalize_url(url: &str) -> String {
    url.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct SubscriptionRegistry {
    store: StoreHandle,
    namespace: Namespace,
}

impl SubscriptionRegistry {
    pub fn new(store: StoreHandle, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    async fn load(&self) -> PostResult<BTreeMap<String, bool>> {
        let key = self.namespace.subscriptions();
        match self.store.get(key.clone()).await? {
            Some(bytes) => Ok(decode_value(&key, &bytes)?),
            None => Ok(BTreeMap::new()),
        }
    }

    async fn save(&self, subscriptions: &BTreeMap<String, bool>) -> PostResult<()> {
        let op = BatchOp::put(self.namespace.subscriptions(), encode_value(subscriptions)?);
        self.store.batch(vec![op]).await?;
        Ok(())
    }

    fn normalized(url: &str) -> PostResult<String> {
        let url = normalize_url(url);
        if url.is_empty() {
            return Err(PostError::validation("subscription url is required"));
        }
        Ok(url)
    }

    /// Add `url`. Subscribing twice is not an error. Returns the
    /// normalized URL.
    pub async fn subscribe(&self, url: &str) -> PostResult<String> {
        let url = Self::normalized(url)?;
        let mut subscriptions = self.load().await?;
        if subscriptions.insert(url.clone(), true).is_none() {
            self.save(&subscriptions).await?;
        }
        Ok(url)
    }

    /// Remove `url`. Removing an absent URL is not an error.
    pub async fn unsubscribe(&self, url: &str) -> PostResult<String> {
        let url = Self::normalized(url)?;
        let mut subscriptions = self.load().await?;
        if subscriptions.remove(&url).is_some() {
            self.save(&subscriptions).await?;
        }
        Ok(url)
    }

    /// Subscribed URLs in ascending order
    pub async fn list(&self) -> PostResult<Vec<String>> {
        Ok(self.load().await?.into_keys().collect())
    }

    pub async fn contains(&self, url: &str) -> PostResult<bool> {
        Ok(self.load().await?.contains_key(&normalize_url(url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SubscriptionRegistry {
        SubscriptionRegistry::new(StoreHandle::in_memory(), Namespace::new("alice").unwrap())
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("  HTTP://Foo.com/ "), "http://foo.com/");
    }

    #[tokio::test]
    async fn test_subscribe_normalizes_and_dedups() {
        let subs = registry();
        assert_eq!(subs.subscribe("HTTP://Foo.com/ ").await.unwrap(), "http://foo.com/");
        subs.subscribe("http://foo.com/").await.unwrap();

        assert_eq!(subs.list().await.unwrap(), vec!["http://foo.com/"]);
        assert!(subs.contains(" http://FOO.com/").await.unwrap());
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let subs = registry();
        subs.subscribe("http://a.com/").await.unwrap();
        subs.subscribe("http://b.com/").await.unwrap();

        subs.unsubscribe("HTTP://A.com/").await.unwrap();
        subs.unsubscribe("http://a.com/").await.unwrap();
        subs.unsubscribe("http://never.com/").await.unwrap();

        assert_eq!(subs.list().await.unwrap(), vec!["http://b.com/"]);
    }

    #[tokio::test]
    async fn test_blank_url_rejected() {
        let subs = registry();
        let err = subs.subscribe("   ").await.unwrap_err();
        assert!(matches!(err, PostError::Validation(_)));
    }
}
