//! Canonical post records
//!
//! Writes are returned as pending batch operations so a record always
//! lands together with its index updates.

use super::errors::{PostError, PostResult};
use super::keys::{decode_value, encode_value, Namespace};
use super::model::{Post, PostId};
use crate::kv::{BatchOp, StoreHandle};

#[derive(Debug, Clone)]
pub struct PostRecordStore {
    store: StoreHandle,
    namespace: Namespace,
}

impl PostRecordStore {
    pub fn new(store: StoreHandle, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    /// The record, or `None` when no post has this id.
    pub async fn try_get(&self, id: PostId) -> PostResult<Option<Post>> {
        let key = self.namespace.post(id);
        match self.store.get(key.clone()).await? {
            Some(bytes) => Ok(Some(decode_value(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: PostId) -> PostResult<Post> {
        self.try_get(id)
            .await?
            .ok_or_else(|| PostError::post_not_found(id))
    }

    pub fn put_op(&self, post: &Post) -> PostResult<BatchOp> {
        Ok(BatchOp::put(self.namespace.post(post.id), encode_value(post)?))
    }

    pub fn delete_op(&self, id: PostId) -> BatchOp {
        BatchOp::delete(self.namespace.post(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::model::{PostContent, PostMeta};
    use chrono::Utc;

    fn sample(id: PostId) -> Post {
        let now = Utc::now();
        Post {
            id,
            full_name: "Alice".into(),
            username: "alice".into(),
            post_url: "http://alice.example/".into(),
            content: PostContent {
                body: format!("post {}", id),
                created: now,
                updated: now,
            },
            meta: PostMeta::default(),
            shares: Vec::new(),
        }
    }

    fn records() -> (StoreHandle, PostRecordStore) {
        let handle = StoreHandle::in_memory();
        let records = PostRecordStore::new(handle.clone(), Namespace::new("alice").unwrap());
        (handle, records)
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let (_, records) = records();
        assert!(records.try_get(1).await.unwrap().is_none());
        assert!(records.get(1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (handle, records) = records();
        let post = sample(3);
        handle.batch(vec![records.put_op(&post).unwrap()]).await.unwrap();

        assert_eq!(records.get(3).await.unwrap(), post);

        handle.batch(vec![records.delete_op(3)]).await.unwrap();
        assert!(records.get(3).await.unwrap_err().is_not_found());
    }
}
