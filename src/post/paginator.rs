//! Page resolution over an ordered id list
//!
//! A page is `ids[offset .. offset + limit]` resolved to full records, in
//! list order. One unresolved id fails the whole page.

use serde::Serialize;

use super::errors::{PostError, PostResult};
use super::model::{Post, PostId};
use super::record_store::PostRecordStore;

/// Page size used when the configured window leaves no room
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// One listing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub posts: Vec<Post>,
    pub offset: usize,
    /// Another id exists past this window
    pub has_more: bool,
}

impl Page {
    /// Offset of the following page, if there is one
    pub fn next_offset(&self) -> Option<usize> {
        self.has_more.then(|| self.offset + self.posts.len())
    }

    pub fn ids(&self) -> Vec<PostId> {
        self.posts.iter().map(|p| p.id).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    limit: usize,
}

impl Paginator {
    /// Fixed page size; 0 falls back to the default
    pub fn new(limit: usize) -> Self {
        let limit = if limit == 0 { DEFAULT_PAGE_LIMIT } else { limit };
        Self { limit }
    }

    /// Page size from a window that reserves its last slot as the
    /// "has more" sentinel.
    pub fn from_window(window: usize) -> Self {
        Self::new(window.saturating_sub(1))
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn page(
        &self,
        records: &PostRecordStore,
        ordered_ids: &[PostId],
        offset: usize,
    ) -> PostResult<Page> {
        let start = offset.min(ordered_ids.len());
        let end = start.saturating_add(self.limit).min(ordered_ids.len());

        let mut posts = Vec::with_capacity(end - start);
        for &id in &ordered_ids[start..end] {
            let post = records.try_get(id).await?.ok_or_else(|| {
                PostError::not_found(format!("post {} is indexed but has no record", id))
            })?;
            posts.push(post);
        }

        Ok(Page {
            posts,
            offset,
            has_more: end < ordered_ids.len(),
        })
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::StoreHandle;
    use crate::post::keys::Namespace;
    use crate::post::model::{PostContent, PostMeta};
    use chrono::Utc;

    async fn seeded(count: PostId) -> PostRecordStore {
        let handle = StoreHandle::in_memory();
        let records = PostRecordStore::new(handle.clone(), Namespace::new("alice").unwrap());
        let now = Utc::now();
        let mut ops = Vec::new();
        for id in 1..=count {
            let post = Post {
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
            };
            ops.push(records.put_op(&post).unwrap());
        }
        handle.batch(ops).await.unwrap();
        records
    }

    #[test]
    fn test_window_reserves_sentinel() {
        assert_eq!(Paginator::from_window(11).limit(), 10);
        assert_eq!(Paginator::from_window(4).limit(), 3);
        assert_eq!(Paginator::from_window(1).limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(Paginator::from_window(0).limit(), DEFAULT_PAGE_LIMIT);
    }

    #[tokio::test]
    async fn test_page_slices_in_order() {
        let records = seeded(5).await;
        let paginator = Paginator::new(2);
        let ids = [5, 4, 3, 2, 1];

        let first = paginator.page(&records, &ids, 0).await.unwrap();
        assert_eq!(first.ids(), vec![5, 4]);
        assert!(first.has_more);
        assert_eq!(first.next_offset(), Some(2));

        let last = paginator.page(&records, &ids, 4).await.unwrap();
        assert_eq!(last.ids(), vec![1]);
        assert!(!last.has_more);
        assert_eq!(last.next_offset(), None);
    }

    #[tokio::test]
    async fn test_offset_past_end_is_empty() {
        let records = seeded(2).await;
        let page = Paginator::new(5).page(&records, &[2, 1], 10).await.unwrap();
        assert!(page.posts.is_empty());
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_missing_record_fails_whole_page() {
        let records = seeded(2).await;
        let err = Paginator::new(5)
            .page(&records, &[3, 2, 1], 0)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
