//! Post service
//!
//! The public face of the post layer. Composes the id allocator, the
//! visibility index, the record store and the subscription registry over
//! one namespace.
//!
//! # Write discipline
//!
//! Every mutating call takes the namespace writer lock, reads what it needs
//! (counter, index snapshot, stored record), builds the full list of
//! changes and commits them as one batch. Either everything lands or
//! nothing does. Reads never take the lock.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::errors::{PostError, PostResult};
use super::id_alloc::IdAllocator;
use super::index::VisibilityIndex;
use super::keys::{IndexKind, Namespace};
use super::model::{dedup_shares, DraftContent, Post, PostContent, PostDraft, PostId, PostMeta};
use super::paginator::{Page, Paginator};
use super::record_store::PostRecordStore;
use super::subscriptions::{normalize_url, SubscriptionRegistry};
use crate::config::Config;
use crate::feed::{parse_feed, FeedSource, HttpFeedSource};
use crate::kv::{BatchOp, StoreHandle, WriterLock};
use crate::observability::{log_event_with_fields, Event};

/// The user whose posts a service manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub username: String,
    pub full_name: String,
    /// Default origin URL for new posts
    pub post_url: String,
}

impl Owner {
    pub fn new(
        username: impl Into<String>,
        full_name: impl Into<String>,
        post_url: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            full_name: full_name.into(),
            post_url: post_url.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostService {
    store: StoreHandle,
    owner: Owner,
    namespace: Namespace,
    writer: WriterLock,
    ids: IdAllocator,
    index: VisibilityIndex,
    records: PostRecordStore,
    subscriptions: SubscriptionRegistry,
    paginator: Paginator,
    feeds: Arc<dyn FeedSource>,
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl PostService {
    /// Service for `owner` on `store`. Services built on clones of the
    /// same handle for the same username share one writer lock.
    pub fn new(store: StoreHandle, owner: Owner, feeds: Arc<dyn FeedSource>) -> PostResult<Self> {
        let namespace = Namespace::new(&owner.username)?;
        let writer = store.writer_lock(namespace.username());

        Ok(Self {
            ids: IdAllocator::new(store.clone(), namespace.clone()),
            index: VisibilityIndex::new(store.clone(), namespace.clone()),
            records: PostRecordStore::new(store.clone(), namespace.clone()),
            subscriptions: SubscriptionRegistry::new(store.clone(), namespace.clone()),
            paginator: Paginator::default(),
            store,
            owner,
            namespace,
            writer,
            feeds,
        })
    }

    /// Service for the configured owner with an HTTP feed source
    pub fn from_config(store: StoreHandle, config: &Config) -> PostResult<Self> {
        let feeds = HttpFeedSource::new(Duration::from_millis(config.feed_timeout_ms))?;
        Ok(Self::new(store, config.owner(), Arc::new(feeds))?.with_paginator(config.paginator()))
    }

    pub fn with_paginator(mut self, paginator: Paginator) -> Self {
        self.paginator = paginator;
        self
    }

    pub fn with_feed_source(mut self, feeds: Arc<dyn FeedSource>) -> Self {
        self.feeds = feeds;
        self
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn paginator(&self) -> Paginator {
        self.paginator
    }

    fn log(&self, event: Event, fields: &[(&str, &str)]) {
        let mut all = Vec::with_capacity(fields.len() + 1);
        all.push(("namespace", self.namespace.username()));
        all.extend_from_slice(fields);
        log_event_with_fields(event, &all);
    }

    async fn commit(&self, operation: &str, ops: Vec<BatchOp>) -> PostResult<()> {
        let count = ops.len().to_string();
        if let Err(e) = self.store.batch(ops).await {
            self.log(
                Event::CommitFailed,
                &[
                    ("operation", operation),
                    ("ops", &count),
                    ("code", e.code().code()),
                ],
            );
            return Err(e.into());
        }
        Ok(())
    }

    /// Checks a draft and returns the post URL it will be stored with.
    fn resolve_post_url(&self, draft: &PostDraft) -> PostResult<String> {
        if is_blank(&draft.content.body) {
            return Err(PostError::validation("content.body is required"));
        }
        if is_blank(&self.owner.full_name) {
            return Err(PostError::validation("owner full name is required"));
        }
        let post_url = match &draft.post_url {
            Some(url) if !is_blank(url) => url.clone(),
            _ => self.owner.post_url.clone(),
        };
        if is_blank(&post_url) {
            return Err(PostError::validation("postUrl is required"));
        }
        Ok(post_url)
    }

    /// Store a new post. Id, owner identity and timestamps are assigned
    /// here.
    pub async fn create(&self, draft: PostDraft) -> PostResult<Post> {
        let post_url = self.resolve_post_url(&draft)?;
        let _guard = self.writer.lock().await;
        let post = self.create_locked(draft, post_url).await?;

        let id = post.id.to_string();
        self.log(
            Event::PostCreated,
            &[("id", &id), ("private", bool_str(post.is_private()))],
        );
        Ok(post)
    }

    async fn create_locked(&self, draft: PostDraft, post_url: String) -> PostResult<Post> {
        let allocation = self.ids.next().await?;
        let mut snapshot = self.index.snapshot().await?;

        let now = Utc::now();
        let post = Post {
            id: allocation.id,
            full_name: self.owner.full_name.clone(),
            username: self.owner.username.clone(),
            post_url,
            content: PostContent {
                body: draft.content.body,
                created: now,
                updated: now,
            },
            meta: draft.meta,
            shares: dedup_shares(draft.shares),
        };

        let mut ops = vec![allocation.commit, self.records.put_op(&post)?];
        ops.extend(snapshot.insert(post.id, post.is_private())?);
        self.commit("create", ops).await?;

        Ok(post)
    }

    pub async fn get(&self, id: PostId) -> PostResult<Post> {
        self.records.get(id).await
    }

    /// Replace the editable parts of a stored post.
    ///
    /// `id`, `created`, `username` and `fullName` always come from the
    /// stored record. A blank `postUrl` keeps the stored one. A change of
    /// `meta.isPrivate` moves the id to the front of its new visibility
    /// list.
    pub async fn update(&self, post: Post) -> PostResult<Post> {
        if is_blank(&post.content.body) {
            return Err(PostError::validation("content.body is required"));
        }

        let _guard = self.writer.lock().await;
        let stored = self.records.get(post.id).await?;
        let mut snapshot = self.index.snapshot().await?;

        let updated = Post {
            id: stored.id,
            full_name: stored.full_name,
            username: stored.username,
            post_url: if is_blank(&post.post_url) {
                stored.post_url
            } else {
                post.post_url
            },
            content: PostContent {
                body: post.content.body,
                created: stored.content.created,
                updated: Utc::now().max(stored.content.updated),
            },
            meta: post.meta,
            shares: dedup_shares(post.shares),
        };

        let was_private = stored.meta.is_private;
        let moves = snapshot.relocate(updated.id, was_private, updated.is_private())?;
        let relocated = !moves.is_empty();

        let mut ops = vec![self.records.put_op(&updated)?];
        ops.extend(moves);
        self.commit("update", ops).await?;

        let id = updated.id.to_string();
        self.log(Event::PostUpdated, &[("id", &id)]);
        if relocated {
            self.log(
                Event::PostRelocated,
                &[
                    ("id", &id),
                    ("to", index_name(IndexKind::for_visibility(updated.is_private()))),
                ],
            );
        }
        Ok(updated)
    }

    /// Remove a post and every index entry for it
    pub async fn del(&self, id: PostId) -> PostResult<()> {
        let _guard = self.writer.lock().await;
        self.records.get(id).await?;
        let mut snapshot = self.index.snapshot().await?;

        let mut ops = vec![self.records.delete_op(id)];
        ops.extend(snapshot.remove(id)?);
        self.commit("delete", ops).await?;

        self.log(Event::PostDeleted, &[("id", &id.to_string())]);
        Ok(())
    }

    /// Re-post `post` towards `target_url`.
    ///
    /// Creates a new post with `isShared` set, `postUrl = target_url` and
    /// the target appended to the share history. The source post is not
    /// modified.
    pub async fn share(&self, post: &Post, target_url: &str) -> PostResult<Post> {
        if is_blank(target_url) {
            return Err(PostError::validation("share target url is required"));
        }
        if post.shares.iter().any(|url| url == target_url) {
            return Err(PostError::AlreadyShared(target_url.to_string()));
        }

        let mut shares = post.shares.clone();
        shares.push(target_url.to_string());
        let draft = PostDraft {
            content: DraftContent {
                body: post.content.body.clone(),
            },
            meta: PostMeta {
                is_private: post.meta.is_private,
                is_shared: true,
            },
            post_url: Some(target_url.to_string()),
            shares,
        };

        let post_url = self.resolve_post_url(&draft)?;
        let _guard = self.writer.lock().await;
        let shared = self.create_locked(draft, post_url).await?;

        self.log(
            Event::PostShared,
            &[
                ("id", &shared.id.to_string()),
                ("source", &post.id.to_string()),
                ("target", target_url),
            ],
        );
        Ok(shared)
    }

    pub async fn subscribe(&self, url: &str) -> PostResult<String> {
        let _guard = self.writer.lock().await;
        let url = self.subscriptions.subscribe(url).await?;
        self.log(Event::SubscriptionAdded, &[("url", &url)]);
        Ok(url)
    }

    pub async fn unsubscribe(&self, url: &str) -> PostResult<String> {
        let _guard = self.writer.lock().await;
        let url = self.subscriptions.unsubscribe(url).await?;
        self.log(Event::SubscriptionRemoved, &[("url", &url)]);
        Ok(url)
    }

    pub async fn get_subscriptions(&self) -> PostResult<Vec<String>> {
        self.subscriptions.list().await
    }

    /// Recent posts of a subscribed feed.
    pub async fn get_subscription_recent(&self, url: &str) -> PostResult<Vec<serde_json::Value>> {
        let url = normalize_url(url);
        if !self.subscriptions.contains(&url).await? {
            return Err(PostError::not_found(format!("subscription {}", url)));
        }

        let fetched = match self.feeds.fetch(&url).await {
            Ok(body) => parse_feed(&body),
            Err(e) => Err(e),
        };

        match fetched {
            Ok(posts) => {
                self.log(
                    Event::FeedFetched,
                    &[("url", &url), ("posts", &posts.len().to_string())],
                );
                Ok(posts)
            }
            Err(e) => {
                self.log(Event::FeedFetchFailed, &[("url", &url), ("error", &e.to_string())]);
                Err(e.into())
            }
        }
    }

    /// One page of every post, newest first
    pub async fn get_all(&self, offset: usize) -> PostResult<Page> {
        self.page_of(IndexKind::All, offset).await
    }

    /// Every post id, newest first
    pub async fn get_all_ids(&self) -> PostResult<Vec<PostId>> {
        Ok(self.index.load_list(IndexKind::All).await?.into_vec())
    }

    /// One page of public posts, newest first
    pub async fn share_recent(&self, offset: usize) -> PostResult<Page> {
        self.page_of(IndexKind::Public, offset).await
    }

    async fn page_of(&self, kind: IndexKind, offset: usize) -> PostResult<Page> {
        let ids = self.index.load_list(kind).await?;
        self.paginator.page(&self.records, ids.as_slice(), offset).await
    }

    /// A single post for public consumption. Private posts are refused.
    pub async fn share_one(&self, id: PostId) -> PostResult<Post> {
        let post = self.records.get(id).await?;
        if post.is_private() {
            return Err(PostError::Privacy(id));
        }
        Ok(post)
    }

    /// Delete every key of this namespace in one batch. Returns the
    /// number of keys removed. Irreversible.
    pub async fn flush(&self) -> PostResult<usize> {
        let _guard = self.writer.lock().await;
        let entries = self.store.scan_prefix(self.namespace.prefix().to_vec()).await?;
        let ops: Vec<BatchOp> = entries
            .into_iter()
            .map(|(key, _)| BatchOp::delete(key))
            .collect();
        let count = ops.len();

        if count > 0 {
            self.commit("flush", ops).await?;
        }

        self.log(Event::NamespaceFlushed, &[("keys", &count.to_string())]);
        Ok(count)
    }
}

fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

fn index_name(kind: IndexKind) -> &'static str {
    match kind {
        IndexKind::All => "all",
        IndexKind::Public => "public",
        IndexKind::Private => "private",
    }
}
