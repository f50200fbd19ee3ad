//! Post documents
//!
//! Stored as JSON with the field names the publishing front end uses
//! (`fullName`, `postUrl`, `meta.isPrivate`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post identifier, allocated per namespace starting at 1
pub type PostId = u64;

/// A stored post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub full_name: String,
    pub username: String,
    /// Origin of the post
    pub post_url: String,
    pub content: PostContent,
    #[serde(default)]
    pub meta: PostMeta,
    /// URLs this post has been shared to, oldest first, no duplicates
    #[serde(default)]
    pub shares: Vec<String>,
}

impl Post {
    pub fn is_private(&self) -> bool {
        self.meta.is_private
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    pub body: String,
    /// Set once at creation
    pub created: DateTime<Utc>,
    /// Advanced on every mutation, never moves backwards
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMeta {
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_shared: bool,
}

/// Caller input for a new post. Id, owner and timestamps are never taken
/// from a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    #[serde(default)]
    pub content: DraftContent,
    #[serde(default)]
    pub meta: PostMeta,
    /// Overrides the owner's default post URL
    #[serde(default)]
    pub post_url: Option<String>,
    #[serde(default)]
    pub shares: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftContent {
    #[serde(default)]
    pub body: String,
}

impl PostDraft {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            content: DraftContent { body: body.into() },
            ..Self::default()
        }
    }

    pub fn private(mut self, is_private: bool) -> Self {
        self.meta.is_private = is_private;
        self
    }

    pub fn with_post_url(mut self, url: impl Into<String>) -> Self {
        self.post_url = Some(url.into());
        self
    }
}

/// Drop repeated share URLs, keeping the first occurrence.
pub fn dedup_shares(shares: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    shares
        .into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
