//! Per-user key layout
//!
//! | Key                   | Value                              |
//! |-----------------------|------------------------------------|
//! | `<ns>!ids`            | last allocated id                  |
//! | `<ns>!all:ids`        | id array, newest first             |
//! | `<ns>!public:ids`     | id array, newest first             |
//! | `<ns>!priv:ids`       | id array, newest first             |
//! | `<ns>!subscriptions`  | object `url -> true`               |
//! | `<ns>!post!<id>`      | post record                        |
//!
//! All values are JSON.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::{PostError, PostResult};
use super::model::PostId;
use crate::kv::{StorageError, StorageResult};

const SEPARATOR: char = '!';

/// One of the three ordinal indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    All,
    Public,
    Private,
}

impl IndexKind {
    /// The visibility list a post belongs in
    pub fn for_visibility(is_private: bool) -> Self {
        if is_private {
            IndexKind::Private
        } else {
            IndexKind::Public
        }
    }

    fn key_suffix(&self) -> &'static str {
        match self {
            IndexKind::All => "all:ids",
            IndexKind::Public => "public:ids",
            IndexKind::Private => "priv:ids",
        }
    }
}

/// Key prefix scoping one user's posts, indexes and subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    username: String,
    prefix: String,
}

impl Namespace {
    /// Usernames must be non-empty and must not contain the separator,
    /// otherwise one namespace could read another's keys.
    pub fn new(username: &str) -> PostResult<Self> {
        if username.trim().is_empty() {
            return Err(PostError::validation("username is required"));
        }
        if username.contains(SEPARATOR) {
            return Err(PostError::validation(format!(
                "username must not contain '{}'",
                SEPARATOR
            )));
        }
        Ok(Self {
            username: username.to_string(),
            prefix: format!("{}{}", username, SEPARATOR),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Every key of this namespace starts with this
    pub fn prefix(&self) -> &[u8] {
        self.prefix.as_bytes()
    }

    fn key(&self, suffix: &str) -> Vec<u8> {
        format!("{}{}", self.prefix, suffix).into_bytes()
    }

    pub fn counter(&self) -> Vec<u8> {
        self.key("ids")
    }

    pub fn index(&self, kind: IndexKind) -> Vec<u8> {
        self.key(kind.key_suffix())
    }

    pub fn subscriptions(&self) -> Vec<u8> {
        self.key("subscriptions")
    }

    pub fn post(&self, id: PostId) -> Vec<u8> {
        self.key(&format!("post{}{}", SEPARATOR, id))
    }
}

/// Serialize a value for storage
pub(crate) fn encode_value<T: Serialize + ?Sized>(value: &T) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| StorageError::write_failed_no_source(format!("Failed to encode value: {}", e)))
}

/// Deserialize a stored value; a value that does not decode is corruption
pub(crate) fn decode_value<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> StorageResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::corruption_for_key(key, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let ns = Namespace::new("alice").unwrap();
        assert_eq!(ns.counter(), b"alice!ids");
        assert_eq!(ns.index(IndexKind::All), b"alice!all:ids");
        assert_eq!(ns.index(IndexKind::Public), b"alice!public:ids");
        assert_eq!(ns.index(IndexKind::Private), b"alice!priv:ids");
        assert_eq!(ns.subscriptions(), b"alice!subscriptions");
        assert_eq!(ns.post(12), b"alice!post!12");
        assert_eq!(ns.prefix(), b"alice!");
    }

    #[test]
    fn test_rejects_bad_usernames() {
        assert!(Namespace::new("").is_err());
        assert!(Namespace::new("   ").is_err());
        assert!(Namespace::new("al!ce").is_err());
    }

    #[test]
    fn test_visibility_kind() {
        assert_eq!(IndexKind::for_visibility(true), IndexKind::Private);
        assert_eq!(IndexKind::for_visibility(false), IndexKind::Public);
    }

    #[test]
    fn test_decode_garbage_is_corruption() {
        let err = decode_value::<u64>(b"alice!ids", b"not json").unwrap_err();
        assert!(err.is_fatal());
    }
}
