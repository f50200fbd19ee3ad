//! Post layer errors

use thiserror::Error;

use super::model::PostId;
use crate::feed::FeedError;
use crate::kv::StorageError;

/// Result type for post operations
pub type PostResult<T> = Result<T, PostError>;

/// Errors returned by the post layer. Nothing here is retried.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already shared to {0}")]
    AlreadyShared(String),

    #[error("Post {0} is private or unavailable")]
    Privacy(PostId),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Could not parse feed: {0}")]
    Parse(String),

    #[error("Feed fetch failed: {0}")]
    Feed(String),
}

impl PostError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Not-found for a post id
    pub fn post_not_found(id: PostId) -> Self {
        Self::NotFound(format!("post {}", id))
    }

    /// Stable error code for responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "POST_VALIDATION_ERROR",
            Self::NotFound(_) => "POST_NOT_FOUND",
            Self::AlreadyShared(_) => "POST_ALREADY_SHARED",
            Self::Privacy(_) => "POST_PRIVATE",
            Self::Storage(_) => "POST_STORAGE_ERROR",
            Self::Parse(_) => "POST_FEED_PARSE_ERROR",
            Self::Feed(_) => "POST_FEED_ERROR",
        }
    }

    /// HTTP status the error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::AlreadyShared(_) => 409,
            Self::Privacy(_) => 403,
            Self::Storage(_) => 500,
            Self::Parse(_) => 502,
            Self::Feed(_) => 502,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<FeedError> for PostError {
    fn from(e: FeedError) -> Self {
        match e {
            FeedError::Parse(msg) => Self::Parse(msg),
            other => Self::Feed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PostError::validation("body").status_code(), 400);
        assert_eq!(PostError::post_not_found(3).status_code(), 404);
        assert_eq!(PostError::AlreadyShared("http://a".into()).status_code(), 409);
        assert_eq!(PostError::Privacy(1).status_code(), 403);
    }

    #[test]
    fn test_feed_parse_error_maps_to_parse() {
        let err: PostError = FeedError::Parse("not json".into()).into();
        assert_eq!(err.code(), "POST_FEED_PARSE_ERROR");

        let err: PostError = FeedError::Status(503).into();
        assert_eq!(err.code(), "POST_FEED_ERROR");
    }

    #[test]
    fn test_storage_error_converts() {
        let err: PostError = StorageError::closed().into();
        assert_eq!(err.code(), "POST_STORAGE_ERROR");
        assert!(err.to_string().contains("PL_STORAGE_CLOSED"));
    }
}
