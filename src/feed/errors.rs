//! Feed retrieval errors

use thiserror::Error;

pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Request never produced a response (DNS, connect, timeout, ...)
    #[error("Feed request failed: {0}")]
    Transport(String),

    #[error("Feed responded with HTTP {0}")]
    Status(u16),

    /// Body was not a feed document
    #[error("Malformed feed: {0}")]
    Parse(String),
}

impl FeedError {
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(FeedError::Status(404).to_string(), "Feed responded with HTTP 404");
        assert!(FeedError::Parse("x".into()).is_parse());
        assert!(!FeedError::Transport("x".into()).is_parse());
    }
}
