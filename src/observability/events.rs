//! Observable events
//!
//! Events are explicit and typed; the string form is what lands in logs.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Store lifecycle
    /// Log replayed and ready
    StoreOpened,
    /// Store flushed and released
    StoreClosed,
    /// Incomplete final batch cut off during replay
    StoreTornTailDiscarded,
    /// A failed append could not be truncated away; appends are refused
    StoreRollbackFailed,

    // Configuration
    ConfigLoaded,

    // Post writes
    PostCreated,
    PostUpdated,
    PostDeleted,
    PostShared,
    /// A visibility change moved a post between public and private
    PostRelocated,
    /// Atomic commit rejected by the store; nothing applied
    CommitFailed,

    // Subscriptions
    SubscriptionAdded,
    SubscriptionRemoved,
    FeedFetched,
    FeedFetchFailed,

    // Administrative
    NamespaceFlushed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreClosed => "STORE_CLOSED",
            Event::StoreTornTailDiscarded => "STORE_TORN_TAIL_DISCARDED",
            Event::StoreRollbackFailed => "STORE_ROLLBACK_FAILED",

            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::PostCreated => "POST_CREATED",
            Event::PostUpdated => "POST_UPDATED",
            Event::PostDeleted => "POST_DELETED",
            Event::PostShared => "POST_SHARED",
            Event::PostRelocated => "POST_RELOCATED",
            Event::CommitFailed => "COMMIT_FAILED",

            Event::SubscriptionAdded => "SUBSCRIPTION_ADDED",
            Event::SubscriptionRemoved => "SUBSCRIPTION_REMOVED",
            Event::FeedFetched => "FEED_FETCHED",
            Event::FeedFetchFailed => "FEED_FETCH_FAILED",

            Event::NamespaceFlushed => "NAMESPACE_FLUSHED",
        }
    }

    /// Events that are logged above INFO
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::StoreTornTailDiscarded | Event::FeedFetchFailed | Event::NamespaceFlushed
        )
    }

    /// Returns true if this event indicates a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::CommitFailed | Event::StoreRollbackFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
