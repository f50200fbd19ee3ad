//! Posts
//!
//! Storage of one user's posts over the shared key-value store: id
//! allocation, the visibility indexes, canonical records, subscriptions
//! and paging, composed by [`PostService`].

mod errors;
mod id_alloc;
mod index;
mod keys;
mod model;
mod paginator;
mod record_store;
mod service;
mod subscriptions;

pub use errors::{PostError, PostResult};
pub use id_alloc::{Allocation, IdAllocator};
pub use index::{IdList, IndexSnapshot, VisibilityIndex};
pub use keys::{IndexKind, Namespace};
pub use model::{dedup_shares, DraftContent, Post, PostContent, PostDraft, PostId, PostMeta};
pub use paginator::{Page, Paginator, DEFAULT_PAGE_LIMIT};
pub use record_store::PostRecordStore;
pub use service::{Owner, PostService};
pub use subscriptions::{normalize_url, SubscriptionRegistry};
