//! postline - per-user post storage
//!
//! Posts, their visibility indexes and feed subscriptions, kept in a
//! single ordered key-value store with atomic batches.

pub mod cli;
pub mod config;
pub mod feed;
pub mod kv;
pub mod observability;
pub mod post;

pub use config::Config;
pub use kv::StoreHandle;
pub use post::{Owner, Post, PostDraft, PostError, PostService};
