//! Monotonic post id allocation
//!
//! The counter holds the last allocated id. `next()` never writes it: the
//! new value comes back as a pending operation that the caller commits in
//! the same batch as the post, so a failed create leaves no gap.

use super::errors::PostResult;
use super::keys::{decode_value, encode_value, Namespace};
use super::model::PostId;
use crate::kv::{BatchOp, StoreHandle};

/// An allocated id plus the counter write that claims it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub id: PostId,
    /// Must be committed with the post for the id to be consumed
    pub commit: BatchOp,
}

#[derive(Debug, Clone)]
pub struct IdAllocator {
    store: StoreHandle,
    namespace: Namespace,
}

impl IdAllocator {
    pub fn new(store: StoreHandle, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    /// Last committed id, 0 when nothing was ever allocated.
    ///
    /// Only an absent counter means 0; a failed or undecodable read is an
    /// error and never restarts the sequence.
    pub async fn current(&self) -> PostResult<PostId> {
        let key = self.namespace.counter();
        match self.store.get(key.clone()).await? {
            Some(bytes) => Ok(decode_value(&key, &bytes)?),
            None => Ok(0),
        }
    }

    /// Next id after the committed counter.
    pub async fn next(&self) -> PostResult<Allocation> {
        let id = self.current().await? + 1;
        Ok(Allocation {
            id,
            commit: BatchOp::put(self.namespace.counter(), encode_value(&id)?),
        })
    }
}
