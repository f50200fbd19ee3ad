//! Visibility indexes
//!
//! Three ordered id lists per namespace: "all", "public" and "private",
//! newest first. While a post exists its id is in "all" exactly once and
//! in exactly one of "public"/"private".
//!
//! # Discipline
//!
//! Lists are whole values. A mutating operation loads an `IndexSnapshot`
//! once, under the namespace writer lock, mutates it in memory and folds
//! the returned puts into its own atomic batch. The index never commits.

use super::errors::PostResult;
use super::keys::{decode_value, encode_value, IndexKind, Namespace};
use super::model::PostId;
use crate::kv::{BatchOp, StoreHandle};

/// Ordered id list, newest first, no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdList(Vec<PostId>);

impl IdList {
    pub fn new(ids: Vec<PostId>) -> Self {
        Self(ids)
    }

    /// Put `id` at the front. Returns false if it was already listed.
    pub fn push_front(&mut self, id: PostId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.insert(0, id);
        true
    }

    /// Remove `id` if listed. An absent id leaves the list untouched.
    pub fn remove(&mut self, id: PostId) -> bool {
        match self.0.iter().position(|&x| x == id) {
            Some(pos) => {
                self.0.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: PostId) -> bool {
        self.0.contains(&id)
    }

    pub fn as_slice(&self) -> &[PostId] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<PostId> {
        self.0
    }
}

/// The three lists as read at the start of one operation.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    namespace: Namespace,
    all: IdList,
    public: IdList,
    private: IdList,
}

impl IndexSnapshot {
    pub fn list(&self, kind: IndexKind) -> &IdList {
        match kind {
            IndexKind::All => &self.all,
            IndexKind::Public => &self.public,
            IndexKind::Private => &self.private,
        }
    }

    fn list_mut(&mut self, kind: IndexKind) -> &mut IdList {
        match kind {
            IndexKind::All => &mut self.all,
            IndexKind::Public => &mut self.public,
            IndexKind::Private => &mut self.private,
        }
    }

    fn put_op(&self, kind: IndexKind) -> PostResult<BatchOp> {
        Ok(BatchOp::put(
            self.namespace.index(kind),
            encode_value(self.list(kind).as_slice())?,
        ))
    }

    fn ops_for(&self, changed: &[IndexKind]) -> PostResult<Vec<BatchOp>> {
        changed.iter().map(|&kind| self.put_op(kind)).collect()
    }

    /// Index a new post: front of "all" and front of its visibility list.
    /// The opposite visibility list is cleared of `id` so it can never be
    /// in both.
    pub fn insert(&mut self, id: PostId, is_private: bool) -> PostResult<Vec<BatchOp>> {
        let target = IndexKind::for_visibility(is_private);
        let other = IndexKind::for_visibility(!is_private);

        let mut changed = Vec::new();
        if self.all.push_front(id) {
            changed.push(IndexKind::All);
        }
        if self.list_mut(target).push_front(id) {
            changed.push(target);
        }
        if self.list_mut(other).remove(id) {
            changed.push(other);
        }
        self.ops_for(&changed)
    }

    /// Move `id` between "public" and "private" when visibility changed.
    /// The id goes to the front of its new list.
    pub fn relocate(
        &mut self,
        id: PostId,
        was_private: bool,
        is_private: bool,
    ) -> PostResult<Vec<BatchOp>> {
        if was_private == is_private {
            return Ok(Vec::new());
        }

        let from = IndexKind::for_visibility(was_private);
        let to = IndexKind::for_visibility(is_private);

        let mut changed = Vec::new();
        if self.list_mut(from).remove(id) {
            changed.push(from);
        }
        if self.list_mut(to).push_front(id) {
            changed.push(to);
        }
        self.ops_for(&changed)
    }

    /// Drop `id` from every list it appears in.
    pub fn remove(&mut self, id: PostId) -> PostResult<Vec<BatchOp>> {
        let changed: Vec<IndexKind> = [IndexKind::All, IndexKind::Public, IndexKind::Private]
            .into_iter()
            .filter(|&kind| self.list_mut(kind).remove(id))
            .collect();
        self.ops_for(&changed)
    }
}

/// Reader for the visibility lists of one namespace.
#[derive(Debug, Clone)]
pub struct VisibilityIndex {
    store: StoreHandle,
    namespace: Namespace,
}

impl VisibilityIndex {
    pub fn new(store: StoreHandle, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    /// One list; absent means empty.
    pub async fn load_list(&self, kind: IndexKind) -> PostResult<IdList> {
        let key = self.namespace.index(kind);
        match self.store.get(key.clone()).await? {
            Some(bytes) => Ok(IdList::new(decode_value(&key, &bytes)?)),
            None => Ok(IdList::default()),
        }
    }

    /// All three lists, for a mutating operation.
    pub async fn snapshot(&self) -> PostResult<IndexSnapshot> {
        Ok(IndexSnapshot {
            namespace: self.namespace.clone(),
            all: self.load_list(IndexKind::All).await?,
            public: self.load_list(IndexKind::Public).await?,
            private: self.load_list(IndexKind::Private).await?,
        })
    }
}
