use crate::error::Result;
use crate::relation::{Entry, Relation};
use crate::shortcode::ShortCode;
use async_trait::async_trait;

/// A single mutation of the relation, as seen by a persistence backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A new entry was created.
    Insert(Entry),
    /// An owner soft-deleted one of their codes.
    MarkDeleted { owner: String, code: ShortCode },
}

impl Change {
    pub fn code(&self) -> &ShortCode {
        match self {
            Change::Insert(entry) => &entry.code,
            Change::MarkDeleted { code, .. } => code,
        }
    }
}

/// Persistence mirror for the mapping store.
///
/// The store owns the authoritative relation in memory. A backend is read
/// once through [`Backend::load`] when the store is opened and is then
/// written through on every mutation.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Short human-readable backend name for logs.
    fn name(&self) -> &'static str;

    /// Reads the whole persisted relation.
    async fn load(&self) -> Result<Relation>;

    /// Persists one change.
    ///
    /// `relation` is the in-memory state with `change` already applied.
    /// Returns `Err(StorageError::Conflict)` if the backend itself refuses
    /// the change because the code is taken.
    async fn commit(&self, change: &Change, relation: &Relation) -> Result<()>;

    /// Reports whether the backend is reachable.
    async fn health_check(&self) -> bool;

    /// Releases any resources held by the backend.
    async fn close(&self) {}
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn load(&self) -> Result<Relation> {
        (**self).load().await
    }

    async fn commit(&self, change: &Change, relation: &Relation) -> Result<()> {
        (**self).commit(change, relation).await
    }

    async fn health_check(&self) -> bool {
        (**self).health_check().await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
