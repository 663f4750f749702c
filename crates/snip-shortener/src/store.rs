use crate::error::{Result, StoreError};
use crate::validate::{validate_owner, validate_url};
use snip_core::{Backend, Change, Deriver, DigestDeriver, Entry, Relation, ShortCode, StorageError};
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

/// What a code resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The code maps to a live link.
    Active(String),
    /// The code exists but its owner deleted it.
    Deleted,
    /// No such code.
    NotFound,
}

/// How a successful submission was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new entry was stored.
    Created,
    /// The owner already held this URL; its existing code is returned.
    AlreadyOwned,
}

/// Result of [`LinkStore::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub code: ShortCode,
    pub outcome: SubmitOutcome,
}

/// The mapping store: single source of truth for owner → code → URL.
///
/// The whole relation sits behind one reader/writer lock. Submissions and
/// deletions hold the write lock from the duplicate check through the
/// backend write, so two identical submissions can never both create an
/// entry. Backend writes therefore serialize every other operation behind
/// them.
///
/// If a backend write fails, the in-memory change is rolled back before the
/// error is returned, so memory only ever holds what the backend accepted.
#[derive(Debug)]
pub struct LinkStore<B, D = DigestDeriver> {
    relation: RwLock<Relation>,
    backend: B,
    deriver: D,
}

impl<B: Backend> LinkStore<B> {
    /// Opens a store over `backend`, deriving codes with [`DigestDeriver`].
    pub async fn open(backend: B) -> Result<Self> {
        Self::open_with_deriver(backend, DigestDeriver::new()).await
    }
}

impl<B: Backend, D: Deriver> LinkStore<B, D> {
    /// Opens a store over `backend` with a custom code deriver.
    ///
    /// The backend is loaded once here; afterwards it is only written to.
    pub async fn open_with_deriver(backend: B, deriver: D) -> Result<Self> {
        let relation = backend.load().await?;

        info!(
            backend = backend.name(),
            links = relation.len(),
            owners = relation.owner_count(),
            "opened link store"
        );

        Ok(Self {
            relation: RwLock::new(relation),
            backend,
            deriver,
        })
    }

    /// Resolves a code to its URL, whoever created it.
    pub async fn resolve(&self, code: &str) -> Resolution {
        if code.is_empty() {
            return Resolution::NotFound;
        }

        let relation = self.relation.read().await;
        match relation.get(code) {
            Some((_, link)) if link.deleted => {
                trace!(code = %code, "resolved deleted code");
                Resolution::Deleted
            }
            Some((_, link)) => {
                trace!(code = %code, url = %link.url, "resolved code");
                Resolution::Active(link.url.clone())
            }
            None => {
                trace!(code = %code, "code not found");
                Resolution::NotFound
            }
        }
    }

    /// Returns the code for `url` on behalf of `owner`, creating it if needed.
    ///
    /// Fails with [`StoreError::Conflict`] carrying the code when that code is
    /// already bound to a different owner or a different URL; the existing
    /// entry is left untouched.
    pub async fn submit(&self, owner: &str, url: &str) -> Result<Submission> {
        let mut relation = self.relation.write().await;
        self.submit_locked(&mut relation, owner, url).await
    }

    /// Submits several URLs for one owner under a single lock acquisition.
    ///
    /// Results are positional; a failing URL does not stop the others.
    pub async fn submit_batch<I, S>(&self, owner: &str, urls: I) -> Vec<Result<Submission>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut relation = self.relation.write().await;
        let mut results = Vec::new();
        for url in urls {
            results.push(self.submit_locked(&mut relation, owner, url.as_ref()).await);
        }
        results
    }

    async fn submit_locked(
        &self,
        relation: &mut Relation,
        owner: &str,
        url: &str,
    ) -> Result<Submission> {
        validate_owner(owner)?;
        validate_url(url)?;

        let code = self.deriver.derive(url);

        if let Some((holder, link)) = relation.get(code.as_str()) {
            if holder == owner && link.url == url {
                debug!(owner = %owner, code = %code, "url already owned");
                return Ok(Submission {
                    code,
                    outcome: SubmitOutcome::AlreadyOwned,
                });
            }

            debug!(owner = %owner, code = %code, holder = %holder, "code bound to another link");
            return Err(StoreError::Conflict(code));
        }

        relation.insert(Entry::new(owner, code.clone(), url));
        let change = Change::Insert(Entry::new(owner, code.clone(), url));

        if let Err(e) = self.backend.commit(&change, relation).await {
            relation.remove(code.as_str());
            warn!(
                backend = self.backend.name(),
                owner = %owner,
                code = %code,
                error = %e,
                "write-through failed, insert rolled back"
            );
            return Err(match e {
                StorageError::Conflict(_) => StoreError::Conflict(code),
                other => StoreError::Storage(other),
            });
        }

        debug!(owner = %owner, code = %code, "created link");
        Ok(Submission {
            code,
            outcome: SubmitOutcome::Created,
        })
    }

    /// Lists every entry of `owner`, soft-deleted ones included, by code.
    ///
    /// Returns `None` when the owner has no entries.
    pub async fn list(&self, owner: &str) -> Option<Vec<Entry>> {
        self.relation.read().await.entries_of(owner)
    }

    /// Soft-deletes `code` if `owner` holds it.
    ///
    /// Returns `true` only when the entry flipped from live to deleted.
    /// Unknown codes, codes of other owners and already deleted codes are
    /// no-ops.
    pub async fn mark_deleted(&self, owner: &str, code: &str) -> Result<bool> {
        let mut relation = self.relation.write().await;

        match relation.set_deleted(owner, code, true) {
            None => {
                trace!(owner = %owner, code = %code, "delete of code not held by owner ignored");
                Ok(false)
            }
            Some(true) => Ok(false),
            Some(false) => {
                let change = Change::MarkDeleted {
                    owner: owner.to_owned(),
                    code: ShortCode::new_unchecked(code),
                };

                if let Err(e) = self.backend.commit(&change, &relation).await {
                    relation.set_deleted(owner, code, false);
                    warn!(
                        backend = self.backend.name(),
                        owner = %owner,
                        code = %code,
                        error = %e,
                        "write-through failed, delete rolled back"
                    );
                    return Err(StoreError::Storage(e));
                }

                debug!(owner = %owner, code = %code, "marked link deleted");
                Ok(true)
            }
        }
    }

    /// Reports whether the backend is reachable.
    pub async fn health_check(&self) -> bool {
        self.backend.health_check().await
    }

    /// Number of stored codes, deleted ones included.
    pub async fn len(&self) -> usize {
        self.relation.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.relation.read().await.is_empty()
    }

    /// Returns the backend this store writes through to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Tears the store down and releases backend resources.
    pub async fn close(self) {
        self.backend.close().await;
        info!(backend = self.backend.name(), "closed link store");
    }
}
