use chrono::{DateTime, Utc};
use quire_common::{ContentRef, ContentType, DraftKey, DraftSnapshot, OwnerId};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{CacheKey, QueryCache};

/// Durable `DraftKey -> DraftSnapshot` store.
///
/// Writes are synchronous and last-write-wins; snapshots live until deleted.
pub trait LocalDraftStore: Send + Sync + 'static {
    fn put(&self, key: &DraftKey, snapshot: &DraftSnapshot) -> Result<(), DraftStoreError>;

    fn get(&self, key: &DraftKey) -> Result<Option<DraftSnapshot>, DraftStoreError>;

    /// Idempotent, deleting a missing key is not an error
    fn delete(&self, key: &DraftKey) -> Result<(), DraftStoreError>;

    /// All drafts of one owner
    fn entries(&self, owner: OwnerId) -> Result<Vec<(DraftKey, DraftSnapshot)>, DraftStoreError>;
}

#[derive(Debug, Error)]
pub enum DraftStoreError {
    #[error("failed to access draft storage: {0}")]
    Io(#[from] std::io::Error),
    #[error("draft {key} is corrupted: {source}")]
    Corrupted {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Draft store paired with the query cache: every `put`/`delete`
/// invalidates the owner's draft list.
pub struct InvalidatingDrafts<'a, S: LocalDraftStore, Q: QueryCache> {
    store: &'a S,
    cache: &'a Q,
}

impl<'a, S: LocalDraftStore, Q: QueryCache> InvalidatingDrafts<'a, S, Q> {
    pub fn new(store: &'a S, cache: &'a Q) -> Self {
        Self { store, cache }
    }

    pub fn put(&self, key: &DraftKey, snapshot: &DraftSnapshot) -> Result<(), DraftStoreError> {
        self.store.put(key, snapshot)?;
        self.cache.invalidate(&CacheKey::DraftList(key.owner()));
        Ok(())
    }

    pub fn get(&self, key: &DraftKey) -> Result<Option<DraftSnapshot>, DraftStoreError> {
        self.store.get(key)
    }

    pub fn delete(&self, key: &DraftKey) -> Result<(), DraftStoreError> {
        self.store.delete(key)?;
        self.cache.invalidate(&CacheKey::DraftList(key.owner()));
        Ok(())
    }
}

/// One row of an owner's draft list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSummary {
    pub key: DraftKey,
    /// Effective identifier to reopen the draft with
    pub id: ContentRef,
    pub title: String,
    pub excerpt: String,
    pub content_type: ContentType,
    pub written_at: DateTime<Utc>,
}

/// Drafts of `owner`, most recently written first.
pub fn draft_list<S: LocalDraftStore>(
    store: &S,
    owner: OwnerId,
) -> Result<Vec<DraftSummary>, DraftStoreError> {
    let mut drafts: Vec<_> = store
        .entries(owner)?
        .into_iter()
        .map(|(key, snapshot)| DraftSummary {
            id: key.content().clone(),
            key,
            title: snapshot.fields.title,
            excerpt: snapshot.fields.excerpt,
            content_type: snapshot.content_type,
            written_at: snapshot.written_at,
        })
        .collect();
    drafts.sort_by(|a, b| b.written_at.cmp(&a.written_at));
    Ok(drafts)
}
