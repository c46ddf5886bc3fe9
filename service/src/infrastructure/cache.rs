use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use quire_common::{OwnerId, RemoteRecord};

use crate::domain::drafts::DraftSummary;
use crate::domain::{CacheKey, QueryCache};

#[derive(Debug, Default)]
struct Entries {
    draft_lists: HashMap<OwnerId, Arc<Vec<DraftSummary>>>,
    details: HashMap<(OwnerId, String), Arc<Option<RemoteRecord>>>,
    /// Bumped on every invalidation, a load started under an older value is
    /// not stored
    generations: HashMap<CacheKey, u64>,
}

impl Entries {
    fn generation(&self, key: &CacheKey) -> u64 {
        self.generations.get(key).copied().unwrap_or_default()
    }
}

/// Memoized read views, dropped whenever the engine invalidates them.
#[derive(Debug, Default)]
pub struct QueryCacheAdapter {
    entries: RwLock<Entries>,
}

impl QueryCacheAdapter {
    fn entries(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn draft_list<E>(
        &self,
        owner: OwnerId,
        load: impl FnOnce() -> Result<Vec<DraftSummary>, E>,
    ) -> Result<Arc<Vec<DraftSummary>>, E> {
        let cache_key = CacheKey::DraftList(owner);
        let generation = {
            let entries = self.entries();
            if let Some(cached) = entries.draft_lists.get(&owner) {
                return Ok(cached.clone());
            }
            entries.generation(&cache_key)
        };

        let loaded = Arc::new(load()?);
        let mut entries = self.entries();
        if entries.generation(&cache_key) == generation {
            entries.draft_lists.insert(owner, loaded.clone());
        }
        Ok(loaded)
    }

    /// Detail of the content named `id` (its effective identifier).
    pub async fn content_detail<E, F>(
        &self,
        owner: OwnerId,
        id: &str,
        load: F,
    ) -> Result<Arc<Option<RemoteRecord>>, E>
    where
        F: Future<Output = Result<Option<RemoteRecord>, E>>,
    {
        let key = (owner, id.to_string());
        let cache_key = CacheKey::ContentDetail(owner, id.to_string());
        let generation = {
            let entries = self.entries();
            if let Some(cached) = entries.details.get(&key) {
                return Ok(cached.clone());
            }
            entries.generation(&cache_key)
        };

        let loaded = Arc::new(load.await?);
        let mut entries = self.entries();
        if entries.generation(&cache_key) == generation {
            entries.details.insert(key, loaded.clone());
        } else {
            tracing::debug!(?cache_key, "view invalidated while loading, not cached");
        }
        Ok(loaded)
    }
}

impl QueryCache for QueryCacheAdapter {
    fn invalidate(&self, key: &CacheKey) {
        tracing::debug!(?key, "invalidating cached view");
        let mut entries = self.entries();
        match key {
            CacheKey::DraftList(owner) => {
                entries.draft_lists.remove(owner);
            }
            CacheKey::ContentDetail(owner, id) => {
                entries.details.remove(&(*owner, id.clone()));
            }
        }
        *entries.generations.entry(key.clone()).or_default() += 1;
    }
}
