use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use quire_common::{DraftKey, DraftSnapshot, OwnerId};

use crate::domain::drafts::{DraftStoreError, LocalDraftStore};

/// Draft store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: RwLock<BTreeMap<DraftKey, DraftSnapshot>>,
}

impl MemoryDraftStore {
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<DraftKey, DraftSnapshot>> {
        self.drafts.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<DraftKey, DraftSnapshot>> {
        self.drafts.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalDraftStore for MemoryDraftStore {
    fn put(&self, key: &DraftKey, snapshot: &DraftSnapshot) -> Result<(), DraftStoreError> {
        self.write().insert(key.clone(), snapshot.clone());
        Ok(())
    }

    fn get(&self, key: &DraftKey) -> Result<Option<DraftSnapshot>, DraftStoreError> {
        Ok(self.read().get(key).cloned())
    }

    fn delete(&self, key: &DraftKey) -> Result<(), DraftStoreError> {
        self.write().remove(key);
        Ok(())
    }

    fn entries(&self, owner: OwnerId) -> Result<Vec<(DraftKey, DraftSnapshot)>, DraftStoreError> {
        Ok(self
            .read()
            .iter()
            .filter(|(key, _)| key.belongs_to(owner))
            .map(|(key, snapshot)| (key.clone(), snapshot.clone()))
            .collect())
    }
}
