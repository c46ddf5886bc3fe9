use quire_common::{DraftKey, DraftSnapshot, OwnerId};

use crate::domain::drafts::{DraftStoreError, LocalDraftStore};
use file::FileDraftStore;
use memory::MemoryDraftStore;

pub mod file;
pub mod memory;

/// Draft store picked by configuration.
#[derive(Debug)]
pub enum DraftStoreAdapter {
    File(FileDraftStore),
    Memory(MemoryDraftStore),
}

impl DraftStoreAdapter {
    /// On disk under `dir`, in memory without one.
    pub fn from_dir(dir: Option<&str>) -> Result<Self, DraftStoreError> {
        match dir {
            Some(dir) => FileDraftStore::open(dir).map(Self::File),
            None => {
                tracing::warn!("no drafts_dir configured, drafts are kept in memory");
                Ok(Self::Memory(MemoryDraftStore::default()))
            }
        }
    }
}

impl LocalDraftStore for DraftStoreAdapter {
    fn put(&self, key: &DraftKey, snapshot: &DraftSnapshot) -> Result<(), DraftStoreError> {
        match self {
            Self::File(store) => store.put(key, snapshot),
            Self::Memory(store) => store.put(key, snapshot),
        }
    }

    fn get(&self, key: &DraftKey) -> Result<Option<DraftSnapshot>, DraftStoreError> {
        match self {
            Self::File(store) => store.get(key),
            Self::Memory(store) => store.get(key),
        }
    }

    fn delete(&self, key: &DraftKey) -> Result<(), DraftStoreError> {
        match self {
            Self::File(store) => store.delete(key),
            Self::Memory(store) => store.delete(key),
        }
    }

    fn entries(&self, owner: OwnerId) -> Result<Vec<(DraftKey, DraftSnapshot)>, DraftStoreError> {
        match self {
            Self::File(store) => store.entries(owner),
            Self::Memory(store) => store.entries(owner),
        }
    }
}
