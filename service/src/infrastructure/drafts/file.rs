use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use quire_common::{DraftKey, DraftSnapshot, OwnerId};

use crate::domain::drafts::{DraftStoreError, LocalDraftStore};

const SNAPSHOT_EXTENSION: &str = "json";

/// One JSON file per draft under a directory.
///
/// Writes go to a temporary file that is synced and renamed over the
/// previous snapshot, so a crash leaves either the old or the new version.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, DraftStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::info!(dir = %dir.display(), "using on-disk draft store");
        Ok(Self { dir })
    }

    fn path_of(&self, key: &DraftKey) -> PathBuf {
        self.dir.join(format!("{key}.{SNAPSHOT_EXTENSION}"))
    }

    fn read(&self, key: &DraftKey, path: &Path) -> Result<Option<DraftSnapshot>, DraftStoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| DraftStoreError::Corrupted {
                key: key.to_string(),
                source,
            })
    }
}

impl LocalDraftStore for FileDraftStore {
    fn put(&self, key: &DraftKey, snapshot: &DraftSnapshot) -> Result<(), DraftStoreError> {
        let path = self.path_of(key);
        let staging = path.with_extension(format!("{SNAPSHOT_EXTENSION}.tmp"));
        let bytes = serde_json::to_vec(snapshot).map_err(std::io::Error::other)?;

        let mut file = fs::File::create(&staging)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn get(&self, key: &DraftKey) -> Result<Option<DraftSnapshot>, DraftStoreError> {
        self.read(key, &self.path_of(key))
    }

    fn delete(&self, key: &DraftKey) -> Result<(), DraftStoreError> {
        match fs::remove_file(self.path_of(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    fn entries(&self, owner: OwnerId) -> Result<Vec<(DraftKey, DraftSnapshot)>, DraftStoreError> {
        let mut drafts = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let Some(key) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<DraftKey>().ok())
            else {
                continue;
            };
            if !key.belongs_to(owner) {
                continue;
            }
            match self.read(&key, &path) {
                Ok(Some(snapshot)) => drafts.push((key, snapshot)),
                Ok(None) => {}
                Err(err) => tracing::warn!(%key, error = %err, "skipping unreadable draft"),
            }
        }
        drafts.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(drafts)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use quire_common::test_utils::fields_titled;
    use quire_common::{ContentId, ContentRef, ContentType, LocalToken};

    use super::*;

    fn snapshot(title: &str) -> DraftSnapshot {
        DraftSnapshot::new(fields_titled(title), ContentType::Post, Utc::now())
    }

    fn local_key(owner: i64, token: &str) -> DraftKey {
        DraftKey::new(
            OwnerId(owner),
            ContentRef::Local(LocalToken::parse(token).unwrap()),
        )
    }

    #[test]
    fn test_snapshots_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let key = local_key(42, "abc123");
        FileDraftStore::open(dir.path())
            .unwrap()
            .put(&key, &snapshot("Hello"))
            .unwrap();

        let reopened = FileDraftStore::open(dir.path()).unwrap();
        let stored = reopened.get(&key).unwrap().unwrap();

        assert_eq!(stored.fields.title, "Hello");
        assert!(dir.path().join("draft-42-!local-abc123.json").exists());
    }

    #[test]
    fn test_put_overwrites_whole_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::open(dir.path()).unwrap();
        let key = local_key(42, "abc123");

        store.put(&key, &snapshot("First")).unwrap();
        store.put(&key, &snapshot("Second")).unwrap();

        assert_eq!(store.get(&key).unwrap().unwrap().fields.title, "Second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::open(dir.path()).unwrap();
        let key = local_key(42, "abc123");
        store.put(&key, &snapshot("Hello")).unwrap();

        store.delete(&key).unwrap();
        store.delete(&key).unwrap();

        assert_eq!(store.get(&key).unwrap(), None);
    }

    #[test]
    fn test_entries_are_scoped_to_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::open(dir.path()).unwrap();
        let published = DraftKey::new(OwnerId(42), ContentRef::Remote(ContentId(7)));
        store.put(&local_key(42, "a"), &snapshot("A")).unwrap();
        store.put(&published, &snapshot("B")).unwrap();
        store.put(&local_key(1, "c"), &snapshot("C")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let entries = store.entries(OwnerId(42)).unwrap();

        let titles: Vec<_> = entries
            .iter()
            .map(|(_, snapshot)| snapshot.fields.title.as_str())
            .collect();
        assert_eq!(entries.len(), 2);
        assert!(titles.contains(&"A") && titles.contains(&"B"));
    }

    #[test]
    fn test_corrupted_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDraftStore::open(dir.path()).unwrap();
        let key = local_key(42, "abc123");
        fs::write(dir.path().join(format!("{key}.json")), "{not json").unwrap();

        assert!(matches!(
            store.get(&key),
            Err(DraftStoreError::Corrupted { .. })
        ));
    }
}
