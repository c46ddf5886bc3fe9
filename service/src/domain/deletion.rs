use quire_common::{ContentId, DraftKey};

use crate::domain::drafts::{DraftStoreError, LocalDraftStore};
use crate::domain::links::EditorLocation;
use crate::domain::{CacheKey, ContentStore, EditorBackend, QueryCache, RemoteError, Surface};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// Never published, only the local snapshot was dropped
    LocalDiscarded,
    Deleted(ContentId),
    Failed(RemoteError),
    /// No draft identity yet, nothing was done
    Skipped,
}

/// Removes the content behind `key`.
///
/// A local-only draft never reaches the remote store. A published record is
/// deleted remotely first; the local side is only touched once that succeeded
/// or the record turned out to be gone already.
pub async fn delete<B: EditorBackend>(
    backend: &B,
    surface: &Surface,
    key: &DraftKey,
    location: &EditorLocation,
) -> Result<DeletionOutcome, DraftStoreError> {
    let Some(id) = key.content().content_id() else {
        backend.local_drafts().delete(key)?;
        tracing::info!(%key, "discarded local draft");
        return Ok(DeletionOutcome::LocalDiscarded);
    };

    let owner = key.owner();
    match backend.content().delete(id, owner).await {
        Ok(()) => {}
        // already gone remotely, only the local side is left to clean up
        Err(RemoteError::NotFound(_)) => {
            tracing::debug!(%key, "record was already deleted");
        }
        Err(err) => {
            tracing::warn!(%key, error = %err, "delete failed");
            surface.notifier.notify_error(&format!("Error: {err}"));
            return Ok(DeletionOutcome::Failed(err));
        }
    }

    backend
        .cache()
        .invalidate(&CacheKey::ContentDetail(owner, key.local_component()));
    backend.local_drafts().delete(key)?;

    tracing::info!(%key, content_id = %id, "deleted");
    surface.notifier.notify_success("Deleted!");
    surface.navigator.push_location(&location.listing_path());

    Ok(DeletionOutcome::Deleted(id))
}
