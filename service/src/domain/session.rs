use chrono::{DateTime, Utc};
use quire_common::{
    ContentRef, ContentType, DraftKey, DraftSnapshot, FieldEdit, FieldSet, LookupKey, OwnerId,
    RESERVED_TAGS, RemoteRecord, Slug,
};
use thiserror::Error;

use crate::domain::deletion::{self, DeletionOutcome};
use crate::domain::drafts::{DraftStoreError, LocalDraftStore};
use crate::domain::fields::{EditorFieldStore, Subscription};
use crate::domain::identity::IdentityResolver;
use crate::domain::links::EditorLocation;
use crate::domain::publish::{
    PublishCoordinator, PublishError, PublishOutcome, PublishPhase, PublishRequest,
};
use crate::domain::slug::{default_slug, sanitize_slug};
use crate::domain::visibility::VisibilityState;
use crate::domain::{CacheKey, ContentStore, EditorBackend, QueryCache, RemoteError, Surface};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Drafts(#[from] DraftStoreError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("content {0} does not exist")]
    NotFound(String),
}

pub fn is_reserved_tag(tag: &str) -> bool {
    RESERVED_TAGS.contains(&tag)
}

/// Fields of a brand new session, pre-tagged from the location.
fn initial_fields(location: &EditorLocation) -> FieldSet {
    FieldSet {
        tags: location.tag.clone().unwrap_or_default(),
        ..FieldSet::default()
    }
}

fn fields_from_record(record: &RemoteRecord) -> FieldSet {
    let tags = record
        .tags
        .iter()
        .map(String::as_str)
        .filter(|tag| !is_reserved_tag(tag))
        .collect::<Vec<_>>()
        .join(", ");

    FieldSet {
        title: record.title.clone(),
        content: record.content.clone(),
        excerpt: record.summary.clone(),
        slug: Slug::try_new(record.slug.as_str()).ok(),
        tags,
        cover: record.cover.clone().unwrap_or_default(),
        published_at: record.published_at,
        disable_ai_summary: record.disable_ai_summary,
        published: true,
    }
}

/// One editing session: identity, fields, visibility and the publish and
/// delete flows of a single post or page.
pub struct EditorSession<B: EditorBackend> {
    backend: B,
    surface: Surface,
    location: EditorLocation,
    owner: Option<OwnerId>,
    identity: IdentityResolver,
    /// Key the current state was loaded under
    key: Option<DraftKey>,
    fields: EditorFieldStore,
    visibility: VisibilityState,
    content_type: ContentType,
    remote: Option<RemoteRecord>,
    publisher: PublishCoordinator,
    last_written: Option<DateTime<Utc>>,
}

impl<B: EditorBackend> EditorSession<B> {
    /// Opens a session at `location`. Without an owner the session only holds
    /// in-memory state until [`EditorSession::attach_owner`] is called.
    pub async fn open(
        backend: B,
        surface: Surface,
        location: EditorLocation,
        owner: Option<OwnerId>,
    ) -> Result<Self, SessionError> {
        let fields = initial_fields(&location);
        let mut session = Self {
            backend,
            surface,
            content_type: location.content_type,
            location,
            owner: None,
            identity: IdentityResolver::new(),
            key: None,
            fields: EditorFieldStore::new(fields, String::new()),
            visibility: VisibilityState::Draft,
            remote: None,
            publisher: PublishCoordinator::new(),
            last_written: None,
        };

        if let Some(owner) = owner {
            session.attach_owner(owner).await?;
        }
        Ok(session)
    }

    pub async fn attach_owner(&mut self, owner: OwnerId) -> Result<(), SessionError> {
        self.owner = Some(owner);
        let Some(resolution) =
            self.identity
                .resolve(Some(owner), &self.location, self.surface.navigator.as_ref())
        else {
            return Ok(());
        };

        if self.key.as_ref() == Some(&resolution.key) {
            return Ok(());
        }
        if resolution.minted {
            self.location.id = Some(resolution.key.content().clone());
            self.backend.cache().invalidate(&CacheKey::DraftList(owner));
        }

        // edits made before the owner was known
        let pending = (self.key.is_none()
            && *self.fields.current() != initial_fields(&self.location))
        .then(|| self.fields.current().clone());

        self.load(resolution.key).await?;

        if let Some(fields) = pending {
            // nothing stored under the key yet, keep the in-memory edits
            if self.remote.is_none() && self.last_written.is_none() {
                let suffix = self
                    .key
                    .as_ref()
                    .map(|key| key.content().suffix())
                    .unwrap_or_default();
                self.fields
                    .set_default_slug(default_slug(&fields.title, &suffix));
                self.write_through(&fields);
                self.fields.commit(fields);
            }
        }
        Ok(())
    }

    /// Loads remote and local state for `key`. A surviving local snapshot
    /// wins over the remote record.
    async fn load(&mut self, key: DraftKey) -> Result<(), SessionError> {
        let remote = match key.content().content_id() {
            Some(id) => {
                self.backend
                    .content()
                    .lookup(key.owner(), &LookupKey::Id(id))
                    .await?
            }
            None => None,
        };
        let snapshot = self.backend.drafts().get(&key)?;
        self.last_written = snapshot.as_ref().map(|snapshot| snapshot.written_at);

        let mut visibility = VisibilityState::from_remote(remote.as_ref());
        let (fields, content_type) = match (&remote, snapshot) {
            (_, Some(snapshot)) => {
                // a surviving snapshot is an unsubmitted edit
                visibility.promote_on_edit();
                (snapshot.fields, snapshot.content_type)
            }
            (Some(record), None) => (fields_from_record(record), record.content_type),
            (None, None) if key.content().is_local() => {
                (initial_fields(&self.location), self.location.content_type)
            }
            (None, None) => return Err(SessionError::NotFound(key.local_component())),
        };

        tracing::debug!(%key, ?visibility, "loaded session");
        self.fields
            .set_default_slug(default_slug(&fields.title, &key.content().suffix()));
        self.fields.commit(fields);
        self.visibility = visibility;
        self.content_type = content_type;
        self.remote = remote;
        self.key = Some(key);
        Ok(())
    }

    /// Applies one field edit and writes the result through to the local
    /// draft store.
    pub fn update(&mut self, edit: FieldEdit) -> &FieldSet {
        let edit = match edit {
            FieldEdit::Slug(raw) => {
                let sanitized = sanitize_slug(&raw);
                if let Some(notice) = sanitized.notice {
                    self.surface.notifier.notify_error(notice);
                }
                FieldEdit::Slug(sanitized.value)
            }
            other => other,
        };

        if let FieldEdit::Title(title) = &edit {
            let suffix = self
                .key
                .as_ref()
                .map(|key| key.content().suffix())
                .unwrap_or_default();
            self.fields.set_default_slug(default_slug(title, &suffix));
        }

        if self.visibility.promote_on_edit() {
            tracing::debug!(key = ?self.key, "published content modified");
        }

        let field = edit.field();
        let next = self.fields.stage(edit);
        tracing::trace!(key = ?self.key, %field, "field edited");
        self.write_through(&next);
        self.fields.commit(next);
        self.fields.current()
    }

    /// Stores `fields` under the current key. Failures are logged only.
    fn write_through(&mut self, fields: &FieldSet) {
        let Some(key) = &self.key else {
            return;
        };
        let written_at = next_write_time(&mut self.last_written);
        let snapshot = DraftSnapshot::new(fields.clone(), self.content_type, written_at);
        if let Err(err) = self.backend.local_drafts().put(key, &snapshot) {
            tracing::warn!(%key, error = %err, "failed to write draft");
        }
    }

    pub async fn publish(&mut self) -> Result<PublishOutcome, SessionError> {
        let Some(key) = self.key.clone() else {
            return Ok(PublishOutcome::Skipped);
        };
        let request = PublishRequest {
            key,
            location: self.location.clone(),
            fields: self.fields.current().clone(),
            default_slug: self.fields.default_slug().to_string(),
            visibility: self.visibility,
            content_type: self.content_type,
        };

        let outcome = self
            .publisher
            .publish(&self.backend, &self.surface, request)
            .await?;

        if let PublishOutcome::Published(receipt) = &outcome {
            self.last_written = None;
            self.location.id = Some(ContentRef::Remote(receipt.content_id));
            let owner = self.owner;
            let rekeyed = self
                .identity
                .resolve(owner, &self.location, self.surface.navigator.as_ref())
                .map(|resolution| resolution.key);

            match rekeyed {
                Some(key) => {
                    if let Err(err) = self.load(key.clone()).await {
                        tracing::warn!(%key, error = %err, "failed to reload published content");
                        self.key = Some(key);
                    }
                }
                None => self.key = None,
            }
            self.visibility = VisibilityState::Published;
        }

        Ok(outcome)
    }

    pub async fn delete_session(&mut self) -> Result<DeletionOutcome, SessionError> {
        let Some(key) = self.key.clone() else {
            return Ok(DeletionOutcome::Skipped);
        };
        let outcome = deletion::delete(&self.backend, &self.surface, &key, &self.location).await?;
        if !matches!(outcome, DeletionOutcome::Failed(_)) {
            self.last_written = None;
        }
        Ok(outcome)
    }

    /// Drops the local snapshot and reloads the remote state.
    pub async fn discard_local_changes(&mut self) -> Result<(), SessionError> {
        let Some(key) = self.key.take() else {
            return Ok(());
        };
        if let Err(err) = self.backend.local_drafts().delete(&key) {
            self.key = Some(key);
            return Err(err.into());
        }
        self.backend
            .cache()
            .invalidate(&CacheKey::ContentDetail(key.owner(), key.local_component()));

        let reloaded = self.load(key.clone()).await;
        if reloaded.is_err() {
            self.key = Some(key);
        }
        reloaded
    }

    pub fn preview_url(&self) -> Option<String> {
        self.key.as_ref().map(|key| self.location.preview_path(key))
    }

    /// Tags the owner already used, for autocompletion.
    pub async fn tag_suggestions(&self) -> Result<Vec<String>, SessionError> {
        let Some(owner) = self.owner else {
            return Ok(Vec::new());
        };
        let tags = self.backend.content().tags_for_owner(owner).await?;
        Ok(tags.into_iter().filter(|tag| !is_reserved_tag(tag)).collect())
    }

    pub fn subscribe<F>(&mut self, observer: F) -> Subscription
    where
        F: Fn(&FieldSet) + Send + Sync + 'static,
    {
        self.fields.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.fields.unsubscribe(subscription)
    }

    pub fn fields(&self) -> &FieldSet {
        self.fields.current()
    }

    pub fn default_slug(&self) -> &str {
        self.fields.default_slug()
    }

    pub fn effective_slug(&self) -> &str {
        self.fields.effective_slug()
    }

    pub fn visibility(&self) -> VisibilityState {
        self.visibility
    }

    pub fn key(&self) -> Option<&DraftKey> {
        self.key.as_ref()
    }

    pub fn location(&self) -> &EditorLocation {
        &self.location
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn remote(&self) -> Option<&RemoteRecord> {
        self.remote.as_ref()
    }

    pub fn publish_phase(&self) -> PublishPhase {
        self.publisher.phase()
    }
}

/// Current time, never earlier than the previous write.
fn next_write_time(last: &mut Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    let at = match *last {
        Some(previous) if previous > now => previous,
        _ => now,
    };
    *last = Some(at);
    at
}
