use itertools::Itertools;
use quire_common::{
    ContentId, ContentRef, ContentType, DraftKey, FieldSet, Slug, Submission, WriteReceipt,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::drafts::LocalDraftStore;
use crate::domain::links::{EditorLocation, PublishedLinks};
use crate::domain::slug::{SlugCheck, validate_slug};
use crate::domain::visibility::VisibilityState;
use crate::domain::{
    CacheKey, ContentStore, EditorBackend, QueryCache, RemoteError, SiteDirectory, Surface,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl PublishPhase {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Validating | Self::Submitting)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("a publish is already in progress")]
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    pub content_id: ContentId,
    /// The record did not exist before this publish
    pub created: bool,
    pub links: PublishedLinks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published(PublishReceipt),
    /// Slug validation failed, nothing was written
    Rejected(String),
    /// The remote store failed, the local draft is kept
    Failed(RemoteError),
    /// No draft identity yet, nothing was done
    Skipped,
}

/// Everything one publish needs from the session.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub key: DraftKey,
    pub location: EditorLocation,
    pub fields: FieldSet,
    pub default_slug: String,
    pub visibility: VisibilityState,
    pub content_type: ContentType,
}

impl PublishRequest {
    fn candidate_slug(&self) -> &str {
        match &self.fields.slug {
            Some(slug) => slug.as_ref(),
            None => &self.default_slug,
        }
    }

    fn submission(&self, slug: Slug) -> Submission {
        let fields = &self.fields;
        Submission {
            owner: self.key.owner(),
            content_type: self.content_type,
            title: fields.title.clone(),
            content: fields.content.clone(),
            excerpt: fields.excerpt.clone(),
            slug,
            tags: dedupe_tags(&fields.tags),
            cover: Some(fields.cover.clone()).filter(|cover| !cover.is_empty()),
            published_at: fields.published_at,
            disable_ai_summary: fields.disable_ai_summary,
        }
    }

    /// `Some(id)` when the publish updates an existing record.
    fn update_target(&self) -> Option<ContentId> {
        match self.visibility {
            VisibilityState::Draft => None,
            VisibilityState::Published | VisibilityState::Modified => {
                self.key.content().content_id()
            }
        }
    }
}

/// Splits the comma-joined tag list, dropping blanks and repeats.
pub fn dedupe_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .unique()
        .map(str::to_string)
        .collect()
}

/// Resets the phase to `Idle` however the publish ends, including when its
/// future is dropped half-way.
struct PhaseGuard<'a> {
    phase: &'a mut PublishPhase,
}

impl<'a> PhaseGuard<'a> {
    fn enter(phase: &'a mut PublishPhase) -> Self {
        *phase = PublishPhase::Validating;
        Self { phase }
    }

    fn set(&mut self, next: PublishPhase) {
        tracing::debug!(from = ?*self.phase, to = ?next, "publish phase");
        *self.phase = next;
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        *self.phase = PublishPhase::Idle;
    }
}

/// Drives one publish at a time from slug validation to reconciliation.
#[derive(Debug, Default)]
pub struct PublishCoordinator {
    phase: PublishPhase,
}

impl PublishCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PublishPhase {
        self.phase
    }

    pub async fn publish<B: EditorBackend>(
        &mut self,
        backend: &B,
        surface: &Surface,
        request: PublishRequest,
    ) -> Result<PublishOutcome, PublishError> {
        if self.phase.is_in_flight() {
            return Err(PublishError::InFlight);
        }
        let mut phase = PhaseGuard::enter(&mut self.phase);

        let owner = request.key.owner();
        let editing = request.key.content().content_id();
        let check = validate_slug(backend.content(), request.candidate_slug(), owner, editing).await;
        let slug = match check {
            Ok(SlugCheck::Available(slug)) => slug,
            Ok(SlugCheck::Rejected(message)) => {
                surface.notifier.notify_error(&message);
                return Ok(PublishOutcome::Rejected(message));
            }
            Err(err) => {
                phase.set(PublishPhase::Failed);
                return Ok(report_failure(surface, &request.key, err));
            }
        };

        phase.set(PublishPhase::Submitting);
        let submission = request.submission(slug.clone());
        let target = request.update_target();
        let written = match target {
            Some(id) => backend.content().update(id, submission).await,
            None => backend.content().create(submission).await,
        };
        let receipt = match written {
            Ok(receipt) => receipt,
            Err(err) => {
                phase.set(PublishPhase::Failed);
                return Ok(report_failure(surface, &request.key, err));
            }
        };

        phase.set(PublishPhase::Succeeded);
        let created = target.is_none();
        let links = reconcile(backend, surface, &request, &slug, &receipt, created).await;
        tracing::info!(
            key = %request.key,
            content_id = %receipt.content_id,
            created,
            "published"
        );

        Ok(PublishOutcome::Published(PublishReceipt {
            content_id: receipt.content_id,
            created,
            links,
        }))
    }
}

fn report_failure(surface: &Surface, key: &DraftKey, err: RemoteError) -> PublishOutcome {
    tracing::warn!(%key, error = %err, "publish failed");
    surface.notifier.notify_error(&format!("Error: {err}"));
    PublishOutcome::Failed(err)
}

async fn reconcile<B: EditorBackend>(
    backend: &B,
    surface: &Surface,
    request: &PublishRequest,
    slug: &Slug,
    receipt: &WriteReceipt,
    created: bool,
) -> PublishedLinks {
    let key = &request.key;
    let owner = key.owner();

    if let Err(err) = backend.drafts().delete(key) {
        tracing::warn!(%key, error = %err, "failed to drop published draft");
    }
    let cache = backend.cache();
    cache.invalidate(&CacheKey::DraftList(owner));
    cache.invalidate(&CacheKey::ContentDetail(owner, key.local_component()));

    if created {
        let published = ContentRef::Remote(receipt.content_id);
        cache.invalidate(&CacheKey::ContentDetail(owner, published.to_string()));
        let path = request.location.with_id(published).path();
        surface.navigator.replace_location(&path);
    }

    let site = backend.sites().site(owner).await.unwrap_or_else(|err| {
        tracing::warn!(%owner, error = %err, "site lookup failed after publish");
        None
    });
    let links = PublishedLinks::build(
        backend.links(),
        site.as_ref(),
        &request.location.handle,
        slug.as_ref(),
        &request.fields.title,
        receipt.transaction_hash.as_deref(),
    );
    surface.celebration.celebrate(&links);
    links
}

#[cfg(test)]
mod tests {
    use quire_common::test_utils::{fields_titled, published_record};
    use quire_common::{ContentId, Cover, LocalToken, OwnerId};

    use super::*;
    use crate::infrastructure::events::SessionEvent;
    use crate::test_utils::{StoreCall, TestBackend, snapshot_of, test_surface};

    fn local_request(fields: FieldSet) -> PublishRequest {
        let key = DraftKey::new(
            OwnerId(42),
            ContentRef::Local(LocalToken::parse("abc").unwrap()),
        );
        let location = EditorLocation::new("alice", ContentType::Post).with_id(key.content().clone());
        PublishRequest {
            key,
            location,
            fields,
            default_slug: "hello".to_string(),
            visibility: VisibilityState::Draft,
            content_type: ContentType::Post,
        }
    }

    fn remote_request(id: i64, fields: FieldSet) -> PublishRequest {
        let key = DraftKey::new(OwnerId(42), ContentRef::Remote(ContentId(id)));
        let location = EditorLocation::new("alice", ContentType::Post).with_id(key.content().clone());
        PublishRequest {
            key,
            location,
            fields,
            default_slug: "ignored".to_string(),
            visibility: VisibilityState::Modified,
            content_type: ContentType::Post,
        }
    }

    #[test]
    fn test_dedupe_tags() {
        assert_eq!(dedupe_tags("rust, web,rust,, web "), vec!["rust", "web"]);
        assert!(dedupe_tags("").is_empty());
    }

    #[tokio::test]
    async fn test_first_publish_creates_and_reconciles() {
        let backend = TestBackend::default();
        let (surface, events) = test_surface();
        let mut request = local_request(fields_titled("Hello"));
        request.fields.tags = "a, b, a".to_string();
        backend.drafts.put(&request.key, &snapshot_of(&request.fields)).unwrap();

        let mut coordinator = PublishCoordinator::new();
        let outcome = coordinator.publish(&backend, &surface, request.clone()).await.unwrap();

        let receipt = match outcome {
            PublishOutcome::Published(receipt) => receipt,
            other => panic!("expected a publish, got {other:?}"),
        };
        assert!(receipt.created);
        assert_eq!(coordinator.phase(), PublishPhase::Idle);

        let writes = backend.content.writes();
        assert_eq!(writes.len(), 1);
        let StoreCall::Create(submission) = &writes[0] else {
            panic!("expected a create, got {:?}", writes[0]);
        };
        assert_eq!(submission.slug.as_ref(), "hello");
        assert_eq!(submission.tags, vec!["a", "b"]);
        assert_eq!(submission.cover, None);

        assert_eq!(backend.drafts.get(&request.key).unwrap(), None);
        let invalidated = backend.cache.invalidated();
        assert!(invalidated.contains(&CacheKey::DraftList(OwnerId(42))));
        assert!(invalidated.contains(&CacheKey::ContentDetail(
            OwnerId(42),
            "!local-abc".to_string()
        )));

        let id = receipt.content_id;
        assert_eq!(
            events.drain(),
            vec![
                SessionEvent::Navigate {
                    path: format!("/dashboard/alice/editor?id={id}&type=post"),
                    replace: true,
                },
                SessionEvent::Celebrate {
                    links: receipt.links.clone(),
                },
            ]
        );
        assert_eq!(receipt.links.post_url, "https://alice.quire.page/hello");
        assert_eq!(
            receipt.links.transaction_url,
            Some(format!("https://scan.quire.page/tx/0xtx{id}"))
        );
    }

    #[tokio::test]
    async fn test_republish_updates_without_navigation() {
        let backend = TestBackend::with_records(vec![published_record(42, 7, "hello")]);
        let (surface, events) = test_surface();
        let mut fields = fields_titled("Hello again");
        fields.slug = Some(quire_common::test_utils::slug("hello"));
        fields.cover = Cover::new("ipfs://new", "image/webp");

        let mut coordinator = PublishCoordinator::new();
        let outcome = coordinator
            .publish(&backend, &surface, remote_request(7, fields))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            PublishOutcome::Published(PublishReceipt { created: false, .. })
        ));
        let writes = backend.content.writes();
        assert!(matches!(
            &writes[..],
            [StoreCall::Update(ContentId(7), submission)]
                if submission.cover == Some(Cover::new("ipfs://new", "image/webp"))
        ));
        let events = events.drain();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SessionEvent::Celebrate { .. }));
    }

    #[tokio::test]
    async fn test_slug_collision_aborts_without_write() {
        let backend = TestBackend::with_records(vec![published_record(42, 7, "hello")]);
        let (surface, events) = test_surface();
        let request = local_request(fields_titled("Hello"));
        backend.drafts.put(&request.key, &snapshot_of(&request.fields)).unwrap();

        let mut coordinator = PublishCoordinator::new();
        let outcome = coordinator.publish(&backend, &surface, request.clone()).await.unwrap();

        assert!(matches!(outcome, PublishOutcome::Rejected(_)));
        assert!(backend.content.writes().is_empty());
        assert!(backend.drafts.get(&request.key).unwrap().is_some());
        let events = events.drain();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SessionEvent::Error { .. }));
        assert_eq!(coordinator.phase(), PublishPhase::Idle);
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_local_draft() {
        let backend = TestBackend::default();
        backend
            .content
            .fail_writes(RemoteError::Unavailable("ledger timeout".to_string()));
        let (surface, events) = test_surface();
        let request = local_request(fields_titled("Hello"));
        backend.drafts.put(&request.key, &snapshot_of(&request.fields)).unwrap();

        let mut coordinator = PublishCoordinator::new();
        let outcome = coordinator.publish(&backend, &surface, request.clone()).await.unwrap();

        assert!(matches!(outcome, PublishOutcome::Failed(_)));
        assert!(backend.drafts.get(&request.key).unwrap().is_some());
        assert!(backend.cache.invalidated().is_empty());
        assert_eq!(
            events.drain(),
            vec![SessionEvent::Error {
                message: "Error: remote store is unavailable: ledger timeout".to_string()
            }]
        );
        assert_eq!(coordinator.phase(), PublishPhase::Idle);
    }

    #[tokio::test]
    async fn test_second_publish_while_in_flight_is_rejected() {
        let backend = TestBackend::default();
        let (surface, _events) = test_surface();
        let mut coordinator = PublishCoordinator {
            phase: PublishPhase::Submitting,
        };

        let result = coordinator
            .publish(&backend, &surface, local_request(fields_titled("Hello")))
            .await;

        assert_eq!(result, Err(PublishError::InFlight));
        assert!(backend.content.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_publish_returns_to_idle() {
        let backend = TestBackend::default();
        let (surface, _events) = test_surface();
        let mut coordinator = PublishCoordinator::new();

        {
            let publish = coordinator.publish(&backend, &surface, local_request(fields_titled("Hi")));
            let mut publish = std::pin::pin!(publish);
            let _ = futures::poll!(publish.as_mut());
        }

        assert_eq!(coordinator.phase(), PublishPhase::Idle);
    }
}
