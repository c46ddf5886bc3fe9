use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use quire_common::{ContentId, LookupKey, OwnerId, RemoteRecord, SiteInfo, Submission, WriteReceipt};
use thiserror::Error;

use crate::domain::drafts::{InvalidatingDrafts, LocalDraftStore};
use crate::domain::links::{LinkSettings, PublishedLinks};

pub mod deletion;
pub mod drafts;
pub mod fields;
pub mod identity;
pub mod links;
pub mod publish;
pub mod session;
pub mod slug;
pub mod visibility;

/// Authoritative store of published content.
///
/// May be slow: every write ends up in a ledger transaction.
pub trait ContentStore: Send + Sync + 'static {
    /// Find a record of `owner` by content id or by slug
    fn lookup(
        &self,
        owner: OwnerId,
        key: &LookupKey,
    ) -> impl Future<Output = Result<Option<RemoteRecord>, RemoteError>> + Send;

    /// Create a new record, the store assigns its content id
    fn create(
        &self,
        submission: Submission,
    ) -> impl Future<Output = Result<WriteReceipt, RemoteError>> + Send;

    /// Replace the published values of an existing record
    fn update(
        &self,
        id: ContentId,
        submission: Submission,
    ) -> impl Future<Output = Result<WriteReceipt, RemoteError>> + Send;

    /// Delete a record
    fn delete(
        &self,
        id: ContentId,
        owner: OwnerId,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Distinct tags used on everything the owner published
    fn tags_for_owner(
        &self,
        owner: OwnerId,
    ) -> impl Future<Output = Result<BTreeSet<String>, RemoteError>> + Send;
}

/// Owner/site metadata lookup.
pub trait SiteDirectory: Send + Sync + 'static {
    fn site(
        &self,
        owner: OwnerId,
    ) -> impl Future<Output = Result<Option<SiteInfo>, RemoteError>> + Send;

    fn site_by_handle(
        &self,
        handle: &str,
    ) -> impl Future<Output = Result<Option<SiteInfo>, RemoteError>> + Send;
}

/// Location changes requested by the engine.
pub trait Navigator: Send + Sync {
    /// Replace the current location without creating a history entry
    fn replace_location(&self, path: &str);
    fn push_location(&self, path: &str);
}

pub trait Notifier: Send + Sync {
    fn notify_error(&self, message: &str);
    fn notify_success(&self, message: &str);
}

/// Fire-and-forget presentation of a successful publish.
pub trait Celebration: Send + Sync {
    fn celebrate(&self, links: &PublishedLinks);
}

/// Views that must be re-fetched after local or remote writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// List of drafts of one owner
    DraftList(OwnerId),
    /// Detail of one content, keyed by its effective identifier
    ContentDetail(OwnerId, String),
}

pub trait QueryCache: Send + Sync {
    fn invalidate(&self, key: &CacheKey);
}

/// Everything an editing session needs from the outside world.
pub trait EditorBackend: Clone + Send + Sync + 'static {
    type Content: ContentStore;
    type Drafts: LocalDraftStore;
    type Sites: SiteDirectory;
    type Cache: QueryCache;

    fn content(&self) -> &Self::Content;
    fn drafts(&self) -> &Self::Drafts;
    fn sites(&self) -> &Self::Sites;
    fn cache(&self) -> &Self::Cache;
    fn links(&self) -> &LinkSettings;

    /// Draft store whose writes invalidate the owner's draft list
    fn local_drafts(&self) -> InvalidatingDrafts<'_, Self::Drafts, Self::Cache> {
        InvalidatingDrafts::new(self.drafts(), self.cache())
    }
}

/// User-facing outputs of one session.
#[derive(Clone)]
pub struct Surface {
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    pub celebration: Arc<dyn Celebration>,
}

impl Surface {
    pub fn new(
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        celebration: Arc<dyn Celebration>,
    ) -> Self {
        Self {
            navigator,
            notifier,
            celebration,
        }
    }

    /// One presenter serving all three outputs.
    pub fn shared<P>(presenter: Arc<P>) -> Self
    where
        P: Navigator + Notifier + Celebration + 'static,
    {
        Self {
            navigator: presenter.clone(),
            notifier: presenter.clone(),
            celebration: presenter,
        }
    }
}

/// Failure of a remote call. Transient and permanent failures are not told apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Rejected(String),
    #[error("remote store is unavailable: {0}")]
    Unavailable(String),
}
