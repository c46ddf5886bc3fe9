use std::sync::Arc;

use quire_common::database::Database;

use crate::domain::EditorBackend;
use crate::domain::links::LinkSettings;
use crate::infrastructure::cache::QueryCacheAdapter;
use crate::infrastructure::drafts::DraftStoreAdapter;
use crate::infrastructure::persistence::{PostgresContentStore, PostgresSiteDirectory};
use crate::infrastructure::sessions::SessionRegistry;

pub mod cache;
pub mod drafts;
pub mod events;
pub mod http;
pub mod persistence;
pub mod sessions;
pub mod settings;

/// Adapters the editing engine runs on in the service.
#[derive(Clone, Debug)]
pub struct ServiceBackend {
    content: PostgresContentStore,
    drafts: Arc<DraftStoreAdapter>,
    sites: PostgresSiteDirectory,
    cache: Arc<QueryCacheAdapter>,
    links: Arc<LinkSettings>,
}

impl ServiceBackend {
    pub fn new(database: &'static Database, drafts: DraftStoreAdapter, links: LinkSettings) -> Self {
        Self {
            content: PostgresContentStore::new(database),
            drafts: Arc::new(drafts),
            sites: PostgresSiteDirectory::new(database),
            cache: Arc::default(),
            links: Arc::new(links),
        }
    }
}

impl EditorBackend for ServiceBackend {
    type Content = PostgresContentStore;
    type Drafts = DraftStoreAdapter;
    type Sites = PostgresSiteDirectory;
    type Cache = QueryCacheAdapter;

    fn content(&self) -> &Self::Content {
        &self.content
    }

    fn drafts(&self) -> &Self::Drafts {
        &self.drafts
    }

    fn sites(&self) -> &Self::Sites {
        &self.sites
    }

    fn cache(&self) -> &Self::Cache {
        &self.cache
    }

    fn links(&self) -> &LinkSettings {
        &self.links
    }
}

/// State shared by all HTTP handlers.
pub trait AppState: Clone + Send + Sync + 'static {
    type B: EditorBackend<Cache = QueryCacheAdapter>;

    fn backend(&self) -> &Self::B;

    fn sessions(&self) -> &SessionRegistry<Self::B>;
}

#[derive(Clone)]
pub struct AppStateImpl<B: EditorBackend> {
    backend: B,
    sessions: Arc<SessionRegistry<B>>,
}

impl<B: EditorBackend> AppStateImpl<B> {
    pub fn new(backend: B, sessions: SessionRegistry<B>) -> Self {
        Self {
            backend,
            sessions: Arc::new(sessions),
        }
    }
}

impl<B: EditorBackend<Cache = QueryCacheAdapter>> AppState for AppStateImpl<B> {
    type B = B;

    fn backend(&self) -> &Self::B {
        &self.backend
    }

    fn sessions(&self) -> &SessionRegistry<Self::B> {
        &self.sessions
    }
}
