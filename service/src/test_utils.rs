//! Recording fakes for the ports of the editing engine.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use quire_common::test_utils::site;
use quire_common::{
    ContentId, ContentType, DraftSnapshot, FieldSet, LookupKey, OwnerId, RemoteRecord, SiteInfo,
    Submission, WriteReceipt,
};

use crate::domain::links::LinkSettings;
use crate::domain::{
    CacheKey, ContentStore, EditorBackend, QueryCache, RemoteError, SiteDirectory, Surface,
};
use crate::infrastructure::cache::QueryCacheAdapter;
use crate::infrastructure::drafts::memory::MemoryDraftStore;
use crate::infrastructure::events::EventLog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Lookup(LookupKey),
    Create(Submission),
    Update(ContentId, Submission),
    Delete(ContentId),
    Tags(OwnerId),
}

/// In-memory content store that records every call.
#[derive(Debug)]
pub struct FakeContentStore {
    records: Mutex<Vec<RemoteRecord>>,
    calls: Mutex<Vec<StoreCall>>,
    write_failure: Mutex<Option<RemoteError>>,
    next_id: AtomicI64,
}

impl Default for FakeContentStore {
    fn default() -> Self {
        Self::with_records(Vec::new())
    }
}

impl FakeContentStore {
    pub fn with_records(records: Vec<RemoteRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            calls: Mutex::new(Vec::new()),
            write_failure: Mutex::new(None),
            next_id: AtomicI64::new(100),
        }
    }

    /// Every following create, update and delete fails with `error`.
    pub fn fail_writes(&self, error: RemoteError) {
        *self.write_failure.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that would change the store.
    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    StoreCall::Create(_) | StoreCall::Update(..) | StoreCall::Delete(_)
                )
            })
            .collect()
    }

    fn record_call(&self, call: StoreCall) -> Result<(), RemoteError> {
        let is_write = !matches!(call, StoreCall::Lookup(_) | StoreCall::Tags(_));
        self.calls.lock().unwrap().push(call);
        match &*self.write_failure.lock().unwrap() {
            Some(error) if is_write => Err(error.clone()),
            _ => Ok(()),
        }
    }
}

fn record_from(id: ContentId, submission: Submission, hash: String) -> RemoteRecord {
    RemoteRecord {
        content_id: id,
        owner: submission.owner,
        content_type: submission.content_type,
        title: submission.title,
        content: submission.content,
        summary: submission.excerpt,
        slug: submission.slug.into_inner(),
        tags: submission.tags,
        cover: submission.cover,
        published_at: submission.published_at.or_else(|| Some(Utc::now())),
        disable_ai_summary: submission.disable_ai_summary,
        transaction_hash: Some(hash),
        updated_transaction_hash: None,
    }
}

impl ContentStore for FakeContentStore {
    async fn lookup(
        &self,
        owner: OwnerId,
        key: &LookupKey,
    ) -> Result<Option<RemoteRecord>, RemoteError> {
        self.record_call(StoreCall::Lookup(key.clone()))?;
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|record| record.owner == owner)
            .find(|record| match key {
                LookupKey::Id(id) => record.content_id == *id,
                LookupKey::Slug(slug) => record.slug == slug.as_ref(),
            })
            .cloned())
    }

    async fn create(&self, submission: Submission) -> Result<WriteReceipt, RemoteError> {
        self.record_call(StoreCall::Create(submission.clone()))?;
        let id = ContentId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let hash = format!("0xtx{id}");
        self.records
            .lock()
            .unwrap()
            .push(record_from(id, submission, hash.clone()));
        Ok(WriteReceipt {
            content_id: id,
            transaction_hash: Some(hash),
        })
    }

    async fn update(
        &self,
        id: ContentId,
        submission: Submission,
    ) -> Result<WriteReceipt, RemoteError> {
        self.record_call(StoreCall::Update(id, submission.clone()))?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|record| record.content_id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("content {id}")))?;
        let hash = format!("0xupdate{id}");
        let created = record.transaction_hash.clone();
        *record = record_from(id, submission, hash.clone());
        record.transaction_hash = created;
        record.updated_transaction_hash = Some(hash.clone());
        Ok(WriteReceipt {
            content_id: id,
            transaction_hash: Some(hash),
        })
    }

    async fn delete(&self, id: ContentId, owner: OwnerId) -> Result<(), RemoteError> {
        self.record_call(StoreCall::Delete(id))?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|record| !(record.content_id == id && record.owner == owner));
        if records.len() == before {
            return Err(RemoteError::NotFound(format!("note {id}")));
        }
        Ok(())
    }

    async fn tags_for_owner(&self, owner: OwnerId) -> Result<BTreeSet<String>, RemoteError> {
        self.record_call(StoreCall::Tags(owner))?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.owner == owner)
            .flat_map(|record| record.tags.iter().cloned())
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct FakeSites {
    sites: Vec<SiteInfo>,
}

impl SiteDirectory for FakeSites {
    async fn site(&self, owner: OwnerId) -> Result<Option<SiteInfo>, RemoteError> {
        Ok(self.sites.iter().find(|site| site.owner == owner).cloned())
    }

    async fn site_by_handle(&self, handle: &str) -> Result<Option<SiteInfo>, RemoteError> {
        Ok(self.sites.iter().find(|site| site.handle == handle).cloned())
    }
}

/// Query cache that only remembers what was invalidated.
#[derive(Debug, Default)]
pub struct RecordingCache {
    invalidated: Mutex<Vec<CacheKey>>,
}

impl RecordingCache {
    pub fn invalidated(&self) -> Vec<CacheKey> {
        self.invalidated.lock().unwrap().clone()
    }
}

impl QueryCache for RecordingCache {
    fn invalidate(&self, key: &CacheKey) {
        self.invalidated.lock().unwrap().push(key.clone());
    }
}

/// Backend of fakes. Owner 42 has the site `alice`.
#[derive(Debug, Clone)]
pub struct TestBackend {
    pub content: Arc<FakeContentStore>,
    pub drafts: Arc<MemoryDraftStore>,
    pub sites: Arc<FakeSites>,
    pub cache: Arc<RecordingCache>,
    pub links: Arc<LinkSettings>,
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::with_records(Vec::new())
    }
}

impl TestBackend {
    pub fn with_records(records: Vec<RemoteRecord>) -> Self {
        Self {
            content: Arc::new(FakeContentStore::with_records(records)),
            drafts: Arc::default(),
            sites: Arc::new(FakeSites {
                sites: vec![site(42, "alice")],
            }),
            cache: Arc::default(),
            links: Arc::default(),
        }
    }
}

impl EditorBackend for TestBackend {
    type Content = FakeContentStore;
    type Drafts = MemoryDraftStore;
    type Sites = FakeSites;
    type Cache = RecordingCache;

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

/// The fakes of [`TestBackend`] behind the service's query cache, for
/// driving the HTTP handlers.
#[derive(Debug, Clone)]
pub struct ServedBackend {
    pub fakes: TestBackend,
    pub cache: Arc<QueryCacheAdapter>,
}

impl Default for ServedBackend {
    fn default() -> Self {
        Self {
            fakes: TestBackend::default(),
            cache: Arc::default(),
        }
    }
}

impl EditorBackend for ServedBackend {
    type Content = FakeContentStore;
    type Drafts = MemoryDraftStore;
    type Sites = FakeSites;
    type Cache = QueryCacheAdapter;

    fn content(&self) -> &Self::Content {
        &self.fakes.content
    }

    fn drafts(&self) -> &Self::Drafts {
        &self.fakes.drafts
    }

    fn sites(&self) -> &Self::Sites {
        &self.fakes.sites
    }

    fn cache(&self) -> &Self::Cache {
        &self.cache
    }

    fn links(&self) -> &LinkSettings {
        &self.fakes.links
    }
}

/// Surface whose outputs all land in the returned log.
pub fn test_surface() -> (Surface, Arc<EventLog>) {
    let events = Arc::new(EventLog::default());
    (Surface::shared(events.clone()), events)
}

pub fn snapshot_of(fields: &FieldSet) -> DraftSnapshot {
    DraftSnapshot::new(fields.clone(), ContentType::Post, Utc::now())
}
