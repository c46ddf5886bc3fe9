use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::fields::Cover;
use crate::domain::snapshot::ContentType;
use crate::domain::{ContentId, OwnerId, Slug};

/// Published entity as the remote store knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    pub content_id: ContentId,
    pub owner: OwnerId,
    pub content_type: ContentType,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub cover: Option<Cover>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(rename = "disableAISummary")]
    pub disable_ai_summary: bool,
    pub transaction_hash: Option<String>,
    pub updated_transaction_hash: Option<String>,
}

impl RemoteRecord {
    /// Hash of the most recent ledger write touching this record.
    pub fn latest_transaction(&self) -> Option<&str> {
        self.updated_transaction_hash
            .as_deref()
            .or(self.transaction_hash.as_deref())
    }
}

/// How a record is looked up in the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    Id(ContentId),
    Slug(Slug),
}

/// Payload of a create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub owner: OwnerId,
    pub content_type: ContentType,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub slug: Slug,
    pub tags: Vec<String>,
    pub cover: Option<Cover>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(rename = "disableAISummary")]
    pub disable_ai_summary: bool,
}

/// Acknowledgment of a create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReceipt {
    pub content_id: ContentId,
    pub transaction_hash: Option<String>,
}

/// Public site of an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub owner: OwnerId,
    pub handle: String,
    pub custom_domain: Option<String>,
}
