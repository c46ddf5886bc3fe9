//! Builders for the shared data model.
//!
//! Public so that other crates can reuse them for their own tests.

use chrono::{DateTime, Utc};

use crate::domain::{ContentId, ContentType, Cover, FieldSet, OwnerId, RemoteRecord, SiteInfo, Slug};

pub fn fields_titled(title: &str) -> FieldSet {
    FieldSet {
        title: title.to_string(),
        ..FieldSet::default()
    }
}

pub fn slug(value: &str) -> Slug {
    Slug::try_new(value).unwrap()
}

/// A published post owned by `owner`.
pub fn published_record(owner: i64, content_id: i64, slug: &str) -> RemoteRecord {
    RemoteRecord {
        content_id: ContentId(content_id),
        owner: OwnerId(owner),
        content_type: ContentType::Post,
        title: format!("Post {content_id}"),
        content: "Body".to_string(),
        summary: String::new(),
        slug: slug.to_string(),
        tags: vec!["post".to_string(), "rust".to_string()],
        cover: Some(Cover::new("ipfs://cover", "image/png")),
        published_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0),
        disable_ai_summary: false,
        transaction_hash: Some("0xcreate".to_string()),
        updated_transaction_hash: None,
    }
}

pub fn site(owner: i64, handle: &str) -> SiteInfo {
    SiteInfo {
        owner: OwnerId(owner),
        handle: handle.to_string(),
        custom_domain: None,
    }
}
