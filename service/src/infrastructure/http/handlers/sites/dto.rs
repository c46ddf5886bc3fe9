use quire_common::RemoteRecord;
use serde::Serialize;

use crate::domain::drafts::DraftSummary;

#[derive(Debug, Clone, Serialize)]
pub struct DraftListResponse {
    pub drafts: Vec<DraftSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentDetailResponse {
    pub content: RemoteRecord,
}
