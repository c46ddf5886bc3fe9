use axum::http::StatusCode;
use quire_common::{DraftKey, OwnerId};

use crate::domain::{EditorBackend, SiteDirectory};
use crate::infrastructure::AppState;
use crate::infrastructure::http::api::ApiError;

pub mod sessions;
pub mod sites;

// health check handler
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

fn parse_key(key: &str) -> Result<DraftKey, ApiError> {
    Ok(key.parse::<DraftKey>()?)
}

/// Owner of the site published under `handle`.
async fn owner_of<S: AppState>(state: &S, handle: &str) -> Result<OwnerId, ApiError> {
    state
        .backend()
        .sites()
        .site_by_handle(handle)
        .await?
        .map(|site| site.owner)
        .ok_or(ApiError::NotFound)
}
