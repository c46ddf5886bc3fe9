use axum::extract::{Path, State};
use axum::http::StatusCode;
use quire_common::{ContentRef, LookupKey};

use crate::domain::drafts::draft_list;
use crate::domain::{ContentStore, EditorBackend};
use crate::infrastructure::AppState;
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::owner_of;
use dto::{ContentDetailResponse, DraftListResponse};

mod dto;

/// Local drafts of the site's owner, newest first.
pub async fn list_drafts<S: AppState>(
    Path(handle): Path<String>,
    State(state): State<S>,
) -> Result<ApiSuccess<DraftListResponse>, ApiError> {
    let owner = owner_of(&state, &handle).await?;
    let backend = state.backend();
    let drafts = backend
        .cache()
        .draft_list(owner, || draft_list(backend.drafts(), owner))?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        DraftListResponse {
            drafts: drafts.as_ref().clone(),
        },
    ))
}

/// Published record behind `id`, served from the query cache when possible.
pub async fn content_detail<S: AppState>(
    Path((handle, id)): Path<(String, String)>,
    State(state): State<S>,
) -> Result<ApiSuccess<ContentDetailResponse>, ApiError> {
    let ContentRef::Remote(content_id) = id.parse::<ContentRef>()? else {
        return Err(ApiError::NotFound);
    };
    let owner = owner_of(&state, &handle).await?;
    let backend = state.backend();
    let effective = ContentRef::Remote(content_id).to_string();

    let record = backend
        .cache()
        .content_detail(
            owner,
            &effective,
            backend.content().lookup(owner, &LookupKey::Id(content_id)),
        )
        .await?;

    match record.as_ref() {
        Some(content) => Ok(ApiSuccess::new(
            StatusCode::OK,
            ContentDetailResponse {
                content: content.clone(),
            },
        )),
        None => Err(ApiError::NotFound),
    }
}
