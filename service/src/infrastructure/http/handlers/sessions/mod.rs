use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use quire_common::{ContentRef, ContentType, FieldEdit};

use crate::domain::Surface;
use crate::domain::deletion::DeletionOutcome;
use crate::domain::links::EditorLocation;
use crate::domain::session::EditorSession;
use crate::infrastructure::AppState;
use crate::infrastructure::events::EventLog;
use crate::infrastructure::http::api::{ApiError, ApiSuccess};
use crate::infrastructure::http::handlers::{owner_of, parse_key};
use crate::infrastructure::http::querystring::QueryString;
use crate::infrastructure::sessions::{SessionSlot, SharedSlot};
use dto::{DeletionResponse, EditorParams, PublishResponse, SessionResponse, TagsResponse};

mod dto;

fn editor_location(handle: String, params: EditorParams) -> Result<EditorLocation, ApiError> {
    let content_type = match params.content_type.as_deref() {
        Some(value) => value
            .parse::<ContentType>()
            .map_err(ApiError::UnprocessableEntity)?,
        None => ContentType::default(),
    };
    let id = params
        .id
        .filter(|id| !id.is_empty())
        .map(|id| id.parse::<ContentRef>())
        .transpose()?;

    Ok(EditorLocation {
        handle,
        id,
        content_type,
        tag: params.tag.filter(|tag| !tag.is_empty()),
    })
}

async fn find_session<S: AppState>(state: &S, key: &str) -> Result<SharedSlot<S::B>, ApiError> {
    let key = parse_key(key)?;
    state.sessions().get(&key).await.ok_or(ApiError::NotFound)
}

/// Opens the editor of `handle` at the location given by the query string.
pub async fn open_session<S: AppState>(
    Path(handle): Path<String>,
    QueryString(params): QueryString<EditorParams>,
    State(state): State<S>,
) -> Result<ApiSuccess<SessionResponse>, ApiError> {
    let location = editor_location(handle, params)?;
    let owner = owner_of(&state, &location.handle).await?;

    let events = Arc::new(EventLog::default());
    let session = EditorSession::open(
        state.backend().clone(),
        Surface::shared(events.clone()),
        location,
        Some(owner),
    )
    .await?;
    let key = session
        .key()
        .cloned()
        .ok_or_else(|| ApiError::InternalServerError("session has no draft key".to_string()))?;

    tracing::info!(%key, "session opened");
    let slot = state
        .sessions()
        .insert(key, SessionSlot { session, events })
        .await;
    let slot = slot.lock().await;

    Ok(ApiSuccess::new(StatusCode::CREATED, SessionResponse::from(&*slot)))
}

pub async fn get_session<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
) -> Result<ApiSuccess<SessionResponse>, ApiError> {
    let shared = find_session(&state, &key).await?;
    let slot = shared.lock().await;

    Ok(ApiSuccess::new(StatusCode::OK, SessionResponse::from(&*slot)))
}

pub async fn update_field<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
    Json(edit): Json<FieldEdit>,
) -> Result<ApiSuccess<SessionResponse>, ApiError> {
    let shared = find_session(&state, &key).await?;
    let mut slot = shared.lock().await;
    slot.session.update(edit);

    Ok(ApiSuccess::new(StatusCode::OK, SessionResponse::from(&*slot)))
}

pub async fn tag_suggestions<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
) -> Result<ApiSuccess<TagsResponse>, ApiError> {
    let shared = find_session(&state, &key).await?;
    let slot = shared.lock().await;
    let tags = slot.session.tag_suggestions().await?;

    Ok(ApiSuccess::new(StatusCode::OK, TagsResponse { tags }))
}

pub async fn publish<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
) -> Result<ApiSuccess<PublishResponse>, ApiError> {
    let shared = find_session(&state, &key).await?;
    let mut slot = shared.try_lock().map_err(|_| {
        ApiError::ConflictWithServerState("session is busy, try again".to_string())
    })?;

    let before = slot.session.key().cloned();
    let outcome = slot.session.publish().await?;
    if let (Some(before), Some(after)) = (before, slot.session.key().cloned()) {
        state.sessions().rekey(&before, after).await;
    }

    Ok(ApiSuccess::new(
        StatusCode::OK,
        PublishResponse {
            outcome: outcome.into(),
            session: SessionResponse::from(&*slot),
        },
    ))
}

pub async fn discard_local_changes<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
) -> Result<ApiSuccess<SessionResponse>, ApiError> {
    let shared = find_session(&state, &key).await?;
    let mut slot = shared.lock().await;
    slot.session.discard_local_changes().await?;

    Ok(ApiSuccess::new(StatusCode::OK, SessionResponse::from(&*slot)))
}

pub async fn delete_session<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
) -> Result<ApiSuccess<DeletionResponse>, ApiError> {
    let shared = find_session(&state, &key).await?;
    let mut slot = shared.lock().await;
    let outcome = slot.session.delete_session().await?;

    if matches!(
        outcome,
        DeletionOutcome::LocalDiscarded | DeletionOutcome::Deleted(_)
    ) {
        let key = parse_key(&key)?;
        state.sessions().remove(&key).await;
    }

    Ok(ApiSuccess::new(
        StatusCode::OK,
        DeletionResponse {
            outcome: outcome.into(),
            events: slot.events.drain(),
        },
    ))
}

/// Drops the session from the registry. Local drafts stay where they are.
pub async fn close_session<S: AppState>(
    Path(key): Path<String>,
    State(state): State<S>,
) -> Result<ApiSuccess<SessionResponse>, ApiError> {
    let key = parse_key(&key)?;
    let shared = state.sessions().remove(&key).await.ok_or(ApiError::NotFound)?;
    let slot = shared.lock().await;
    tracing::info!(%key, "session closed");

    Ok(ApiSuccess::new(StatusCode::OK, SessionResponse::from(&*slot)))
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;
    use quire_common::OwnerId;

    use super::*;
    use crate::infrastructure::AppStateImpl;
    use crate::infrastructure::sessions::SessionRegistry;
    use crate::test_utils::ServedBackend;

    type TestState = AppStateImpl<ServedBackend>;

    /// Opens a session for `alice` straight into the registry of `state`.
    async fn opened(state: &TestState) -> String {
        let events = Arc::new(EventLog::default());
        let session = EditorSession::open(
            state.backend().clone(),
            Surface::shared(events.clone()),
            EditorLocation::new("alice", ContentType::Post),
            Some(OwnerId(42)),
        )
        .await
        .unwrap();
        let key = session.key().cloned().unwrap();
        state
            .sessions()
            .insert(key.clone(), SessionSlot { session, events })
            .await;
        key.to_string()
    }

    #[tokio::test]
    async fn test_closed_session_is_gone() {
        let state = AppStateImpl::new(ServedBackend::default(), SessionRegistry::default());
        let key = opened(&state).await;

        let response = close_session(Path(key.clone()), State(state.clone()))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.sessions().len().await, 0);
        assert!(matches!(
            get_session(Path(key.clone()), State(state.clone())).await,
            Err(ApiError::NotFound)
        ));
        assert!(matches!(
            close_session(Path(key), State(state)).await,
            Err(ApiError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_open_registers_the_session() {
        let state = AppStateImpl::new(ServedBackend::default(), SessionRegistry::default());

        let response = open_session(
            Path("alice".to_string()),
            QueryString(params(None, None, None)),
            State(state.clone()),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(state.sessions().len().await, 1);
    }

    fn params(id: Option<&str>, content_type: Option<&str>, tag: Option<&str>) -> EditorParams {
        EditorParams {
            id: id.map(str::to_string),
            content_type: content_type.map(str::to_string),
            tag: tag.map(str::to_string),
        }
    }

    #[test]
    fn test_location_from_query() {
        let location =
            editor_location("alice".to_string(), params(Some("!local-abc"), Some("page"), Some("rust")))
                .unwrap();

        assert_eq!(location.path(), "/dashboard/alice/editor?id=!local-abc&type=page&tag=rust");
    }

    #[test]
    fn test_location_defaults() {
        let location = editor_location("alice".to_string(), params(Some(""), None, Some(""))).unwrap();

        assert_eq!(location.id, None);
        assert_eq!(location.content_type, ContentType::Post);
        assert_eq!(location.tag, None);
    }

    #[test]
    fn test_bad_location_is_unprocessable() {
        assert!(matches!(
            editor_location("alice".to_string(), params(Some("my post"), None, None)),
            Err(ApiError::UnprocessableEntity(_))
        ));
        assert!(matches!(
            editor_location("alice".to_string(), params(None, Some("video"), None)),
            Err(ApiError::UnprocessableEntity(_))
        ));
    }
}
