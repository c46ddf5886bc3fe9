use quire_common::{ContentRef, ContentType, DraftKey, FieldSet};
use serde::{Deserialize, Serialize};

use crate::domain::EditorBackend;
use crate::domain::deletion::DeletionOutcome;
use crate::domain::publish::{PublishOutcome, PublishPhase, PublishReceipt};
use crate::domain::visibility::VisibilityState;
use crate::infrastructure::events::SessionEvent;
use crate::infrastructure::sessions::SessionSlot;

/// Query of the editor location, `?id=..&type=..&tag=..`
#[derive(Debug, Deserialize)]
pub struct EditorParams {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub tag: Option<String>,
}

/// State of one session plus the events emitted while handling the request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    key: Option<DraftKey>,
    id: Option<ContentRef>,
    location: String,
    content_type: ContentType,
    visibility: VisibilityState,
    fields: FieldSet,
    default_slug: String,
    effective_slug: String,
    preview_url: Option<String>,
    publish_phase: PublishPhase,
    events: Vec<SessionEvent>,
}

impl<B: EditorBackend> From<&SessionSlot<B>> for SessionResponse {
    fn from(slot: &SessionSlot<B>) -> Self {
        let session = &slot.session;
        Self {
            key: session.key().cloned(),
            id: session.location().id.clone(),
            location: session.location().path(),
            content_type: session.content_type(),
            visibility: session.visibility(),
            fields: session.fields().clone(),
            default_slug: session.default_slug().to_string(),
            effective_slug: session.effective_slug().to_string(),
            preview_url: session.preview_url(),
            publish_phase: session.publish_phase(),
            events: slot.events.drain(),
        }
    }
}

/// Tags the owner already used, reserved ones left out
#[derive(Debug, Clone, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PublishStatus {
    Published { receipt: PublishReceipt },
    Rejected { message: String },
    Failed { message: String },
    Skipped,
}

impl From<PublishOutcome> for PublishStatus {
    fn from(value: PublishOutcome) -> Self {
        match value {
            PublishOutcome::Published(receipt) => Self::Published { receipt },
            PublishOutcome::Rejected(message) => Self::Rejected { message },
            PublishOutcome::Failed(err) => Self::Failed {
                message: err.to_string(),
            },
            PublishOutcome::Skipped => Self::Skipped,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishResponse {
    pub outcome: PublishStatus,
    pub session: SessionResponse,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DeletionStatus {
    LocalDiscarded,
    Deleted { id: ContentRef },
    Failed { message: String },
    Skipped,
}

impl From<DeletionOutcome> for DeletionStatus {
    fn from(value: DeletionOutcome) -> Self {
        match value {
            DeletionOutcome::LocalDiscarded => Self::LocalDiscarded,
            DeletionOutcome::Deleted(id) => Self::Deleted { id: id.into() },
            DeletionOutcome::Failed(err) => Self::Failed {
                message: err.to_string(),
            },
            DeletionOutcome::Skipped => Self::Skipped,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletionResponse {
    pub outcome: DeletionStatus,
    pub events: Vec<SessionEvent>,
}
