use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Slug;

/// Cover image attached to a post or page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cover {
    pub address: String,
    pub mime_type: String,
}

impl Cover {
    pub fn new(address: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty()
    }
}

/// The editable document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldSet {
    pub title: String,

    /// Markdown body
    pub content: String,

    pub excerpt: String,

    /// Absent until the user types one, the default slug is used instead
    pub slug: Option<Slug>,

    /// Comma-joined tag list, exactly as typed
    pub tags: String,

    pub cover: Cover,

    pub published_at: Option<DateTime<Utc>>,

    #[serde(rename = "disableAISummary")]
    pub disable_ai_summary: bool,

    pub published: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    Title,
    Content,
    Excerpt,
    Slug,
    Tags,
    Cover,
    PublishedAt,
    DisableAiSummary,
    Published,
}

impl Display for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Title => "title",
            Self::Content => "content",
            Self::Excerpt => "excerpt",
            Self::Slug => "slug",
            Self::Tags => "tags",
            Self::Cover => "cover",
            Self::PublishedAt => "publishedAt",
            Self::DisableAiSummary => "disableAISummary",
            Self::Published => "published",
        };
        f.write_str(name)
    }
}

/// One mutation of one field, as sent by the editor.
///
/// Serialized as `{"field": "title", "value": "Hello"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FieldEdit {
    Title(String),
    Content(String),
    Excerpt(String),
    Slug(String),
    Tags(String),
    Cover(Cover),
    PublishedAt(Option<DateTime<Utc>>),
    #[serde(rename = "disableAISummary")]
    DisableAiSummary(bool),
    Published(bool),
}

impl FieldEdit {
    pub fn field(&self) -> FieldName {
        match self {
            Self::Title(_) => FieldName::Title,
            Self::Content(_) => FieldName::Content,
            Self::Excerpt(_) => FieldName::Excerpt,
            Self::Slug(_) => FieldName::Slug,
            Self::Tags(_) => FieldName::Tags,
            Self::Cover(_) => FieldName::Cover,
            Self::PublishedAt(_) => FieldName::PublishedAt,
            Self::DisableAiSummary(_) => FieldName::DisableAiSummary,
            Self::Published(_) => FieldName::Published,
        }
    }
}

impl FieldSet {
    /// Returns a copy with `edit` merged in.
    ///
    /// Slugs must already be sanitized: an empty or invalid slug leaves the
    /// field absent.
    pub fn merged(&self, edit: FieldEdit) -> Self {
        let mut next = self.clone();
        match edit {
            FieldEdit::Title(value) => next.title = value,
            FieldEdit::Content(value) => next.content = value,
            FieldEdit::Excerpt(value) => next.excerpt = value,
            FieldEdit::Slug(value) => next.slug = Slug::try_new(value).ok(),
            FieldEdit::Tags(value) => next.tags = value,
            FieldEdit::Cover(value) => next.cover = value,
            FieldEdit::PublishedAt(value) => next.published_at = value,
            FieldEdit::DisableAiSummary(value) => next.disable_ai_summary = value,
            FieldEdit::Published(value) => next.published = value,
        }
        next
    }

    pub fn slug_str(&self) -> &str {
        self.slug.as_ref().map(|slug| slug.as_ref()).unwrap_or("")
    }
}
