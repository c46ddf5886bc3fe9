use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::fields::FieldSet;
use crate::domain::{ContentRef, IdentifierError, OwnerId};

const DRAFT_KEY_PREFIX: &str = "draft-";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Post,
    Page,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Page => "page",
        }
    }

    /// Name of the dashboard listing that shows this kind of content.
    pub fn listing(&self) -> &'static str {
        match self {
            Self::Post => "posts",
            Self::Page => "pages",
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "post" => Ok(Self::Post),
            "page" => Ok(Self::Page),
            other => Err(format!("unknown content type: {other}")),
        }
    }
}

/// Key of one editing session in the local draft cache:
/// `draft-{owner}-{identifier}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DraftKey {
    owner: OwnerId,
    content: ContentRef,
}

impl DraftKey {
    pub fn new(owner: OwnerId, content: ContentRef) -> Self {
        Self { owner, content }
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    /// Everything after `draft-{owner}-`.
    pub fn local_component(&self) -> String {
        self.content.to_string()
    }

    pub fn belongs_to(&self, owner: OwnerId) -> bool {
        self.owner == owner
    }
}

impl Display for DraftKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{DRAFT_KEY_PREFIX}{}-{}", self.owner, self.content)
    }
}

impl FromStr for DraftKey {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || IdentifierError::InvalidDraftKey(value.to_string());

        let rest = value.strip_prefix(DRAFT_KEY_PREFIX).ok_or_else(invalid)?;
        let (owner, content) = rest.split_once('-').ok_or_else(invalid)?;
        let owner = owner.parse::<i64>().map_err(|_| invalid())?;
        let content = content.parse::<ContentRef>()?;

        Ok(Self::new(OwnerId(owner), content))
    }
}

impl Serialize for DraftKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DraftKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Full field state persisted under a [`DraftKey`]. Always written wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    pub written_at: DateTime<Utc>,
    pub fields: FieldSet,
    pub content_type: ContentType,
}

impl DraftSnapshot {
    pub fn new(fields: FieldSet, content_type: ContentType, written_at: DateTime<Utc>) -> Self {
        Self {
            written_at,
            fields,
            content_type,
        }
    }
}
