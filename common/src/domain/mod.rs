use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use nutype::nutype;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub mod fields;
pub mod record;
pub mod snapshot;

pub use fields::{Cover, FieldEdit, FieldName, FieldSet};
pub use record::{LookupKey, RemoteRecord, SiteInfo, Submission, WriteReceipt};
pub use snapshot::{ContentType, DraftKey, DraftSnapshot};

/// Marks an identifier that has never been published.
pub const LOCAL_MARKER: &str = "!local-";

// A regex for slugs: ASCII letters, digits, hyphen and underscore.
// Example: "my-post_2" is valid; "my post" or "my/post" are not.
pub const SLUG_SYMBOLS_REGEX: &str = r"^[A-Za-z0-9\-_]*$";

static SLUG_SYMBOLS_REGEX_COMPILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(SLUG_SYMBOLS_REGEX).expect("SLUG_SYMBOLS_REGEX must be a valid regex")
});

// Same alphabet as slugs, but a token may never be empty.
const TOKEN_SYMBOLS_REGEX: &str = r"^[A-Za-z0-9\-_]+$";

static TOKEN_SYMBOLS_REGEX_COMPILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(TOKEN_SYMBOLS_REGEX).expect("TOKEN_SYMBOLS_REGEX must be a valid regex")
});

/// Longest slug accepted by [`Slug`], in characters.
pub const SLUG_MAX_CHARS: usize = 200;

pub fn is_slug_safe(value: &str) -> bool {
    SLUG_SYMBOLS_REGEX_COMPILED.is_match(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("invalid local draft token: {0}")]
    InvalidToken(String),
    #[error("invalid content identifier: {0}")]
    InvalidContentId(String),
    #[error("invalid draft key: {0}")]
    InvalidDraftKey(String),
}

/// Owner (author) of a site and of everything published on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub i64);

impl From<i64> for OwnerId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier assigned by the remote store when a record is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub i64);

impl From<i64> for ContentId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for ContentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Random token naming a draft that was never published.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalToken(String);

impl LocalToken {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        if value.chars().count() <= 64 && TOKEN_SYMBOLS_REGEX_COMPILED.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(IdentifierError::InvalidToken(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LocalToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The effective identifier of an editing session.
///
/// Rendered as the decimal content id for published records and as
/// `!local-{token}` for drafts that only live in the local cache.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentRef {
    Remote(ContentId),
    Local(LocalToken),
}

impl ContentRef {
    pub fn content_id(&self) -> Option<ContentId> {
        match self {
            Self::Remote(id) => Some(*id),
            Self::Local(_) => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Identifier without the local marker, always slug-safe.
    pub fn suffix(&self) -> String {
        match self {
            Self::Remote(id) => id.to_string(),
            Self::Local(token) => token.to_string(),
        }
    }
}

impl From<ContentId> for ContentRef {
    fn from(value: ContentId) -> Self {
        Self::Remote(value)
    }
}

impl Display for ContentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(id) => write!(f, "{id}"),
            Self::Local(token) => write!(f, "{LOCAL_MARKER}{token}"),
        }
    }
}

impl FromStr for ContentRef {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Some(token) = value.strip_prefix(LOCAL_MARKER) {
            return LocalToken::parse(token).map(Self::Local);
        }
        value
            .parse::<i64>()
            .map(|id| Self::Remote(ContentId(id)))
            .map_err(|_| IdentifierError::InvalidContentId(value.to_string()))
    }
}

impl Serialize for ContentRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[nutype(
    validate(not_empty, len_char_max = 200, predicate = is_slug_safe),
    derive(
        Clone,
        Debug,
        Display,
        FromStr,
        AsRef,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct Slug(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_ref_round_trips_through_text() {
        let local: ContentRef = "!local-abc123".parse().unwrap();
        assert_eq!(local, ContentRef::Local(LocalToken::parse("abc123").unwrap()));
        assert_eq!(local.to_string(), "!local-abc123");
        assert_eq!(local.suffix(), "abc123");

        let remote: ContentRef = "99".parse().unwrap();
        assert_eq!(remote.content_id(), Some(ContentId(99)));
        assert_eq!(remote.to_string(), "99");
    }

    #[test]
    fn test_content_ref_rejects_garbage() {
        assert!("my-post".parse::<ContentRef>().is_err());
        assert!("!local-".parse::<ContentRef>().is_err());
        assert!("!local-a/b".parse::<ContentRef>().is_err());
    }

    #[test]
    fn test_generated_tokens_are_distinct_and_valid() {
        let a = LocalToken::generate();
        let b = LocalToken::generate();
        assert_ne!(a, b);
        assert!(LocalToken::parse(a.as_str()).is_ok());
    }

    #[test]
    fn test_slug_accepts_only_safe_symbols() {
        assert!(Slug::try_new("hello-world_2").is_ok());
        assert!(Slug::try_new("").is_err());
        assert!(Slug::try_new("hello world").is_err());
        assert!(Slug::try_new("héllo").is_err());
    }

    #[test]
    fn test_slug_length_cap() {
        assert!(Slug::try_new("a".repeat(SLUG_MAX_CHARS)).is_ok());
        assert!(Slug::try_new("a".repeat(SLUG_MAX_CHARS + 1)).is_err());
    }
}
