use quire_common::{ContentId, LookupKey, OwnerId, SLUG_MAX_CHARS, Slug};

use crate::domain::{ContentStore, RemoteError};

pub const INVALID_SLUG_MESSAGE: &str =
    "Slug can only contain letters, numbers, hyphens, and underscores.";

pub const SLUG_TOO_LONG_MESSAGE: &str = "Slug can be at most 200 characters long.";

fn is_slug_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// A user-typed slug with every disallowed character replaced by `-` and
/// cut to [`SLUG_MAX_CHARS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedSlug {
    pub value: String,
    /// Message telling the user how the input was changed
    pub notice: Option<&'static str>,
}

pub fn sanitize_slug(raw: &str) -> SanitizedSlug {
    let mut replaced = false;
    let value: String = raw
        .chars()
        .take(SLUG_MAX_CHARS)
        .map(|c| {
            if is_slug_char(c) {
                c
            } else {
                replaced = true;
                '-'
            }
        })
        .collect();

    let notice = if replaced {
        Some(INVALID_SLUG_MESSAGE)
    } else if raw.chars().nth(SLUG_MAX_CHARS).is_some() {
        Some(SLUG_TOO_LONG_MESSAGE)
    } else {
        None
    };
    SanitizedSlug { value, notice }
}

/// Slug derived from a title, `fallback` when nothing slug-safe is left.
pub fn default_slug(title: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-') && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug: String = slug.chars().take(SLUG_MAX_CHARS).collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug.to_string()
    }
}

/// Outcome of checking a candidate slug against the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlugCheck {
    Available(Slug),
    Rejected(String),
}

/// Looks for another record of `owner` using `candidate`; the record being
/// edited (`exclude`) does not count as a collision.
pub async fn validate_slug<C: ContentStore>(
    content: &C,
    candidate: &str,
    owner: OwnerId,
    exclude: Option<ContentId>,
) -> Result<SlugCheck, RemoteError> {
    let slug = match Slug::try_new(candidate) {
        Ok(slug) => slug,
        Err(_) if candidate.is_empty() => {
            return Ok(SlugCheck::Rejected("Slug cannot be empty.".to_string()));
        }
        Err(_) => return Ok(SlugCheck::Rejected(INVALID_SLUG_MESSAGE.to_string())),
    };

    let existing = content
        .lookup(owner, &LookupKey::Slug(slug.clone()))
        .await?
        .filter(|record| Some(record.content_id) != exclude);

    match existing {
        Some(record) => {
            tracing::debug!(%owner, slug = %slug, taken_by = %record.content_id, "slug collision");
            Ok(SlugCheck::Rejected(format!(
                "The slug \"{}\" is already used by another {}.",
                slug, record.content_type
            )))
        }
        None => Ok(SlugCheck::Available(slug)),
    }
}
