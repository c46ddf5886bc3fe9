use quire_common::{ContentRef, DraftKey, LocalToken, OwnerId};

use crate::domain::Navigator;
use crate::domain::links::EditorLocation;

/// Result of resolving the identity of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub key: DraftKey,
    /// A fresh local identity was generated
    pub minted: bool,
}

/// Computes the stable [`DraftKey`] of one editing session.
///
/// The resolution is memoized: resolving again with the same owner and the
/// same identifier, or with no identifier after a local one was minted,
/// yields the same key.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    resolved: Option<DraftKey>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` while the owner is unknown; retry once it is.
    ///
    /// When `location` carries no identifier a local token is minted and the
    /// navigator is asked to replace the location with one that encodes it,
    /// so a reload reuses the identity.
    pub fn resolve(
        &mut self,
        owner: Option<OwnerId>,
        location: &EditorLocation,
        navigator: &dyn Navigator,
    ) -> Option<Resolution> {
        let owner = owner?;

        if let Some(key) = &self.resolved {
            let same_identity = match &location.id {
                Some(content) => content == key.content(),
                None => key.content().is_local(),
            };
            if key.belongs_to(owner) && same_identity {
                return Some(Resolution {
                    key: key.clone(),
                    minted: false,
                });
            }
        }

        let (content, minted) = match &location.id {
            Some(content) => (content.clone(), false),
            None => (ContentRef::Local(LocalToken::generate()), true),
        };

        if minted {
            let path = location.with_id(content.clone()).path();
            tracing::debug!(%owner, %content, "minted local draft identity");
            navigator.replace_location(&path);
        }

        let key = DraftKey::new(owner, content);
        self.resolved = Some(key.clone());

        Some(Resolution { key, minted })
    }

    pub fn current(&self) -> Option<&DraftKey> {
        self.resolved.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use quire_common::{ContentId, ContentType};

    use super::*;
    use crate::infrastructure::events::{EventLog, SessionEvent};

    fn location(id: Option<&str>) -> EditorLocation {
        EditorLocation {
            handle: "alice".to_string(),
            id: id.map(|id| id.parse().unwrap()),
            content_type: ContentType::Post,
            tag: Some("notes".to_string()),
        }
    }

    #[test]
    fn test_existing_identifier_is_used_as_is() {
        let events = EventLog::default();
        let mut resolver = IdentityResolver::new();

        let resolution = resolver
            .resolve(Some(OwnerId(42)), &location(Some("99")), &events)
            .unwrap();

        assert_eq!(resolution.key.to_string(), "draft-42-99");
        assert!(!resolution.minted);
        assert!(events.drain().is_empty());
    }

    #[test]
    fn test_missing_identifier_mints_local_token_and_rewrites_location() {
        let events = EventLog::default();
        let mut resolver = IdentityResolver::new();

        let resolution = resolver
            .resolve(Some(OwnerId(42)), &location(None), &events)
            .unwrap();

        assert!(resolution.minted);
        let local = resolution.key.local_component();
        assert!(resolution.key.to_string().starts_with("draft-42-!local-"));
        assert_eq!(
            events.drain(),
            vec![SessionEvent::Navigate {
                path: format!("/dashboard/alice/editor?id={local}&type=post&tag=notes"),
                replace: true,
            }]
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let events = EventLog::default();
        let mut resolver = IdentityResolver::new();

        let first = resolver
            .resolve(Some(OwnerId(42)), &location(None), &events)
            .unwrap();
        let second = resolver
            .resolve(Some(OwnerId(42)), &location(None), &events)
            .unwrap();
        let reloaded = location(Some(&first.key.local_component()));
        let third = resolver.resolve(Some(OwnerId(42)), &reloaded, &events).unwrap();

        assert_eq!(first.key, second.key);
        assert_eq!(first.key, third.key);
        assert!(!second.minted);
        assert_eq!(events.drain().len(), 1);
    }

    #[test]
    fn test_unknown_owner_yields_no_key() {
        let events = EventLog::default();
        let mut resolver = IdentityResolver::new();

        assert!(resolver.resolve(None, &location(None), &events).is_none());
        assert!(resolver.current().is_none());
        assert!(events.drain().is_empty());
    }

    #[test]
    fn test_new_content_identity_replaces_the_key() {
        let events = EventLog::default();
        let mut resolver = IdentityResolver::new();
        resolver.resolve(Some(OwnerId(42)), &location(None), &events);

        let published = location(None).with_id(ContentRef::Remote(ContentId(7)));
        let resolution = resolver.resolve(Some(OwnerId(42)), &published, &events).unwrap();

        assert_eq!(resolution.key.to_string(), "draft-42-7");
        assert_eq!(resolver.current(), Some(&resolution.key));
    }
}
