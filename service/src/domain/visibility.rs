use quire_common::RemoteRecord;
use serde::Serialize;

/// Publication state of the content behind one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityState {
    /// Never published, lives only in the local cache
    #[default]
    Draft,
    /// Published, no local changes
    Published,
    /// Published, with local changes not yet submitted
    Modified,
}

impl VisibilityState {
    pub fn from_remote(record: Option<&RemoteRecord>) -> Self {
        match record {
            Some(_) => Self::Published,
            None => Self::Draft,
        }
    }

    /// Returns `true` when the state changed.
    pub fn promote_on_edit(&mut self) -> bool {
        if *self == Self::Published {
            *self = Self::Modified;
            true
        } else {
            false
        }
    }
}
