use std::fmt::{Debug, Formatter};

use quire_common::{FieldEdit, FieldSet};

/// Handle returned by [`EditorFieldStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Observer = Box<dyn Fn(&FieldSet) + Send + Sync>;

/// Observable in-memory state of the editor.
///
/// Only [`EditorFieldStore::commit`] changes the fields; every commit is
/// delivered to all observers in subscription order.
#[derive(Default)]
pub struct EditorFieldStore {
    fields: FieldSet,
    default_slug: String,
    observers: Vec<(Subscription, Observer)>,
    next_subscription: u64,
}

impl Debug for EditorFieldStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorFieldStore")
            .field("fields", &self.fields)
            .field("default_slug", &self.default_slug)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl EditorFieldStore {
    pub fn new(fields: FieldSet, default_slug: String) -> Self {
        Self {
            fields,
            default_slug,
            ..Self::default()
        }
    }

    pub fn current(&self) -> &FieldSet {
        &self.fields
    }

    /// Suggested slug, derived from the title. Never written into the fields.
    pub fn default_slug(&self) -> &str {
        &self.default_slug
    }

    pub fn set_default_slug(&mut self, slug: String) {
        self.default_slug = slug;
    }

    /// The explicit slug when there is one, the suggestion otherwise.
    pub fn effective_slug(&self) -> &str {
        match &self.fields.slug {
            Some(slug) => slug.as_ref(),
            None => &self.default_slug,
        }
    }

    pub fn subscribe<F>(&mut self, observer: F) -> Subscription
    where
        F: Fn(&FieldSet) + Send + Sync + 'static,
    {
        let subscription = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((subscription, Box::new(observer)));
        subscription
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(id, _)| *id != subscription);
        self.observers.len() != before
    }

    /// Fields as they will be once `edit` is committed.
    pub fn stage(&self, edit: FieldEdit) -> FieldSet {
        self.fields.merged(edit)
    }

    pub fn commit(&mut self, fields: FieldSet) {
        self.fields = fields;
        for (_, observer) in &self.observers {
            observer(&self.fields);
        }
    }
}
