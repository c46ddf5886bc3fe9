use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use quire_common::DraftKey;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::domain::EditorBackend;
use crate::domain::session::EditorSession;
use crate::infrastructure::events::EventLog;

/// Idle time after which a session is dropped when no timeout is configured.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// An open session together with the events it emitted.
pub struct SessionSlot<B: EditorBackend> {
    pub session: EditorSession<B>,
    pub events: Arc<EventLog>,
}

pub type SharedSlot<B> = Arc<Mutex<SessionSlot<B>>>;

struct Entry<B: EditorBackend> {
    slot: SharedSlot<B>,
    touched: Instant,
}

impl<B: EditorBackend> Entry<B> {
    fn new(slot: SharedSlot<B>) -> Self {
        Self {
            slot,
            touched: Instant::now(),
        }
    }

    /// Idle for at least `timeout` and not held by a running request.
    fn is_stale(&self, now: Instant, timeout: Duration) -> bool {
        now.duration_since(self.touched) >= timeout
            && Arc::strong_count(&self.slot) == 1
            && self.slot.try_lock().is_ok()
    }
}

/// Open sessions by draft key.
///
/// Each session sits behind its own async mutex so requests for one session
/// are handled one at a time. Sessions not used for `idle_timeout` are
/// dropped whenever a new one is registered.
pub struct SessionRegistry<B: EditorBackend> {
    sessions: RwLock<HashMap<DraftKey, Entry<B>>>,
    idle_timeout: Duration,
}

impl<B: EditorBackend> Default for SessionRegistry<B> {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

impl<B: EditorBackend> SessionRegistry<B> {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Registers `slot` under `key`, replacing a session opened earlier under
    /// the same key.
    pub async fn insert(&self, key: DraftKey, slot: SessionSlot<B>) -> SharedSlot<B> {
        let shared = Arc::new(Mutex::new(slot));
        let mut sessions = self.sessions.write().await;

        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_stale(now, self.idle_timeout));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "dropped idle sessions");
        }

        if sessions
            .insert(key.clone(), Entry::new(shared.clone()))
            .is_some()
        {
            tracing::debug!(%key, "replaced open session");
        }
        shared
    }

    pub async fn get(&self, key: &DraftKey) -> Option<SharedSlot<B>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(key)?;
        entry.touched = Instant::now();
        Some(entry.slot.clone())
    }

    /// Moves a session to the key it was given by a first publish.
    pub async fn rekey(&self, from: &DraftKey, to: DraftKey) {
        if from == &to {
            return;
        }
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.remove(from) {
            tracing::debug!(%from, %to, "session re-keyed");
            sessions.insert(to, entry);
        }
    }

    pub async fn remove(&self, key: &DraftKey) -> Option<SharedSlot<B>> {
        self.sessions
            .write()
            .await
            .remove(key)
            .map(|entry| entry.slot)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
