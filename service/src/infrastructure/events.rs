use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::domain::links::PublishedLinks;
use crate::domain::{Celebration, Navigator, Notifier};

/// Something a session asked the client to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SessionEvent {
    Navigate { path: String, replace: bool },
    Error { message: String },
    Success { message: String },
    Celebrate { links: PublishedLinks },
}

/// Collects the events of a session until the client picks them up.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<SessionEvent>>,
}

impl EventLog {
    fn events(&self) -> MutexGuard<'_, Vec<SessionEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: SessionEvent) {
        tracing::debug!(?event, "session event");
        self.events().push(event);
    }

    /// Takes every event recorded so far.
    pub fn drain(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut *self.events())
    }
}

impl Navigator for EventLog {
    fn replace_location(&self, path: &str) {
        self.record(SessionEvent::Navigate {
            path: path.to_string(),
            replace: true,
        });
    }

    fn push_location(&self, path: &str) {
        self.record(SessionEvent::Navigate {
            path: path.to_string(),
            replace: false,
        });
    }
}

impl Notifier for EventLog {
    fn notify_error(&self, message: &str) {
        self.record(SessionEvent::Error {
            message: message.to_string(),
        });
    }

    fn notify_success(&self, message: &str) {
        self.record(SessionEvent::Success {
            message: message.to_string(),
        });
    }
}

impl Celebration for EventLog {
    fn celebrate(&self, links: &PublishedLinks) {
        self.record(SessionEvent::Celebrate {
            links: links.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_the_log() {
        let log = EventLog::default();
        log.notify_success("Deleted!");
        log.push_location("/dashboard/alice/posts");

        assert_eq!(log.drain().len(), 2);
        assert!(log.drain().is_empty());
    }

    #[test]
    fn test_event_wire_format() {
        let event = SessionEvent::Navigate {
            path: "/x".to_string(),
            replace: true,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({"kind": "navigate", "path": "/x", "replace": true})
        );
    }
}
