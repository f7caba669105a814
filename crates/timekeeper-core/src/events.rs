use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitor::MonitorState;
use crate::notify::Notification;

/// Everything the monitor tells the presentation shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Emitted every loop iteration. Zero once the session is over.
    Tick {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Notification {
        notification: Notification,
        at: DateTime<Utc>,
    },
    /// The monitor loop has exited; always the last event of a session.
    Finished {
        state: MonitorState,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn tick(remaining_secs: u64) -> Self {
        Event::Tick {
            remaining_secs,
            at: Utc::now(),
        }
    }

    pub fn notification(notification: Notification) -> Self {
        Event::Notification {
            notification,
            at: Utc::now(),
        }
    }

    pub fn finished(state: MonitorState) -> Self {
        Event::Finished {
            state,
            at: Utc::now(),
        }
    }
}

/// Where monitor events go. A disconnected receiver is not an error.
pub trait EventSink: Send {
    fn emit(&self, event: Event);
}

impl EventSink for std::sync::mpsc::Sender<Event> {
    fn emit(&self, event: Event) {
        let _ = self.send(event);
    }
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<Event> {
    fn emit(&self, event: Event) {
        let _ = self.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}
