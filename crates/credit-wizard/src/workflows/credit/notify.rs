use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient user-facing message (rendered as a toast by the presentation layer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Fire-and-forget notification boundary.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Collects notifications until the presentation layer drains them.
#[derive(Debug, Default)]
pub struct NotificationBuffer {
    events: Mutex<Vec<Notification>>,
}

impl NotificationBuffer {
    pub fn drain(&self) -> Vec<Notification> {
        let mut guard = self.events.lock().unwrap_or_else(|err| err.into_inner());
        std::mem::take(&mut *guard)
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }
}

impl NotificationSink for NotificationBuffer {
    fn notify(&self, notification: Notification) {
        self.events
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push(notification);
    }
}

/// Emits notifications as log lines; used by the CLI walkthrough.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(message = %notification.message, "notification"),
            NotificationKind::Error => warn!(message = %notification.message, "notification"),
        }
    }
}
