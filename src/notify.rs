use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::{info, warn};

use crate::models::{Notification, NotificationKind};

pub const DEFAULT_CAPACITY: usize = 256;

/// Receives user-facing notifications. Delivery is fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Keeps the most recent notifications so clients can poll them.
pub struct NotificationLog {
    entries: Mutex<VecDeque<Notification>>,
    capacity: usize,
}

impl NotificationLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY))),
            capacity: capacity.max(1),
        }
    }

    /// Oldest first.
    pub fn recent(&self) -> Vec<Notification> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Notification>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationSink for NotificationLog {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(
                title = %notification.title,
                class_id = ?notification.class_id,
                "{}",
                notification.body
            ),
            NotificationKind::Error => warn!(
                title = %notification.title,
                class_id = ?notification.class_id,
                "{}",
                notification.body
            ),
        }

        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_keeps_order() {
        let log = NotificationLog::default();
        log.notify(Notification::success("Class Booked!", "ok").for_class("1"));
        log.notify(Notification::error("Booking Failed", "no").for_class("2"));

        let recent = log.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].class_id.as_deref(), Some("1"));
        assert_eq!(recent[1].kind, NotificationKind::Error);
    }

    #[test]
    fn test_log_drops_oldest_past_capacity() {
        let log = NotificationLog::new(2);
        for id in ["1", "2", "3"] {
            log.notify(Notification::success("t", "b").for_class(id));
        }
        let ids: Vec<_> = log
            .recent()
            .into_iter()
            .filter_map(|n| n.class_id)
            .collect();
        assert_eq!(ids, ["2", "3"]);
    }
}
