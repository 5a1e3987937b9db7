//! Notification service implementation
//!
//! User-visible, fire-and-forget notifications. The service fans each
//! notification out to pluggable sinks; production wires a tracing sink,
//! tests register a recording sink to assert on deliveries.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::utils::logging::log_notification;

/// Visual weight of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationVariant {
    Normal,
    Destructive,
}

/// A user-visible notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

/// Delivery target for notifications
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, notification: &Notification);
}

/// Default sink: structured log records
struct TracingSink;

impl NotificationSink for TracingSink {
    fn deliver(&self, notification: &Notification) {
        log_notification(
            &notification.title,
            notification.variant == NotificationVariant::Destructive,
        );
    }
}

/// Delivery counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationStats {
    pub total_delivered: u64,
    pub destructive_delivered: u64,
}

/// Notification service for user-facing messages
#[derive(Clone)]
pub struct NotificationService {
    sinks: Arc<Vec<Box<dyn NotificationSink>>>,
    stats: Arc<Mutex<NotificationStats>>,
}

impl NotificationService {
    /// Create a service delivering to the default tracing sink
    pub fn new() -> Self {
        Self::with_sinks(vec![Box::new(TracingSink)])
    }

    /// Create a service delivering to the given sinks
    pub fn with_sinks(sinks: Vec<Box<dyn NotificationSink>>) -> Self {
        Self {
            sinks: Arc::new(sinks),
            stats: Arc::new(Mutex::new(NotificationStats::default())),
        }
    }

    /// Deliver a notification to every sink. Fire-and-forget: sinks cannot
    /// fail the caller.
    pub fn notify(&self, notification: Notification) {
        for sink in self.sinks.iter() {
            sink.deliver(&notification);
        }

        let mut stats = self.stats.lock().unwrap();
        stats.total_delivered += 1;
        if notification.variant == NotificationVariant::Destructive {
            stats.destructive_delivered += 1;
        }
    }

    /// Delivery counters since startup
    pub fn stats(&self) -> NotificationStats {
        self.stats.lock().unwrap().clone()
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

/// Sink that records deliveries for inspection; intended for tests
#[derive(Clone, Default)]
pub struct RecordingSink {
    delivered: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, notification: &Notification) {
        self.delivered.lock().unwrap().push(notification.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_counts_by_variant() {
        let service = NotificationService::new();
        service.notify(Notification {
            title: "Event created".to_string(),
            description: "Your new event has been successfully added.".to_string(),
            variant: NotificationVariant::Normal,
        });
        service.notify(Notification {
            title: "Delete failed".to_string(),
            description: "The event could not be deleted.".to_string(),
            variant: NotificationVariant::Destructive,
        });

        let stats = service.stats();
        assert_eq!(stats.total_delivered, 2);
        assert_eq!(stats.destructive_delivered, 1);
    }

    #[test]
    fn test_recording_sink_captures_deliveries() {
        let sink = RecordingSink::new();
        let service = NotificationService::with_sinks(vec![Box::new(sink.clone())]);

        service.notify(Notification {
            title: "Logged in successfully".to_string(),
            description: "Welcome back to Spartanville!".to_string(),
            variant: NotificationVariant::Normal,
        });

        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].title, "Logged in successfully");
    }
}
