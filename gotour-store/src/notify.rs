use chrono::{DateTime, Utc};
use gotour_shared::models::DomainEvent;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A user-facing message, plus the domain event that caused it if any
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
    pub event: Option<DomainEvent>,
    pub at: DateTime<Utc>,
}

/// Notification queue with an explicit subscribe API
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.publish(level, message.into(), None);
    }

    pub fn emit(&self, level: NotificationLevel, message: impl Into<String>, event: DomainEvent) {
        self.publish(level, message.into(), Some(event));
    }

    fn publish(&self, level: NotificationLevel, message: String, event: Option<DomainEvent>) {
        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            message,
            event,
            at: Utc::now(),
        };
        // No subscribers is fine: nobody is looking at the screen
        if self.tx.send(notification).is_err() {
            debug!("Notification dropped, no subscribers");
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotour_shared::models::BookingStatusChanged;

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();

        notifier.notify(NotificationLevel::Info, "first");
        notifier.emit(
            NotificationLevel::Success,
            "second",
            DomainEvent::BookingStatusChanged(BookingStatusChanged::new(
                "b1", "hotel", "pending", "confirmed", None,
            )),
        );

        let first = rx.recv().await.unwrap();
        assert_eq!(first.message, "first");
        assert!(first.event.is_none());

        let second = rx.recv().await.unwrap();
        assert_eq!(second.level, NotificationLevel::Success);
        assert!(matches!(second.event, Some(DomainEvent::BookingStatusChanged(_))));
    }

    #[test]
    fn test_notify_without_subscribers_is_silent() {
        Notifier::new(4).notify(NotificationLevel::Error, "nobody listening");
    }
}
