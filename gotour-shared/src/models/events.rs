use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A booking moved between lifecycle or payment states.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingStatusChanged {
    pub event_id: Uuid,
    pub booking_id: String,
    pub domain: String,
    pub from: String,
    pub to: String,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl BookingStatusChanged {
    pub fn new(booking_id: &str, domain: &str, from: &str, to: &str, reason: Option<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            booking_id: booking_id.to_string(),
            domain: domain.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            reason,
            timestamp: Utc::now(),
        }
    }
}

/// A polled payment reached a terminal state.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct PaymentResolved {
    pub event_id: Uuid,
    pub payment_id: String,
    pub booking_id: Option<String>,
    pub status: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

impl PaymentResolved {
    pub fn new(payment_id: &str, booking_id: Option<String>, status: &str, amount: f64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            payment_id: payment_id.to_string(),
            booking_id,
            status: status.to_string(),
            amount,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    BookingStatusChanged(BookingStatusChanged),
    PaymentResolved(PaymentResolved),
}
