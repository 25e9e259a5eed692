pub mod events;

pub use events::{BookingStatusChanged, DomainEvent, PaymentResolved};
