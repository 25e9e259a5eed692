pub mod booking;
pub mod envelope;
pub mod error;
pub mod i18n;
pub mod lifecycle;
pub mod payment;
pub mod repository;
pub mod search;

pub use booking::{Booking, BookingDetails, BookingStatus, Domain, NewBooking, PaymentStatus};
pub use envelope::Page;
pub use error::{ApiError, ApiResult, ErrorKind, Feedback};
pub use i18n::{Locale, Localize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
