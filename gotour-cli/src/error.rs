use gotour_core::i18n::{self, Localize};
use gotour_core::payment::RetryReason;
use gotour_core::{ApiError, ErrorKind, Locale};
use gotour_order::BookingError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Payment {payment_id} did not resolve")]
    PaymentUnresolved {
        payment_id: String,
        /// Why the last check failed, if it did
        last: Option<RetryReason>,
    },

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        CliError::Booking(BookingError::Api(err))
    }
}

impl CliError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CliError::Booking(e) if e.is_unauthorized())
    }

    /// 2 for auth, 3 for an unresolved payment, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        match self {
            _ if self.is_unauthorized() => 2,
            CliError::PaymentUnresolved { .. } => 3,
            _ => 1,
        }
    }

    /// Line printed to stderr before exiting
    pub fn message(&self, locale: Locale) -> String {
        match self {
            _ if self.is_unauthorized() => format!(
                "{} Sign in again with --token or GOTOUR__AUTH__TOKEN.",
                ErrorKind::Auth.label(locale)
            ),
            CliError::Booking(e) => e
                .feedback(locale)
                .message
                .unwrap_or_else(|| e.to_string()),
            CliError::PaymentUnresolved { last, .. } => i18n::unresolved_message(last.as_ref(), locale).to_string(),
            CliError::Io(e) => e.to_string(),
        }
    }
}
