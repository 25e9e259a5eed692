use serde::Serialize;

use crate::i18n::{Locale, Localize};

/// Failure of a backend call, classified for display and retry decisions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("server error (HTTP {0})")]
    Server(u16),
    #[error("session expired, please log in again")]
    Unauthorized,
    #[error("{message}")]
    Validation { status: u16, message: String },
    #[error("{0}")]
    Application(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Error category shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network, timeout, 5xx: user may retry
    Transient,
    /// 401: local session is gone
    Auth,
    /// 4xx with message or `success:false`: show verbatim
    Validation,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network(_) | ApiError::Timeout | ApiError::Server(_) | ApiError::Malformed(_) => {
                ErrorKind::Transient
            }
            ApiError::Unauthorized => ErrorKind::Auth,
            ApiError::Validation { .. } | ApiError::Application(_) | ApiError::NotFound(_) => {
                ErrorKind::Validation
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Message for inline display. Backend messages pass through verbatim;
    /// transport failures get a generic localized text.
    pub fn user_message(&self, locale: Locale) -> String {
        match self {
            ApiError::Validation { message, .. } | ApiError::Application(message) => message.clone(),
            ApiError::NotFound(_) => crate::i18n::not_found(locale).to_string(),
            _ => self.kind().label(locale).to_string(),
        }
    }
}

/// Uniform `{success, message}` shape rendered inline by views
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub success: bool,
    pub message: Option<String>,
    pub kind: Option<ErrorKind>,
}

impl Feedback {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            kind: None,
        }
    }

    pub fn from_error(error: &ApiError, locale: Locale) -> Self {
        Self {
            success: false,
            message: Some(error.user_message(locale)),
            kind: Some(error.kind()),
        }
    }

    pub fn from_result<T>(result: &ApiResult<T>, locale: Locale) -> Self {
        match result {
            Ok(_) => Self {
                success: true,
                message: None,
                kind: None,
            },
            Err(e) => Self::from_error(e, locale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::Server(503).is_retryable());
        assert_eq!(ApiError::Unauthorized.kind(), ErrorKind::Auth);
        assert!(!ApiError::Application("sold out".into()).is_retryable());
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = ApiError::Validation {
            status: 422,
            message: "Room is no longer available".into(),
        };
        let feedback = Feedback::from_error(&err, Locale::Vi);
        assert!(!feedback.success);
        assert_eq!(feedback.message.as_deref(), Some("Room is no longer available"));
        assert_eq!(feedback.kind, Some(ErrorKind::Validation));
    }

    #[test]
    fn test_transient_message_is_generic() {
        let result: ApiResult<()> = Err(ApiError::Network("connection refused".into()));
        let feedback = Feedback::from_result(&result, Locale::En);
        assert_eq!(
            feedback.message.as_deref(),
            Some(ErrorKind::Transient.label(Locale::En))
        );
    }
}
