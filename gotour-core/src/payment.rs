use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::booking::Domain;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[serde(alias = "bank-transfer")]
    BankTransfer,
    #[serde(alias = "sePay", alias = "SePay")]
    Sepay,
    Cash,
    Card,
}

/// Status of the payment record, distinct from the booking's payment flag
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRecordStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentRecordStatus::Pending => "pending",
            PaymentRecordStatus::Completed => "completed",
            PaymentRecordStatus::Failed => "failed",
            PaymentRecordStatus::Refunded => "refunded",
        }
    }

    /// Polling stops once a payment reaches one of these
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentRecordStatus::Pending)
    }
}

/// SePay bank-transfer details. `reference` must appear in the transfer memo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SePayInfo {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub qr_code_url: Option<String>,
    pub reference: String,
    #[serde(default)]
    pub webhook_received: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub booking_id: Option<String>,
    pub amount: f64,
    #[serde(alias = "paymentMethod")]
    pub method: PaymentMethod,
    #[serde(default)]
    pub status: PaymentRecordStatus,
    #[serde(default, alias = "sePayInfo")]
    pub sepay: Option<SePayInfo>,
    #[serde(default, alias = "message")]
    pub failure_reason: Option<String>,
}

impl Payment {
    /// Application-level failure category, if the payment failed
    pub fn failure(&self) -> Option<PaymentFailure> {
        if self.status != PaymentRecordStatus::Failed {
            return None;
        }
        Some(
            self.failure_reason
                .as_deref()
                .map(PaymentFailure::classify)
                .unwrap_or(PaymentFailure::Other),
        )
    }
}

/// Why a SePay payment failed on the application side
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFailure {
    WrongAmount,
    QrExpired,
    Other,
}

impl PaymentFailure {
    pub fn classify(reason: &str) -> Self {
        let reason = reason.to_lowercase();
        if reason.contains("amount") || reason.contains("số tiền") {
            PaymentFailure::WrongAmount
        } else if reason.contains("expire") || reason.contains("hết hạn") {
            PaymentFailure::QrExpired
        } else {
            PaymentFailure::Other
        }
    }
}

/// Why a status check produced no usable answer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum RetryReason {
    Network(String),
    Timeout,
    Http(u16),
    Malformed(String),
    Unauthorized,
}

impl RetryReason {
    /// The backend could not be reached or answered with an HTTP error
    pub fn is_connection(&self) -> bool {
        matches!(self, RetryReason::Network(_) | RetryReason::Timeout | RetryReason::Http(_))
    }
}

impl From<ApiError> for RetryReason {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Timeout => RetryReason::Timeout,
            ApiError::Network(msg) => RetryReason::Network(msg),
            ApiError::Server(status) => RetryReason::Http(status),
            ApiError::Validation { status, .. } => RetryReason::Http(status),
            ApiError::Unauthorized => RetryReason::Unauthorized,
            ApiError::NotFound(_) => RetryReason::Http(404),
            ApiError::Malformed(msg) | ApiError::Application(msg) => RetryReason::Malformed(msg),
        }
    }
}

/// Result of one payment status check. Never an error: the caller polls on a timer.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentCheck {
    Status(Payment),
    Retry(RetryReason),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub booking_id: String,
    pub booking_type: Domain,
    pub amount: f64,
    pub method: PaymentMethod,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a payment for a booking
    async fn create_payment(&self, request: &NewPayment) -> ApiResult<Payment>;

    /// Fetch a payment record
    async fn get_payment(&self, payment_id: &str) -> ApiResult<Payment>;

    /// Poll-safe status read
    async fn check_status(&self, payment_id: &str) -> PaymentCheck;
}
