//! Presentation labels. Logic works on the enums only; this table is the
//! single place English and Vietnamese display strings live.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::booking::{BookingStatus, Domain, PaymentStatus};
use crate::error::ErrorKind;
use crate::lifecycle::BookingAction;
use crate::payment::{PaymentFailure, PaymentRecordStatus, RetryReason};
use crate::CoreError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Vi,
}

impl FromStr for Locale {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" => Ok(Locale::En),
            "vi" | "vi-vn" => Ok(Locale::Vi),
            other => Err(CoreError::ValidationError(format!("unsupported locale: {}", other))),
        }
    }
}

pub trait Localize {
    fn label(&self, locale: Locale) -> &'static str;
}

impl Localize for BookingStatus {
    fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (BookingStatus::Pending, Locale::En) => "Pending",
            (BookingStatus::Pending, Locale::Vi) => "Chờ xác nhận",
            (BookingStatus::Confirmed, Locale::En) => "Confirmed",
            (BookingStatus::Confirmed, Locale::Vi) => "Đã xác nhận",
            (BookingStatus::Completed, Locale::En) => "Completed",
            (BookingStatus::Completed, Locale::Vi) => "Hoàn thành",
            (BookingStatus::Cancelled, Locale::En) => "Cancelled",
            (BookingStatus::Cancelled, Locale::Vi) => "Đã hủy",
        }
    }
}

impl Localize for PaymentStatus {
    fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (PaymentStatus::Pending, Locale::En) => "Awaiting payment",
            (PaymentStatus::Pending, Locale::Vi) => "Chờ thanh toán",
            (PaymentStatus::Paid, Locale::En) => "Paid",
            (PaymentStatus::Paid, Locale::Vi) => "Đã thanh toán",
            (PaymentStatus::Failed, Locale::En) => "Payment failed",
            (PaymentStatus::Failed, Locale::Vi) => "Thanh toán thất bại",
            (PaymentStatus::Refunded, Locale::En) => "Refunded",
            (PaymentStatus::Refunded, Locale::Vi) => "Đã hoàn tiền",
        }
    }
}

impl Localize for PaymentRecordStatus {
    fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (PaymentRecordStatus::Pending, Locale::En) => "Waiting for transfer",
            (PaymentRecordStatus::Pending, Locale::Vi) => "Đang chờ chuyển khoản",
            (PaymentRecordStatus::Completed, Locale::En) => "Payment received",
            (PaymentRecordStatus::Completed, Locale::Vi) => "Đã nhận thanh toán",
            (PaymentRecordStatus::Failed, Locale::En) => "Payment failed",
            (PaymentRecordStatus::Failed, Locale::Vi) => "Thanh toán thất bại",
            (PaymentRecordStatus::Refunded, Locale::En) => "Refunded",
            (PaymentRecordStatus::Refunded, Locale::Vi) => "Đã hoàn tiền",
        }
    }
}

impl Localize for Domain {
    fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Domain::Tour, Locale::En) => "Tour",
            (Domain::Tour, Locale::Vi) => "Tour du lịch",
            (Domain::Hotel, Locale::En) => "Hotel",
            (Domain::Hotel, Locale::Vi) => "Khách sạn",
            (Domain::Flight, Locale::En) => "Flight",
            (Domain::Flight, Locale::Vi) => "Chuyến bay",
        }
    }
}

impl Localize for BookingAction {
    fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (BookingAction::Confirm, Locale::En) => "Confirm",
            (BookingAction::Confirm, Locale::Vi) => "Xác nhận",
            (BookingAction::Cancel, Locale::En) => "Cancel",
            (BookingAction::Cancel, Locale::Vi) => "Hủy",
            (BookingAction::Complete, Locale::En) => "Mark completed",
            (BookingAction::Complete, Locale::Vi) => "Hoàn thành",
            (BookingAction::MarkPaid, Locale::En) => "Mark paid",
            (BookingAction::MarkPaid, Locale::Vi) => "Đánh dấu đã thanh toán",
            (BookingAction::Refund, Locale::En) => "Refund",
            (BookingAction::Refund, Locale::Vi) => "Hoàn tiền",
        }
    }
}

impl Localize for ErrorKind {
    fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (ErrorKind::Transient, Locale::En) => "Connection problem, please try again.",
            (ErrorKind::Transient, Locale::Vi) => "Lỗi kết nối, vui lòng thử lại.",
            (ErrorKind::Auth, Locale::En) => "Your session has expired. Please log in again.",
            (ErrorKind::Auth, Locale::Vi) => "Phiên đăng nhập đã hết hạn. Vui lòng đăng nhập lại.",
            (ErrorKind::Validation, Locale::En) => "The request was rejected.",
            (ErrorKind::Validation, Locale::Vi) => "Yêu cầu không hợp lệ.",
        }
    }
}

impl Localize for PaymentFailure {
    fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (PaymentFailure::WrongAmount, Locale::En) => "The transferred amount does not match the booking total.",
            (PaymentFailure::WrongAmount, Locale::Vi) => "Số tiền chuyển khoản không khớp với tổng tiền đặt chỗ.",
            (PaymentFailure::QrExpired, Locale::En) => "The payment QR code has expired. Please create a new one.",
            (PaymentFailure::QrExpired, Locale::Vi) => "Mã QR thanh toán đã hết hạn. Vui lòng tạo mã mới.",
            (PaymentFailure::Other, Locale::En) => "The payment could not be completed.",
            (PaymentFailure::Other, Locale::Vi) => "Không thể hoàn tất thanh toán.",
        }
    }
}

pub fn not_found(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Booking not found.",
        Locale::Vi => "Không tìm thấy đặt chỗ.",
    }
}

/// Shown when polling gave up before the payment resolved
pub fn payment_unresolved(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "We have not received your payment yet. Check again in a moment.",
        Locale::Vi => "Chưa nhận được thanh toán. Vui lòng kiểm tra lại sau.",
    }
}

/// Message for a poll that ended without a terminal status, given the last
/// check failure. Connection trouble reads differently from a payment that
/// simply has not arrived.
pub fn unresolved_message(last: Option<&RetryReason>, locale: Locale) -> &'static str {
    match last {
        Some(reason) if reason.is_connection() => ErrorKind::Transient.label(locale),
        _ => payment_unresolved(locale),
    }
}

/// VND amount with thousands separators, e.g. `2.999.999 ₫` / `2,999,999 VND`
pub fn format_vnd(amount: f64, locale: Locale) -> String {
    let whole = amount.round().max(0.0) as u64;
    let digits = whole.to_string();
    let sep = match locale {
        Locale::En => ',',
        Locale::Vi => '.',
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(sep);
        }
        grouped.push(c);
    }
    match locale {
        Locale::En => format!("{} VND", grouped),
        Locale::Vi => format!("{} ₫", grouped),
    }
}
