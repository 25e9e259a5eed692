use serde::{Deserialize, Serialize};

use crate::booking::{Booking, BookingStatus, PaymentStatus};
use crate::{CoreError, CoreResult};

/// Status-mutating action issued from a detail view
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Confirm,
    Cancel,
    Complete,
    MarkPaid,
    Refund,
}

impl BookingAction {
    pub const ALL: [BookingAction; 5] = [
        BookingAction::Confirm,
        BookingAction::Cancel,
        BookingAction::Complete,
        BookingAction::MarkPaid,
        BookingAction::Refund,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::Confirm => "confirm",
            BookingAction::Cancel => "cancel",
            BookingAction::Complete => "complete",
            BookingAction::MarkPaid => "mark_paid",
            BookingAction::Refund => "refund",
        }
    }
}

/// Target status for a lifecycle action.
///
/// pending -> confirmed -> completed, and pending|confirmed -> cancelled.
/// Nothing leaves completed or cancelled.
pub fn next_status(current: BookingStatus, action: BookingAction) -> CoreResult<BookingStatus> {
    let target = match action {
        BookingAction::Confirm => BookingStatus::Confirmed,
        BookingAction::Cancel => BookingStatus::Cancelled,
        BookingAction::Complete => BookingStatus::Completed,
        BookingAction::MarkPaid | BookingAction::Refund => {
            return Err(CoreError::ValidationError(format!(
                "{} is a payment action",
                action.as_str()
            )));
        }
    };

    let allowed = matches!(
        (current, action),
        (BookingStatus::Pending, BookingAction::Confirm)
            | (BookingStatus::Pending | BookingStatus::Confirmed, BookingAction::Cancel)
            | (BookingStatus::Confirmed, BookingAction::Complete)
    );

    if !allowed {
        return Err(CoreError::InvalidTransition {
            from: current.to_string(),
            to: target.to_string(),
        });
    }

    Ok(target)
}

/// Transition: pending -> confirmed
pub fn confirm(booking: &Booking) -> CoreResult<BookingStatus> {
    next_status(booking.status, BookingAction::Confirm)
}

/// Transition: pending|confirmed -> cancelled
pub fn cancel(booking: &Booking) -> CoreResult<BookingStatus> {
    next_status(booking.status, BookingAction::Cancel)
}

/// Transition: confirmed -> completed
pub fn complete(booking: &Booking) -> CoreResult<BookingStatus> {
    next_status(booking.status, BookingAction::Complete)
}

/// Payment transition: pending|failed -> paid.
/// A paid booking must have been charged something, and cancelled bookings are not billable.
pub fn mark_paid(booking: &Booking) -> CoreResult<PaymentStatus> {
    if !matches!(booking.payment_status, PaymentStatus::Pending | PaymentStatus::Failed)
        || booking.status == BookingStatus::Cancelled
    {
        return Err(CoreError::InvalidTransition {
            from: booking.payment_status.to_string(),
            to: PaymentStatus::Paid.to_string(),
        });
    }
    if booking.total_price <= 0.0 {
        return Err(CoreError::ValidationError(
            "cannot mark a zero-priced booking as paid".to_string(),
        ));
    }
    Ok(PaymentStatus::Paid)
}

/// Payment transition: paid -> refunded
pub fn refund(booking: &Booking) -> CoreResult<PaymentStatus> {
    if booking.payment_status != PaymentStatus::Paid {
        return Err(CoreError::InvalidTransition {
            from: booking.payment_status.to_string(),
            to: PaymentStatus::Refunded.to_string(),
        });
    }
    Ok(PaymentStatus::Refunded)
}

/// Whether `action` is currently valid for `booking`
pub fn is_allowed(booking: &Booking, action: BookingAction) -> bool {
    match action {
        BookingAction::Confirm => confirm(booking).is_ok(),
        BookingAction::Cancel => cancel(booking).is_ok(),
        BookingAction::Complete => complete(booking).is_ok(),
        BookingAction::MarkPaid => mark_paid(booking).is_ok(),
        BookingAction::Refund => refund(booking).is_ok(),
    }
}

/// Actions valid for the booking's current state, in display order
pub fn available_actions(booking: &Booking) -> Vec<BookingAction> {
    BookingAction::ALL
        .into_iter()
        .filter(|action| is_allowed(booking, *action))
        .collect()
}
