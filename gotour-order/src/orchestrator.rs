use gotour_core::lifecycle;
use gotour_core::payment::{NewPayment, PaymentGateway, PaymentMethod};
use gotour_core::{ApiError, Booking};
use gotour_store::app_config::SePayConfig;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::manager::BookingError;
use crate::poller::{PaymentPoller, PollHandle};

/// What the customer needs to complete a SePay bank transfer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInstructions {
    pub payment_id: String,
    pub booking_id: String,
    /// Must appear verbatim in the transfer memo
    pub reference: String,
    pub amount: f64,
    pub qr_url: Option<String>,
}

pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    sepay: SePayConfig,
    poller: PaymentPoller,
}

impl PaymentOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGateway>, sepay: SePayConfig, poller: PaymentPoller) -> Self {
        Self {
            gateway,
            sepay,
            poller,
        }
    }

    /// Open a SePay payment for a booking and return the transfer details
    pub async fn start_sepay_checkout(&self, booking: &Booking) -> Result<CheckoutInstructions, BookingError> {
        // Same preconditions as marking the booking paid
        lifecycle::mark_paid(booking)?;

        let request = NewPayment {
            booking_id: booking.id.clone(),
            booking_type: booking.domain(),
            amount: booking.total_price,
            method: PaymentMethod::Sepay,
        };
        let created = self.gateway.create_payment(&request).await?;

        let sepay = created
            .sepay
            .ok_or_else(|| ApiError::Malformed("payment has no SePay details".to_string()))?;
        if sepay.reference.trim().is_empty() {
            return Err(ApiError::Malformed("payment has an empty SePay reference".to_string()).into());
        }

        let qr_url = sepay.qr_code_url.clone().or_else(|| self.sepay.qr_url(created.amount, &sepay.reference));

        info!(
            "SePay payment {} opened for booking {} (ref {})",
            created.id, booking.id, sepay.reference
        );

        Ok(CheckoutInstructions {
            payment_id: created.id,
            booking_id: booking.id.clone(),
            reference: sepay.reference,
            amount: created.amount,
            qr_url,
        })
    }

    /// Start polling the payment; drop or stop the handle to cancel
    pub fn watch(&self, payment_id: &str) -> PollHandle {
        self.poller.spawn(payment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::{PollConfig, PollOutcome};
    use crate::testing::{payment, InMemoryBookingApi, ScriptedGateway};
    use gotour_core::payment::{PaymentCheck, PaymentRecordStatus};
    use gotour_core::{BookingStatus, CoreError, Domain, PaymentStatus};
    use std::time::Duration;

    fn orchestrator(gateway: Arc<ScriptedGateway>, sepay: SePayConfig) -> PaymentOrchestrator {
        let poller = PaymentPoller::new(
            gateway.clone(),
            PollConfig {
                interval: Duration::from_secs(5),
                timeout: Duration::from_secs(60),
            },
        );
        PaymentOrchestrator::new(gateway, sepay, poller)
    }

    fn with_account() -> SePayConfig {
        SePayConfig {
            account_number: "0123456789".to_string(),
            bank: "MBBank".to_string(),
            ..SePayConfig::default()
        }
    }

    #[tokio::test]
    async fn test_checkout_builds_qr_from_reference() {
        let gateway = Arc::new(ScriptedGateway::always_pending());
        let booking = InMemoryBookingApi::default().insert_hotel("h-1");

        let checkout = orchestrator(gateway.clone(), with_account())
            .start_sepay_checkout(&booking)
            .await
            .unwrap();

        assert_eq!(checkout.reference, "GOTOURX7Q2");
        assert_eq!(checkout.amount, 2_400_000.0);
        assert_eq!(
            checkout.qr_url.as_deref(),
            Some("https://qr.sepay.vn/img?acc=0123456789&bank=MBBank&amount=2400000&des=GOTOURX7Q2")
        );

        let created = gateway.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].booking_type, Domain::Hotel);
        assert_eq!(created[0].method, PaymentMethod::Sepay);
    }

    #[tokio::test]
    async fn test_backend_qr_wins() {
        let gateway = Arc::new(ScriptedGateway::always_pending());
        let mut issued = payment("pay-9", PaymentRecordStatus::Pending);
        if let Some(info) = issued.sepay.as_mut() {
            info.qr_code_url = Some("https://qr.example/pay-9.png".to_string());
        }
        *gateway.create_response.lock().unwrap() = Some(issued);
        let booking = InMemoryBookingApi::default().insert_hotel("h-1");

        let checkout = orchestrator(gateway, SePayConfig::default())
            .start_sepay_checkout(&booking)
            .await
            .unwrap();
        assert_eq!(checkout.payment_id, "pay-9");
        assert_eq!(checkout.qr_url.as_deref(), Some("https://qr.example/pay-9.png"));
    }

    #[tokio::test]
    async fn test_no_qr_without_account() {
        let gateway = Arc::new(ScriptedGateway::always_pending());
        let booking = InMemoryBookingApi::default().insert_hotel("h-1");

        let checkout = orchestrator(gateway, SePayConfig::default())
            .start_sepay_checkout(&booking)
            .await
            .unwrap();
        assert!(checkout.qr_url.is_none());
    }

    #[tokio::test]
    async fn test_refuses_unbillable_bookings() {
        let gateway = Arc::new(ScriptedGateway::always_pending());
        let orchestrator = orchestrator(gateway.clone(), with_account());
        let api = InMemoryBookingApi::default();

        let mut cancelled = api.insert_hotel("h-1");
        cancelled.status = BookingStatus::Cancelled;
        let err = orchestrator.start_sepay_checkout(&cancelled).await.unwrap_err();
        assert!(err.is_invalid_transition());

        let mut paid = api.insert_hotel("h-2");
        paid.payment_status = PaymentStatus::Paid;
        assert!(orchestrator.start_sepay_checkout(&paid).await.unwrap_err().is_invalid_transition());

        let mut free = api.insert_hotel("h-3");
        free.total_price = 0.0;
        assert!(matches!(
            orchestrator.start_sepay_checkout(&free).await,
            Err(BookingError::Core(CoreError::ValidationError(_)))
        ));

        assert!(gateway.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_reference_is_malformed() {
        let gateway = Arc::new(ScriptedGateway::always_pending());
        let mut issued = payment("pay-9", PaymentRecordStatus::Pending);
        issued.sepay = None;
        *gateway.create_response.lock().unwrap() = Some(issued);
        let booking = InMemoryBookingApi::default().insert_hotel("h-1");

        let err = orchestrator(gateway, with_account())
            .start_sepay_checkout(&booking)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Api(ApiError::Malformed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_resolves() {
        let gateway = Arc::new(ScriptedGateway::new(
            vec![PaymentCheck::Status(payment("pay-1", PaymentRecordStatus::Completed))],
            PaymentCheck::Status(payment("pay-1", PaymentRecordStatus::Pending)),
        ));
        let outcome = orchestrator(gateway, with_account()).watch("pay-1").outcome().await;
        assert!(matches!(outcome, PollOutcome::Resolved(_)));
    }
}
