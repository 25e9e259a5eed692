use async_trait::async_trait;
use gotour_core::envelope;
use gotour_core::payment::{NewPayment, Payment, PaymentCheck, PaymentGateway, PaymentRecordStatus, RetryReason};
use gotour_core::{ApiError, ApiResult};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::http::ApiClient;

/// Payments endpoint (`/payments`), including the SePay status check
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: ApiClient,
}

impl HttpPaymentGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

fn decode_payment(body: &Value) -> ApiResult<Payment> {
    let raw = envelope::normalize(body)
        .into_result()?
        .into_first()
        .ok_or_else(|| ApiError::Malformed("no payment in response".to_string()))?;
    serde_json::from_value(raw).map_err(|e| ApiError::Malformed(e.to_string()))
}

/// `{"status": "failed"}` with no envelope flags is the record's status, not an
/// envelope error
fn bare_status(body: &Value) -> Option<Value> {
    let obj = body.as_object()?;
    if obj.contains_key("success") || obj.contains_key("data") {
        return None;
    }
    let status = obj.get("status")?;
    serde_json::from_value::<PaymentRecordStatus>(status.clone()).ok()?;
    Some(body.clone())
}

/// The check endpoint often returns a partial record; fill what the poll already knows
fn decode_check(payment_id: &str, body: &Value) -> Option<Payment> {
    let mut raw = match bare_status(body) {
        Some(raw) => raw,
        None => envelope::normalize(body).into_result().ok()?.into_first()?,
    };
    let obj = raw.as_object_mut()?;
    if !obj.contains_key("id") && !obj.contains_key("_id") {
        obj.insert("id".to_string(), Value::String(payment_id.to_string()));
    }
    if !obj.contains_key("method") && !obj.contains_key("paymentMethod") {
        obj.insert("method".to_string(), Value::String("sepay".to_string()));
    }
    obj.entry("amount").or_insert(Value::from(0));

    match serde_json::from_value(raw) {
        Ok(payment) => Some(payment),
        Err(e) => {
            warn!("Undecodable payment check for {}: {}", payment_id, e);
            None
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment(&self, request: &NewPayment) -> ApiResult<Payment> {
        let body = self.client.post("payments", request).await?;
        let payment = decode_payment(&body)?;
        info!("Created payment {} for booking {}", payment.id, request.booking_id);
        Ok(payment)
    }

    async fn get_payment(&self, payment_id: &str) -> ApiResult<Payment> {
        let body = self.client.get(&format!("payments/{}", payment_id)).await?;
        decode_payment(&body)
    }

    async fn check_status(&self, payment_id: &str) -> PaymentCheck {
        let request = self
            .client
            .request(Method::GET, &format!("payments/{}/check", payment_id));

        let (status, body) = match self.client.send(request).await {
            Ok(response) => response,
            Err(e) => return PaymentCheck::Retry(RetryReason::from(e)),
        };

        // A usable record wins regardless of HTTP status
        if let Some(payment) = decode_check(payment_id, &body) {
            debug!("Payment {} is {}", payment_id, payment.status.as_str());
            return PaymentCheck::Status(payment);
        }

        if !status.is_success() {
            return PaymentCheck::Retry(RetryReason::Http(status.as_u16()));
        }
        let message = envelope::failure_message(&body).unwrap_or_else(|| envelope::MALFORMED_MESSAGE.to_string());
        PaymentCheck::Retry(RetryReason::Malformed(message))
    }
}
