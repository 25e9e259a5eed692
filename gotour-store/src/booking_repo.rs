use async_trait::async_trait;
use gotour_core::envelope::{self, Page};
use gotour_core::repository::{BookingApi, PageRequest};
use gotour_core::{ApiError, ApiResult, Booking, BookingStatus, Domain, NewBooking, PaymentStatus};
use serde_json::{json, Value};
use tracing::info;

use crate::http::ApiClient;

/// REST-backed booking collections (`/{domain}-bookings`)
#[derive(Clone)]
pub struct HttpBookingApi {
    client: ApiClient,
}

impl HttpBookingApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

fn decode_page(domain: Domain, body: &Value) -> ApiResult<Page<Booking>> {
    let page = envelope::normalize(body).into_result()?;
    Ok(page.decode_with(|raw| Booking::from_value(domain, raw)))
}

/// Mutation responses only matter when they carry a failure flag
fn acknowledge(body: &Value) -> ApiResult<()> {
    match envelope::failure_message(body) {
        Some(message) => Err(ApiError::Application(message)),
        None => Ok(()),
    }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn list_mine(&self, domain: Domain) -> ApiResult<Page<Booking>> {
        let body = self.client.get(&format!("{}/me", domain.collection())).await?;
        decode_page(domain, &body)
    }

    async fn list_all(&self, domain: Domain, paging: PageRequest) -> ApiResult<Page<Booking>> {
        let body = self
            .client
            .get_with_query(&domain.collection(), &paging)
            .await?;
        decode_page(domain, &body)
    }

    async fn get(&self, domain: Domain, id: &str) -> ApiResult<Booking> {
        let body = self.client.get(&format!("{}/{}", domain.collection(), id)).await?;
        decode_page(domain, &body)?
            .into_first()
            .ok_or_else(|| ApiError::NotFound(format!("{} booking {}", domain, id)))
    }

    async fn create(&self, booking: &NewBooking) -> ApiResult<Booking> {
        let domain = booking.domain();
        let body = self.client.post(&domain.collection(), booking).await?;
        let created = decode_page(domain, &body)?
            .into_first()
            .ok_or_else(|| ApiError::Malformed("create returned no booking".to_string()))?;
        info!("Created {} booking {}", domain, created.id);
        Ok(created)
    }

    async fn update_status(&self, domain: Domain, id: &str, status: BookingStatus) -> ApiResult<()> {
        let body = self
            .client
            .put(&format!("{}/{}", domain.collection(), id), &json!({ "status": status }))
            .await?;
        acknowledge(&body)
    }

    async fn update_payment_status(&self, domain: Domain, id: &str, status: PaymentStatus) -> ApiResult<()> {
        let body = self
            .client
            .put(&format!("{}/{}", domain.collection(), id), &json!({ "paymentStatus": status }))
            .await?;
        acknowledge(&body)
    }

    async fn cancel(&self, domain: Domain, id: &str, reason: Option<&str>) -> ApiResult<()> {
        let body = self
            .client
            .put(
                &format!("{}/{}/cancel", domain.collection(), id),
                &json!({ "reason": reason.unwrap_or_default() }),
            )
            .await?;
        acknowledge(&body)
    }

    async fn delete(&self, domain: Domain, id: &str) -> ApiResult<()> {
        let body = self.client.delete(&format!("{}/{}", domain.collection(), id)).await?;
        acknowledge(&body)
    }
}
