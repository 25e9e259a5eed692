use async_trait::async_trait;
use serde::Serialize;

use crate::booking::{Booking, BookingStatus, Domain, NewBooking, PaymentStatus};
use crate::envelope::Page;
use crate::error::ApiResult;

/// Paging for the admin list
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

/// Backend access for one booking collection per domain
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Caller's own bookings
    async fn list_mine(&self, domain: Domain) -> ApiResult<Page<Booking>>;

    /// Every booking in a domain (admin)
    async fn list_all(&self, domain: Domain, paging: PageRequest) -> ApiResult<Page<Booking>>;

    async fn get(&self, domain: Domain, id: &str) -> ApiResult<Booking>;

    async fn create(&self, booking: &NewBooking) -> ApiResult<Booking>;

    /// Admin status transition
    async fn update_status(&self, domain: Domain, id: &str, status: BookingStatus) -> ApiResult<()>;

    /// Admin payment flag update
    async fn update_payment_status(&self, domain: Domain, id: &str, status: PaymentStatus) -> ApiResult<()>;

    /// User-initiated cancellation
    async fn cancel(&self, domain: Domain, id: &str, reason: Option<&str>) -> ApiResult<()>;

    /// Hard delete (admin only, outside the normal lifecycle)
    async fn delete(&self, domain: Domain, id: &str) -> ApiResult<()>;
}
