//! In-memory backend fakes shared by the unit tests.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use gotour_core::booking::{BookingDetails, ContactInfo, HotelBooking, TourBooking};
use gotour_core::payment::{
    NewPayment, Payment, PaymentCheck, PaymentGateway, PaymentMethod, PaymentRecordStatus, SePayInfo,
};
use gotour_core::repository::{BookingApi, PageRequest};
use gotour_core::{ApiError, ApiResult, Booking, BookingStatus, Domain, NewBooking, Page, PaymentStatus};
use gotour_shared::Masked;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn contact() -> ContactInfo {
    ContactInfo {
        name: "Pham Thi Dung".to_string(),
        email: Masked::from("dung.pham@example.com"),
        phone: Masked::from("0938123456"),
    }
}

pub fn new_tour() -> NewBooking {
    NewBooking {
        details: BookingDetails::Tour(TourBooking {
            tour_id: "tour-hoian".to_string(),
            tour_name: Some("Hoi An Lantern Walk".to_string()),
            participants: 2,
            start_date: NaiveDate::from_ymd_opt(2024, 9, 2),
        }),
        contact: contact(),
        special_requests: None,
    }
}

/// Backend stand-in that applies the side effects a real server would
#[derive(Default)]
pub struct InMemoryBookingApi {
    bookings: Mutex<Vec<Booking>>,
    failures: Mutex<HashMap<Domain, ApiError>>,
    cancel_sets_payment: Mutex<Option<PaymentStatus>>,
    mutations: AtomicUsize,
    next_id: AtomicUsize,
}

impl InMemoryBookingApi {
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn fail_domain(&self, domain: Domain, error: ApiError) {
        self.failures.lock().unwrap().insert(domain, error);
    }

    pub fn on_cancel_set_payment(&self, status: PaymentStatus) {
        *self.cancel_sets_payment.lock().unwrap() = Some(status);
    }

    pub fn set_payment_status(&self, id: &str, status: PaymentStatus) {
        let _ = self.with_booking(id, |b| b.payment_status = status);
    }

    pub fn insert(&self, booking: Booking) -> Booking {
        self.bookings.lock().unwrap().push(booking.clone());
        booking
    }

    pub fn insert_hotel(&self, id: &str) -> Booking {
        let now = Utc::now();
        self.insert(Booking {
            id: id.to_string(),
            reference: None,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            total_price: 2_400_000.0,
            created_at: now,
            updated_at: now,
            details: BookingDetails::Hotel(HotelBooking {
                hotel_id: "hotel-dalat".to_string(),
                hotel_name: Some("Dalat Pine Hill".to_string()),
                room_id: "room-201".to_string(),
                room_type: Some("Deluxe Double".to_string()),
                check_in: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap_or_default(),
                check_out: NaiveDate::from_ymd_opt(2024, 10, 3).unwrap_or_default(),
                guests: 2,
            }),
            contact: contact(),
            special_requests: None,
            cancel_reason: None,
        })
    }

    fn check_failure(&self, domain: Domain) -> ApiResult<()> {
        match self.failures.lock().unwrap().get(&domain) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn with_booking(&self, id: &str, f: impl FnOnce(&mut Booking)) -> ApiResult<()> {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        f(booking);
        booking.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl BookingApi for InMemoryBookingApi {
    async fn list_mine(&self, domain: Domain) -> ApiResult<Page<Booking>> {
        self.check_failure(domain)?;
        let items = self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.domain() == domain)
            .cloned()
            .collect();
        Ok(Page::of(items))
    }

    async fn list_all(&self, domain: Domain, _paging: PageRequest) -> ApiResult<Page<Booking>> {
        self.list_mine(domain).await
    }

    async fn get(&self, domain: Domain, id: &str) -> ApiResult<Booking> {
        self.check_failure(domain)?;
        self.bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id && b.domain() == domain)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    async fn create(&self, booking: &NewBooking) -> ApiResult<Booking> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        Ok(self.insert(Booking {
            id: format!("{}-{}", booking.domain(), n),
            reference: Some(format!("GT{:04}", n)),
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            total_price: 1_500_000.0,
            created_at: now,
            updated_at: now,
            details: booking.details.clone(),
            contact: booking.contact.clone(),
            special_requests: booking.special_requests.clone(),
            cancel_reason: None,
        }))
    }

    async fn update_status(&self, _domain: Domain, id: &str, status: BookingStatus) -> ApiResult<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.with_booking(id, |b| b.status = status)
    }

    async fn update_payment_status(&self, _domain: Domain, id: &str, status: PaymentStatus) -> ApiResult<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.with_booking(id, |b| b.payment_status = status)
    }

    async fn cancel(&self, _domain: Domain, id: &str, reason: Option<&str>) -> ApiResult<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let side_effect = *self.cancel_sets_payment.lock().unwrap();
        self.with_booking(id, |b| {
            b.status = BookingStatus::Cancelled;
            b.cancel_reason = reason.map(str::to_string);
            if let Some(payment) = side_effect {
                b.payment_status = payment;
            }
        })
    }

    async fn delete(&self, _domain: Domain, id: &str) -> ApiResult<()> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.bookings.lock().unwrap().retain(|b| b.id != id);
        Ok(())
    }
}

pub fn payment(id: &str, status: PaymentRecordStatus) -> Payment {
    Payment {
        id: id.to_string(),
        booking_id: Some("tour-1".to_string()),
        amount: 1_500_000.0,
        method: PaymentMethod::Sepay,
        status,
        sepay: Some(SePayInfo {
            transaction_id: None,
            qr_code_url: None,
            reference: "GOTOURX7Q2".to_string(),
            webhook_received: status == PaymentRecordStatus::Completed,
        }),
        failure_reason: None,
    }
}

/// Gateway replaying a fixed sequence of check results
pub struct ScriptedGateway {
    script: Mutex<VecDeque<PaymentCheck>>,
    fallback: PaymentCheck,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    pub created: Mutex<Vec<NewPayment>>,
    pub create_response: Mutex<Option<Payment>>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<PaymentCheck>, fallback: PaymentCheck) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            create_response: Mutex::new(None),
        }
    }

    pub fn always_pending() -> Self {
        Self::new(Vec::new(), PaymentCheck::Status(payment("pay-1", PaymentRecordStatus::Pending)))
    }

    /// Each check takes this long to answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_payment(&self, request: &NewPayment) -> ApiResult<Payment> {
        self.created.lock().unwrap().push(request.clone());
        let mut payment = self
            .create_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| payment("pay-1", PaymentRecordStatus::Pending));
        payment.booking_id = Some(request.booking_id.clone());
        payment.amount = request.amount;
        Ok(payment)
    }

    async fn get_payment(&self, payment_id: &str) -> ApiResult<Payment> {
        Ok(payment(payment_id, PaymentRecordStatus::Pending))
    }

    async fn check_status(&self, _payment_id: &str) -> PaymentCheck {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        next.unwrap_or_else(|| self.fallback.clone())
    }
}
