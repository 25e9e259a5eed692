use chrono::{DateTime, NaiveDate, Utc};
use gotour_shared::Masked;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{CoreError, CoreResult};

/// Resource domain a booking belongs to. Selects the API collection and render path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Tour,
    Hotel,
    Flight,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Tour, Domain::Hotel, Domain::Flight];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Tour => "tour",
            Domain::Hotel => "hotel",
            Domain::Flight => "flight",
        }
    }

    /// REST collection path, e.g. `tour-bookings`
    pub fn collection(&self) -> String {
        format!("{}-bookings", self.as_str())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tour" | "tours" => Ok(Domain::Tour),
            "hotel" | "hotels" => Ok(Domain::Hotel),
            "flight" | "flights" => Ok(Domain::Flight),
            other => Err(CoreError::ValidationError(format!("unknown domain: {}", other))),
        }
    }
}

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            other => Err(CoreError::ValidationError(format!("unknown booking status: {}", other))),
        }
    }
}

/// Payment status as tracked on the booking itself
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(alias = "fullName")]
    pub name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TourBooking {
    pub tour_id: String,
    #[serde(default)]
    pub tour_name: Option<String>,
    #[serde(alias = "numberOfParticipants")]
    pub participants: u32,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HotelBooking {
    pub hotel_id: String,
    #[serde(default)]
    pub hotel_name: Option<String>,
    pub room_id: String,
    #[serde(default)]
    pub room_type: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_guests")]
    pub guests: u32,
}

fn default_guests() -> u32 {
    1
}

impl HotelBooking {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    #[serde(alias = "name")]
    pub full_name: String,
    #[serde(default)]
    pub seat: Option<String>,
    #[serde(default)]
    pub meal: Option<String>,
    #[serde(default)]
    pub baggage_kg: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlightBooking {
    pub flight_id: String,
    #[serde(default)]
    pub flight_number: Option<String>,
    pub passengers: Vec<Passenger>,
}

/// Domain payload. A booking references exactly one resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "domain", rename_all = "lowercase")]
pub enum BookingDetails {
    Tour(TourBooking),
    Hotel(HotelBooking),
    Flight(FlightBooking),
}

impl BookingDetails {
    pub fn domain(&self) -> Domain {
        match self {
            BookingDetails::Tour(_) => Domain::Tour,
            BookingDetails::Hotel(_) => Domain::Hotel,
            BookingDetails::Flight(_) => Domain::Flight,
        }
    }

    /// Id of the booked resource (tour, hotel or flight)
    pub fn resource_id(&self) -> &str {
        match self {
            BookingDetails::Tour(t) => &t.tour_id,
            BookingDetails::Hotel(h) => &h.hotel_id,
            BookingDetails::Flight(f) => &f.flight_id,
        }
    }

    fn validate(&self) -> CoreResult<()> {
        match self {
            BookingDetails::Tour(t) => {
                if t.participants == 0 {
                    return Err(CoreError::ValidationError("participants must be at least 1".into()));
                }
            }
            BookingDetails::Hotel(h) => {
                if h.check_out <= h.check_in {
                    return Err(CoreError::ValidationError("check-out must be after check-in".into()));
                }
                if h.guests == 0 {
                    return Err(CoreError::ValidationError("guests must be at least 1".into()));
                }
            }
            BookingDetails::Flight(f) => {
                if f.passengers.is_empty() {
                    return Err(CoreError::ValidationError("at least one passenger is required".into()));
                }
                if f.passengers.iter().any(|p| p.full_name.trim().is_empty()) {
                    return Err(CoreError::ValidationError("passenger name is required".into()));
                }
            }
        }
        if self.resource_id().trim().is_empty() {
            return Err(CoreError::ValidationError(format!("{} id is required", self.domain())));
        }
        Ok(())
    }
}

/// A reservation against a tour, hotel or flight
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "bookingCode")]
    pub reference: Option<String>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(deserialize_with = "non_negative_price")]
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub details: BookingDetails,
    #[serde(alias = "contactInfo")]
    pub contact: ContactInfo,
    #[serde(default)]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub cancel_reason: Option<String>,
}

fn non_negative_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(D::Error::custom(format!("totalPrice must be non-negative, got {}", value)));
    }
    Ok(value)
}

impl Booking {
    /// Decode a raw backend item. The endpoint's domain is used when the item carries no tag.
    pub fn from_value(domain: Domain, mut value: serde_json::Value) -> Result<Self, serde_json::Error> {
        if let Some(obj) = value.as_object_mut() {
            obj.entry("domain")
                .or_insert_with(|| serde_json::Value::String(domain.as_str().to_string()));
        }
        serde_json::from_value(value)
    }

    pub fn domain(&self) -> Domain {
        self.details.domain()
    }

    /// Reference code if the backend issued one, else the id
    pub fn display_code(&self) -> &str {
        self.reference.as_deref().unwrap_or(&self.id)
    }

    /// Every populated text field free-text search matches against
    pub fn searchable_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.id.as_str(), self.contact.name.as_str()];
        fields.push(self.contact.email.expose());
        fields.push(self.contact.phone.expose());
        if let Some(r) = &self.reference {
            fields.push(r);
        }
        match &self.details {
            BookingDetails::Tour(t) => {
                fields.push(&t.tour_id);
                fields.extend(t.tour_name.as_deref());
            }
            BookingDetails::Hotel(h) => {
                fields.push(&h.hotel_id);
                fields.push(&h.room_id);
                fields.extend(h.hotel_name.as_deref());
                fields.extend(h.room_type.as_deref());
            }
            BookingDetails::Flight(f) => {
                fields.push(&f.flight_id);
                fields.extend(f.flight_number.as_deref());
                fields.extend(f.passengers.iter().map(|p| p.full_name.as_str()));
            }
        }
        fields
    }
}

/// Checkout payload for `POST /{domain}-bookings`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    #[serde(flatten)]
    pub details: BookingDetails,
    #[serde(rename = "contactInfo")]
    pub contact: ContactInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

impl NewBooking {
    pub fn domain(&self) -> Domain {
        self.details.domain()
    }

    /// Field checks done before any request goes out
    pub fn validate(&self) -> CoreResult<()> {
        if self.contact.name.trim().is_empty() {
            return Err(CoreError::ValidationError("contact name is required".into()));
        }
        if !self.contact.email.expose().contains('@') {
            return Err(CoreError::ValidationError("contact email is invalid".into()));
        }
        let digits = self.contact.phone.expose().chars().filter(|c| c.is_ascii_digit()).count();
        if digits < 9 {
            return Err(CoreError::ValidationError("contact phone is invalid".into()));
        }
        self.details.validate()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn contact() -> ContactInfo {
        ContactInfo {
            name: "Nguyen Van An".to_string(),
            email: Masked::from("an.nguyen@example.com"),
            phone: Masked::from("0901234567"),
        }
    }

    pub fn tour_booking(id: &str, status: BookingStatus, total_price: f64, day: u32) -> Booking {
        let created = Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap();
        Booking {
            id: id.to_string(),
            reference: Some(format!("GT-{}", id.to_uppercase())),
            status,
            payment_status: PaymentStatus::Pending,
            total_price,
            created_at: created,
            updated_at: created,
            details: BookingDetails::Tour(TourBooking {
                tour_id: "tour-halong".to_string(),
                tour_name: Some("Ha Long Bay Cruise".to_string()),
                participants: 2,
                start_date: None,
            }),
            contact: contact(),
            special_requests: None,
            cancel_reason: None,
        }
    }
}
