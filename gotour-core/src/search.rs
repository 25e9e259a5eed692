use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::booking::{Booking, BookingStatus, Domain, PaymentStatus};
use crate::CoreError;

/// Price bucket used by the list views (VND, half-open)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum PriceRange {
    #[serde(rename = "under1M")]
    Under1M,
    #[serde(rename = "1M-3M")]
    From1MTo3M,
    #[serde(rename = "3M-5M")]
    From3MTo5M,
    #[serde(rename = "over5M")]
    Over5M,
    Custom { min: f64, max: f64 },
}

const ONE_MILLION: f64 = 1_000_000.0;

impl PriceRange {
    /// Lower bound inclusive, upper bound exclusive
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            PriceRange::Under1M => (0.0, ONE_MILLION),
            PriceRange::From1MTo3M => (ONE_MILLION, 3.0 * ONE_MILLION),
            PriceRange::From3MTo5M => (3.0 * ONE_MILLION, 5.0 * ONE_MILLION),
            PriceRange::Over5M => (5.0 * ONE_MILLION, f64::INFINITY),
            PriceRange::Custom { min, max } => (min, max),
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        let (min, max) = self.bounds();
        price >= min && price < max
    }
}

impl FromStr for PriceRange {
    type Err = CoreError;

    /// Accepts `under1M`, `1M-3M`, `3M-5M`, `over5M` or a custom `min..max`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "under1M" => Ok(PriceRange::Under1M),
            "1M-3M" => Ok(PriceRange::From1MTo3M),
            "3M-5M" => Ok(PriceRange::From3MTo5M),
            "over5M" => Ok(PriceRange::Over5M),
            other => {
                let (min, max) = other
                    .split_once("..")
                    .ok_or_else(|| CoreError::ValidationError(format!("unknown price range: {}", other)))?;
                let parse = |v: &str| {
                    v.trim()
                        .parse::<f64>()
                        .map_err(|_| CoreError::ValidationError(format!("invalid price bound: {}", v)))
                };
                let min = parse(min)?;
                let max = if max.trim().is_empty() { f64::INFINITY } else { parse(max)? };
                if min > max {
                    return Err(CoreError::ValidationError("price range min exceeds max".into()));
                }
                Ok(PriceRange::Custom { min, max })
            }
        }
    }
}

/// Inclusive date window matched against the booking's creation date
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    PriceHighToLow,
    PriceLowToHigh,
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "priceHighToLow" | "price-desc" => Ok(SortOrder::PriceHighToLow),
            "priceLowToHigh" | "price-asc" => Ok(SortOrder::PriceLowToHigh),
            other => Err(CoreError::ValidationError(format!("unknown sort order: {}", other))),
        }
    }
}

/// List criteria. Unset fields don't filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookingFilter {
    pub domain: Option<Domain>,
    pub status: Option<BookingStatus>,
    pub date_range: Option<DateRange>,
    pub price_range: Option<PriceRange>,
    pub query: Option<String>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.domain.map_or(true, |d| booking.domain() == d)
            && self.status.map_or(true, |s| booking.status == s)
            && self
                .date_range
                .map_or(true, |r| r.contains(booking.created_at.date_naive()))
            && self.price_range.map_or(true, |r| r.contains(booking.total_price))
            && self.matches_query(booking)
    }

    fn matches_query(&self, booking: &Booking) -> bool {
        let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
            return true;
        };
        let needle = query.to_lowercase();
        booking
            .searchable_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Filter in fixed order (domain, status, date, price, text)
pub fn filter(bookings: &[Booking], criteria: &BookingFilter) -> Vec<Booking> {
    bookings.iter().filter(|b| criteria.matches(b)).cloned().collect()
}

/// Stable sort, so equal keys keep their incoming order
pub fn sort(mut bookings: Vec<Booking>, order: SortOrder) -> Vec<Booking> {
    match order {
        SortOrder::Newest => bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Oldest => bookings.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::PriceHighToLow => bookings.sort_by(|a, b| b.total_price.total_cmp(&a.total_price)),
        SortOrder::PriceLowToHigh => bookings.sort_by(|a, b| a.total_price.total_cmp(&b.total_price)),
    }
    bookings
}

/// Filter then sort
pub fn apply(bookings: &[Booking], criteria: &BookingFilter, order: SortOrder) -> Vec<Booking> {
    sort(filter(bookings, criteria), order)
}

/// Bookings split per domain for the unified "my bookings" view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingGroups {
    pub tours: Vec<Booking>,
    pub hotels: Vec<Booking>,
    pub flights: Vec<Booking>,
}

impl BookingGroups {
    pub fn from_bookings(bookings: &[Booking]) -> Self {
        let mut groups = Self::default();
        for booking in bookings {
            groups.get_mut(booking.domain()).push(booking.clone());
        }
        groups
    }

    pub fn get(&self, domain: Domain) -> &[Booking] {
        match domain {
            Domain::Tour => &self.tours,
            Domain::Hotel => &self.hotels,
            Domain::Flight => &self.flights,
        }
    }

    fn get_mut(&mut self, domain: Domain) -> &mut Vec<Booking> {
        match domain {
            Domain::Tour => &mut self.tours,
            Domain::Hotel => &mut self.hotels,
            Domain::Flight => &mut self.flights,
        }
    }

    pub fn len(&self) -> usize {
        self.tours.len() + self.hotels.len() + self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dashboard numbers
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BookingStats {
    pub total: usize,
    pub by_status: HashMap<BookingStatus, usize>,
    pub by_domain: HashMap<Domain, usize>,
    /// Sum over bookings whose payment is `paid`
    pub revenue: f64,
}

impl BookingStats {
    pub fn from_bookings(bookings: &[Booking]) -> Self {
        let mut stats = Self {
            total: bookings.len(),
            ..Default::default()
        };
        for booking in bookings {
            *stats.by_status.entry(booking.status).or_default() += 1;
            *stats.by_domain.entry(booking.domain()).or_default() += 1;
            if booking.payment_status == PaymentStatus::Paid {
                stats.revenue += booking.total_price;
            }
        }
        stats
    }

    pub fn count(&self, status: BookingStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
