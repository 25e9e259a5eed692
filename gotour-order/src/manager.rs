use gotour_core::i18n::Localize;
use gotour_core::lifecycle::{self, BookingAction};
use gotour_core::repository::{BookingApi, PageRequest};
use gotour_core::search::{self, BookingFilter, BookingGroups, BookingStats, SortOrder};
use gotour_core::{ApiError, Booking, CoreError, Domain, ErrorKind, Feedback, Locale, NewBooking, Page};
use gotour_shared::models::{BookingStatusChanged, DomainEvent};
use gotour_store::{NotificationLevel, Notifier};
use std::sync::Arc;
use tracing::{info, warn};

/// Booking facade: list, resolve, create and drive lifecycle transitions.
///
/// Every mutation re-fetches the booking afterwards; the mutation response
/// itself is never trusted.
pub struct BookingManager {
    api: Arc<dyn BookingApi>,
    notifier: Notifier,
    locale: Locale,
}

impl BookingManager {
    pub fn new(api: Arc<dyn BookingApi>, notifier: Notifier) -> Self {
        Self {
            api,
            notifier,
            locale: Locale::default(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn list_mine(&self, domain: Domain) -> Result<Page<Booking>, BookingError> {
        Ok(self.api.list_mine(domain).await?)
    }

    /// Admin listing of one domain
    pub async fn list_all(&self, domain: Domain, paging: PageRequest) -> Result<Page<Booking>, BookingError> {
        Ok(self.api.list_all(domain, paging).await?)
    }

    /// Caller's bookings across all domains, one request at a time.
    /// A domain that fails is reported, not fatal.
    pub async fn list_all_mine(&self) -> UnifiedList {
        let mut list = UnifiedList::default();
        for domain in Domain::ALL {
            match self.api.list_mine(domain).await {
                Ok(page) => list.bookings.extend(page.items),
                Err(ApiError::Unauthorized) => {
                    list.failures.push((domain, ApiError::Unauthorized));
                    // Session is gone; the remaining calls would fail the same way
                    break;
                }
                Err(e) => {
                    warn!("Failed to load {} bookings: {}", domain, e);
                    list.failures.push((domain, e));
                }
            }
        }
        list
    }

    pub async fn get(&self, domain: Domain, id: &str) -> Result<Booking, BookingError> {
        Ok(self.api.get(domain, id).await?)
    }

    /// Find a booking by id, trying the hinted domain first
    pub async fn resolve(&self, id: &str, hint: Option<Domain>) -> Result<Booking, BookingError> {
        let mut order: Vec<Domain> = hint.into_iter().collect();
        order.extend(Domain::ALL.into_iter().filter(|d| Some(*d) != hint));

        for domain in order {
            match self.api.get(domain, id).await {
                Ok(booking) => return Ok(booking),
                Err(ApiError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ApiError::NotFound(id.to_string()).into())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn create(&self, booking: &NewBooking) -> Result<Booking, BookingError> {
        booking.validate()?;
        let created = self.api.create(booking).await?;
        // Re-read so server-side pricing and defaults are what we show
        let fresh = self.api.get(created.domain(), &created.id).await?;
        info!("Booking {} created with status {}", fresh.id, fresh.status);
        self.notifier.notify(
            NotificationLevel::Success,
            format!("{} {}", fresh.display_code(), fresh.status.label(self.locale)),
        );
        Ok(fresh)
    }

    /// pending -> confirmed (admin)
    pub async fn confirm(&self, domain: Domain, id: &str) -> Result<Booking, BookingError> {
        self.apply(domain, id, BookingAction::Confirm, None).await
    }

    /// pending|confirmed -> cancelled
    pub async fn cancel(&self, domain: Domain, id: &str, reason: Option<&str>) -> Result<Booking, BookingError> {
        self.apply(domain, id, BookingAction::Cancel, reason).await
    }

    /// confirmed -> completed (admin)
    pub async fn complete(&self, domain: Domain, id: &str) -> Result<Booking, BookingError> {
        self.apply(domain, id, BookingAction::Complete, None).await
    }

    pub async fn mark_paid(&self, domain: Domain, id: &str) -> Result<Booking, BookingError> {
        self.apply(domain, id, BookingAction::MarkPaid, None).await
    }

    pub async fn refund(&self, domain: Domain, id: &str) -> Result<Booking, BookingError> {
        self.apply(domain, id, BookingAction::Refund, None).await
    }

    /// Run a detail-view action: validate locally, mutate, re-fetch
    pub async fn apply(
        &self,
        domain: Domain,
        id: &str,
        action: BookingAction,
        reason: Option<&str>,
    ) -> Result<Booking, BookingError> {
        // 1. Current state from the backend
        let current = self.api.get(domain, id).await?;

        // 2. Validate and issue the mutation
        let (from, to) = match action {
            BookingAction::Confirm | BookingAction::Complete => {
                let next = lifecycle::next_status(current.status, action)?;
                self.api.update_status(domain, id, next).await?;
                (current.status.to_string(), next.to_string())
            }
            BookingAction::Cancel => {
                let next = lifecycle::cancel(&current)?;
                self.api.cancel(domain, id, reason).await?;
                (current.status.to_string(), next.to_string())
            }
            BookingAction::MarkPaid => {
                let next = lifecycle::mark_paid(&current)?;
                self.api.update_payment_status(domain, id, next).await?;
                (current.payment_status.to_string(), next.to_string())
            }
            BookingAction::Refund => {
                let next = lifecycle::refund(&current)?;
                self.api.update_payment_status(domain, id, next).await?;
                (current.payment_status.to_string(), next.to_string())
            }
        };

        // 3. Re-fetch; the server may have side effects (inventory release, payment sync)
        let updated = self.api.get(domain, id).await?;
        info!("Booking {} {}: {} -> {}", id, action.as_str(), from, to);

        let event = BookingStatusChanged::new(id, domain.as_str(), &from, &to, reason.map(str::to_string));
        self.notifier.emit(
            NotificationLevel::Success,
            format!("{}: {}", updated.display_code(), action.label(self.locale)),
            DomainEvent::BookingStatusChanged(event),
        );

        Ok(updated)
    }

    /// Hard delete. Destructive and outside the lifecycle, so the caller must say so.
    pub async fn delete(&self, domain: Domain, id: &str, confirmed: bool) -> Result<(), BookingError> {
        if !confirmed {
            return Err(BookingError::DeleteNotConfirmed);
        }
        self.api.delete(domain, id).await?;
        warn!("Booking {} ({}) deleted", id, domain);
        self.notifier.notify(NotificationLevel::Warning, format!("{} deleted", id));
        Ok(())
    }
}

/// Merged "my bookings" across domains
#[derive(Debug, Default)]
pub struct UnifiedList {
    pub bookings: Vec<Booking>,
    pub failures: Vec<(Domain, ApiError)>,
}

impl UnifiedList {
    pub fn view(&self, criteria: &BookingFilter, order: SortOrder) -> Vec<Booking> {
        search::apply(&self.bookings, criteria, order)
    }

    pub fn groups(&self) -> BookingGroups {
        BookingGroups::from_bookings(&self.bookings)
    }

    pub fn stats(&self) -> BookingStats {
        BookingStats::from_bookings(&self.bookings)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Deletion requires explicit confirmation")]
    DeleteNotConfirmed,
}

impl BookingError {
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, BookingError::Core(CoreError::InvalidTransition { .. }))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BookingError::Api(ApiError::Unauthorized))
    }

    /// Inline `{success:false, message}` for the view
    pub fn feedback(&self, locale: Locale) -> Feedback {
        match self {
            BookingError::Api(e) => Feedback::from_error(e, locale),
            other => Feedback {
                success: false,
                message: Some(other.to_string()),
                kind: Some(ErrorKind::Validation),
            },
        }
    }
}
