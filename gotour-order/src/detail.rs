use gotour_core::booking::BookingDetails;
use gotour_core::i18n::{self, Localize};
use gotour_core::lifecycle::{self, BookingAction};
use gotour_core::{Booking, Locale};
use serde::Serialize;

/// A booking together with the actions its current state allows
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub booking: Booking,
    pub actions: Vec<BookingAction>,
}

impl BookingView {
    pub fn new(booking: Booking) -> Self {
        let actions = lifecycle::available_actions(&booking);
        Self { booking, actions }
    }

    pub fn available_actions(&self) -> &[BookingAction] {
        &self.actions
    }

    pub fn allows(&self, action: BookingAction) -> bool {
        self.actions.contains(&action)
    }

    /// Human-readable summary, one fact per line
    pub fn summary_lines(&self, locale: Locale) -> Vec<String> {
        let b = &self.booking;
        let mut lines = vec![
            format!("{} [{}]", b.display_code(), b.domain().label(locale)),
            format!(
                "{} / {}",
                b.status.label(locale),
                b.payment_status.label(locale)
            ),
        ];

        match &b.details {
            BookingDetails::Tour(t) => {
                lines.push(t.tour_name.clone().unwrap_or_else(|| t.tour_id.clone()));
                if let Some(start) = t.start_date {
                    lines.push(format!("{}", start.format("%d/%m/%Y")));
                }
                lines.push(format!("x{}", t.participants));
            }
            BookingDetails::Hotel(h) => {
                lines.push(h.hotel_name.clone().unwrap_or_else(|| h.hotel_id.clone()));
                lines.push(format!(
                    "{} -> {} ({}n)",
                    h.check_in.format("%d/%m/%Y"),
                    h.check_out.format("%d/%m/%Y"),
                    h.nights()
                ));
                lines.push(format!(
                    "{} x{}",
                    h.room_type.as_deref().unwrap_or(&h.room_id),
                    h.guests
                ));
            }
            BookingDetails::Flight(f) => {
                lines.push(f.flight_number.clone().unwrap_or_else(|| f.flight_id.clone()));
                for p in &f.passengers {
                    let mut extras = Vec::new();
                    extras.extend(p.seat.as_deref().map(|s| format!("seat {}", s)));
                    extras.extend(p.meal.as_deref().map(|m| format!("meal {}", m)));
                    extras.extend(p.baggage_kg.map(|kg| format!("{}kg", kg)));
                    if extras.is_empty() {
                        lines.push(format!("- {}", p.full_name));
                    } else {
                        lines.push(format!("- {} ({})", p.full_name, extras.join(", ")));
                    }
                }
            }
        }

        lines.push(format!("{} <{}>", b.contact.name, b.contact.email.hint(3)));
        if let Some(reason) = &b.cancel_reason {
            lines.push(format!("{}: {}", BookingAction::Cancel.label(locale), reason));
        }
        lines.push(i18n::format_vnd(b.total_price, locale));
        lines
    }
}

impl From<Booking> for BookingView {
    fn from(booking: Booking) -> Self {
        Self::new(booking)
    }
}
