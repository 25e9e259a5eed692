use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use gotour_core::repository::PageRequest;
use gotour_core::search::{BookingFilter, DateRange, PriceRange, SortOrder};
use gotour_core::{BookingStatus, Domain, Locale};

#[derive(Parser, Debug)]
#[command(name = "gotour", version, about = "GoTour bookings and SePay payments")]
pub struct Cli {
    /// Bearer token (overrides config)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Display language: en or vi
    #[arg(long, global = true)]
    pub locale: Option<Locale>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List bookings across tours, hotels and flights
    List(ListArgs),
    /// Show one booking and the actions it allows
    Show {
        id: String,
        /// Domain to try first
        #[arg(long)]
        domain: Option<Domain>,
    },
    /// pending -> confirmed
    Confirm(Target),
    /// pending|confirmed -> cancelled
    Cancel {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        reason: Option<String>,
    },
    /// confirmed -> completed
    Complete(Target),
    /// Record the payment as received
    MarkPaid(Target),
    Refund(Target),
    /// Permanently delete a booking
    Delete {
        #[command(flatten)]
        target: Target,
        /// Required: deletion cannot be undone
        #[arg(long)]
        yes: bool,
    },
    /// Open a SePay transfer for a booking and wait for it
    Pay(Target),
    /// Poll a payment until it resolves
    WatchPayment { payment_id: String },
    /// Counts per status and domain, and paid revenue
    Stats,
}

#[derive(Args, Debug, Clone)]
pub struct Target {
    /// tour, hotel or flight
    pub domain: Domain,
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long)]
    pub domain: Option<Domain>,

    #[arg(long)]
    pub status: Option<BookingStatus>,

    /// Created on or after (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Created on or before (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// under1M, 1M-3M, 3M-5M, over5M or min..max
    #[arg(long)]
    pub price: Option<PriceRange>,

    /// Free text over code, names, contact and resource ids
    #[arg(long)]
    pub search: Option<String>,

    /// newest, oldest, priceHighToLow, priceLowToHigh
    #[arg(long, default_value = "newest")]
    pub sort: SortOrder,

    /// Every customer's bookings (admin)
    #[arg(long)]
    pub all: bool,

    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

impl ListArgs {
    pub fn filter(&self) -> BookingFilter {
        let date_range = (self.from.is_some() || self.to.is_some()).then_some(DateRange {
            from: self.from,
            to: self.to,
        });
        BookingFilter {
            domain: self.domain,
            status: self.status,
            date_range,
            price_range: self.price,
            query: self.search.clone(),
        }
    }

    pub fn paging(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            limit: self.limit,
        }
    }
}
