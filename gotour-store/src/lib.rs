pub mod app_config;
pub mod booking_repo;
pub mod http;
pub mod notify;
pub mod payment_repo;
pub mod session;

pub use booking_repo::HttpBookingApi;
pub use http::ApiClient;
pub use notify::{Notification, NotificationLevel, Notifier};
pub use payment_repo::HttpPaymentGateway;
pub use session::{Session, SessionState};
