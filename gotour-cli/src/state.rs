use gotour_core::{ApiResult, Locale};
use gotour_order::{BookingManager, PaymentOrchestrator, PaymentPoller, PollConfig};
use gotour_store::app_config::Config;
use gotour_store::{ApiClient, HttpBookingApi, HttpPaymentGateway, Notifier, Session};
use std::sync::Arc;

/// Everything a command needs, wired from config
pub struct App {
    pub session: Arc<Session>,
    pub notifier: Notifier,
    pub bookings: BookingManager,
    pub payments: PaymentOrchestrator,
    pub locale: Locale,
}

impl App {
    /// `token` and `locale` override the configured values
    pub fn new(config: &Config, token: Option<String>, locale: Option<Locale>) -> ApiResult<Self> {
        let session = Arc::new(Session::new());
        if let Some(token) = token.or_else(|| config.auth.token.clone()) {
            session.sign_in(token);
        }
        let locale = locale.unwrap_or(config.ui.locale);
        let notifier = Notifier::default();

        let client = ApiClient::from_config(&config.api, session.clone())?;
        let bookings = BookingManager::new(Arc::new(HttpBookingApi::new(client.clone())), notifier.clone())
            .with_locale(locale);

        let gateway = Arc::new(HttpPaymentGateway::new(client));
        let poller = PaymentPoller::new(gateway.clone(), PollConfig::from(&config.polling))
            .with_notifier(notifier.clone())
            .with_locale(locale);
        let payments = PaymentOrchestrator::new(gateway, config.sepay.clone(), poller);

        Ok(Self {
            session,
            notifier,
            bookings,
            payments,
            locale,
        })
    }
}
