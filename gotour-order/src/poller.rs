use gotour_core::i18n::{self, Localize};
use gotour_core::payment::{Payment, PaymentCheck, PaymentGateway, PaymentRecordStatus, RetryReason};
use gotour_core::{ErrorKind, Locale};
use gotour_shared::models::{DomainEvent, PaymentResolved};
use gotour_store::app_config::PollingConfig;
use gotour_store::{NotificationLevel, Notifier};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(600),
        }
    }
}

impl From<&PollingConfig> for PollConfig {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: config.interval(),
            timeout: config.timeout(),
        }
    }
}

/// Shortest gap between two checks
const MIN_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The payment reached completed, failed or refunded
    Resolved(Payment),
    /// Deadline passed (or the session ended) while still pending
    Unresolved { last: Option<RetryReason> },
    /// The owner asked the poll to stop
    Stopped,
}

/// Polls `/payments/{id}/check` until the payment resolves.
///
/// One check in flight at a time; a slow check delays the next tick rather
/// than stacking requests.
#[derive(Clone)]
pub struct PaymentPoller {
    gateway: Arc<dyn PaymentGateway>,
    config: PollConfig,
    notifier: Option<Notifier>,
    locale: Locale,
}

impl PaymentPoller {
    pub fn new(gateway: Arc<dyn PaymentGateway>, config: PollConfig) -> Self {
        Self {
            gateway,
            config,
            notifier: None,
            locale: Locale::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// Run the poll loop on its own task
    pub fn spawn(&self, payment_id: impl Into<String>) -> PollHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let poller = self.clone();
        let payment_id = payment_id.into();
        let task = tokio::spawn(async move { poller.poll(&payment_id, stop_rx).await });
        PollHandle {
            stop: stop_tx,
            task: Some(task),
        }
    }

    /// Poll until resolved, timed out or told to stop via `stop`
    pub async fn poll(&self, payment_id: &str, mut stop: watch::Receiver<bool>) -> PollOutcome {
        let deadline = Instant::now() + self.config.timeout;
        let mut ticker = tokio::time::interval(self.config.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = None;
        let mut attempts = 0u32;

        loop {
            tokio::select! {
                biased;
                _ = stopped(&mut stop) => return self.stop(payment_id),
                _ = ticker.tick() => {}
            }

            if Instant::now() >= deadline {
                break;
            }

            attempts += 1;
            let check = tokio::select! {
                biased;
                _ = stopped(&mut stop) => return self.stop(payment_id),
                check = self.gateway.check_status(payment_id) => check,
            };

            match check {
                PaymentCheck::Status(payment) if payment.status.is_terminal() => {
                    info!(
                        "Payment {} resolved as {} after {} checks",
                        payment_id,
                        payment.status.as_str(),
                        attempts
                    );
                    self.announce(&payment);
                    return PollOutcome::Resolved(payment);
                }
                PaymentCheck::Status(_) => {
                    debug!("Payment {} still pending (check {})", payment_id, attempts);
                    last = None;
                }
                PaymentCheck::Retry(RetryReason::Unauthorized) => {
                    warn!("Session ended while polling payment {}", payment_id);
                    self.notify(NotificationLevel::Error, ErrorKind::Auth.label(self.locale));
                    return PollOutcome::Unresolved {
                        last: Some(RetryReason::Unauthorized),
                    };
                }
                PaymentCheck::Retry(reason) => {
                    debug!("Payment {} check failed, will retry: {:?}", payment_id, reason);
                    last = Some(reason);
                }
            }
        }

        warn!(
            "Payment {} unresolved after {:?} ({} checks)",
            payment_id, self.config.timeout, attempts
        );
        self.notify(
            NotificationLevel::Warning,
            i18n::unresolved_message(last.as_ref(), self.locale),
        );
        PollOutcome::Unresolved { last }
    }

    fn stop(&self, payment_id: &str) -> PollOutcome {
        info!("Stopped polling payment {}", payment_id);
        PollOutcome::Stopped
    }

    fn announce(&self, payment: &Payment) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let (level, message) = match payment.status {
            PaymentRecordStatus::Completed => (
                NotificationLevel::Success,
                format!(
                    "{}: {}",
                    payment.status.label(self.locale),
                    i18n::format_vnd(payment.amount, self.locale)
                ),
            ),
            PaymentRecordStatus::Failed => (
                NotificationLevel::Error,
                payment
                    .failure()
                    .map(|f| f.label(self.locale))
                    .unwrap_or_else(|| payment.status.label(self.locale))
                    .to_string(),
            ),
            _ => (NotificationLevel::Info, payment.status.label(self.locale).to_string()),
        };
        let event = PaymentResolved::new(
            &payment.id,
            payment.booking_id.clone(),
            payment.status.as_str(),
            payment.amount,
        );
        notifier.emit(level, message, DomainEvent::PaymentResolved(event));
    }

    fn notify(&self, level: NotificationLevel, message: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(level, message);
        }
    }
}

/// Resolves once stop is requested or the stop sender is gone
async fn stopped(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            return;
        }
    }
}

/// Owner of a spawned poll. Dropping it stops the poll.
pub struct PollHandle {
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Wait for the poll to end. A panic inside the poll task is resumed here.
    pub async fn outcome(mut self) -> PollOutcome {
        let Some(task) = self.task.take() else {
            return PollOutcome::Stopped;
        };
        match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                warn!("Payment poll task cancelled: {}", e);
                PollOutcome::Stopped
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{payment, ScriptedGateway};
    use gotour_core::payment::NewPayment;

    fn pending() -> PaymentCheck {
        PaymentCheck::Status(payment("pay-1", PaymentRecordStatus::Pending))
    }

    fn config(interval_secs: u64, timeout_secs: u64) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(interval_secs),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_on_third_check_and_notifies_once() {
        let gateway = Arc::new(ScriptedGateway::new(
            vec![
                pending(),
                pending(),
                PaymentCheck::Status(payment("pay-1", PaymentRecordStatus::Completed)),
            ],
            pending(),
        ));
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();
        let poller = PaymentPoller::new(gateway.clone(), config(5, 600)).with_notifier(notifier);

        let outcome = poller.spawn("pay-1").outcome().await;

        match outcome {
            PollOutcome::Resolved(p) => assert_eq!(p.status, PaymentRecordStatus::Completed),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(gateway.calls(), 3);

        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Success);
        assert!(matches!(notification.event, Some(DomainEvent::PaymentResolved(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_keep_polling() {
        let gateway = Arc::new(ScriptedGateway::new(
            vec![
                PaymentCheck::Retry(RetryReason::Timeout),
                PaymentCheck::Retry(RetryReason::Http(502)),
                PaymentCheck::Status(payment("pay-1", PaymentRecordStatus::Failed)),
            ],
            pending(),
        ));
        let poller = PaymentPoller::new(gateway.clone(), config(5, 600));

        let outcome = poller.spawn("pay-1").outcome().await;
        assert!(matches!(outcome, PollOutcome::Resolved(p) if p.status == PaymentRecordStatus::Failed));
        assert_eq!(gateway.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_at_deadline() {
        let gateway = Arc::new(ScriptedGateway::always_pending());
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();
        let poller = PaymentPoller::new(gateway.clone(), config(1, 5)).with_notifier(notifier);

        let outcome = poller.spawn("pay-1").outcome().await;

        assert_eq!(outcome, PollOutcome::Unresolved { last: None });
        assert_eq!(gateway.calls(), 5);
        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Warning);
        assert_eq!(notification.message, i18n::payment_unresolved(Locale::En));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_failures_reported_as_such() {
        let gateway = Arc::new(ScriptedGateway::new(
            Vec::new(),
            PaymentCheck::Retry(RetryReason::Network("connection refused".into())),
        ));
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();
        let poller = PaymentPoller::new(gateway.clone(), config(1, 5)).with_notifier(notifier);

        let outcome = poller.spawn("pay-1").outcome().await;

        assert_eq!(
            outcome,
            PollOutcome::Unresolved {
                last: Some(RetryReason::Network("connection refused".into()))
            }
        );
        let notification = rx.recv().await.unwrap();
        assert_eq!(notification.level, NotificationLevel::Warning);
        assert_eq!(notification.message, ErrorKind::Transient.label(Locale::En));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_still_polls() {
        let gateway = Arc::new(ScriptedGateway::new(
            vec![
                pending(),
                PaymentCheck::Status(payment("pay-1", PaymentRecordStatus::Completed)),
            ],
            pending(),
        ));
        let poller = PaymentPoller::new(
            gateway.clone(),
            PollConfig {
                interval: Duration::ZERO,
                timeout: Duration::from_secs(5),
            },
        );

        let outcome = poller.spawn("pay-1").outcome().await;
        assert!(matches!(outcome, PollOutcome::Resolved(p) if p.status == PaymentRecordStatus::Completed));
        assert_eq!(gateway.calls(), 2);
    }

    struct BrokenGateway;

    #[async_trait::async_trait]
    impl PaymentGateway for BrokenGateway {
        async fn create_payment(&self, _request: &NewPayment) -> gotour_core::ApiResult<Payment> {
            Err(gotour_core::ApiError::Timeout)
        }

        async fn get_payment(&self, _payment_id: &str) -> gotour_core::ApiResult<Payment> {
            Err(gotour_core::ApiError::Timeout)
        }

        async fn check_status(&self, _payment_id: &str) -> PaymentCheck {
            panic!("gateway exploded")
        }
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "gateway exploded")]
    async fn test_crashed_poll_is_not_a_stop() {
        let poller = PaymentPoller::new(Arc::new(BrokenGateway), config(5, 600));
        let _ = poller.spawn("pay-1").outcome().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_poll() {
        let gateway = Arc::new(ScriptedGateway::always_pending());
        let poller = PaymentPoller::new(gateway.clone(), config(5, 600));

        let handle = poller.spawn("pay-1");
        tokio::time::sleep(Duration::from_secs(12)).await;
        handle.stop();

        assert_eq!(handle.outcome().await, PollOutcome::Stopped);
        let calls = gateway.calls();
        assert_eq!(calls, 3);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gateway.calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_poll() {
        let gateway = Arc::new(ScriptedGateway::always_pending());
        let poller = PaymentPoller::new(gateway.clone(), config(5, 600));

        let handle = poller.spawn("pay-1");
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_checks_never_overlap() {
        let gateway = Arc::new(ScriptedGateway::always_pending().with_delay(Duration::from_secs(3)));
        let poller = PaymentPoller::new(gateway.clone(), config(1, 20));

        let outcome = poller.spawn("pay-1").outcome().await;

        assert!(matches!(outcome, PollOutcome::Unresolved { .. }));
        assert_eq!(gateway.max_in_flight(), 1);
        assert!(gateway.calls() <= 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_ends_poll() {
        let gateway = Arc::new(ScriptedGateway::new(
            vec![pending(), PaymentCheck::Retry(RetryReason::Unauthorized)],
            pending(),
        ));
        let poller = PaymentPoller::new(gateway.clone(), config(5, 600));

        let outcome = poller.spawn("pay-1").outcome().await;
        assert_eq!(
            outcome,
            PollOutcome::Unresolved {
                last: Some(RetryReason::Unauthorized)
            }
        );
        assert_eq!(gateway.calls(), 2);
    }
}
