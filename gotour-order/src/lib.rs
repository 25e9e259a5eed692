pub mod detail;
pub mod manager;
pub mod orchestrator;
pub mod poller;

pub use detail::BookingView;
pub use manager::{BookingError, BookingManager, UnifiedList};
pub use orchestrator::{CheckoutInstructions, PaymentOrchestrator};
pub use poller::{PaymentPoller, PollConfig, PollHandle, PollOutcome};

#[cfg(test)]
mod testing;
