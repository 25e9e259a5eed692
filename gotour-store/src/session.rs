use gotour_shared::Masked;
use tokio::sync::watch;
use tracing::{info, warn};

/// Authentication state observed by the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated(Masked<String>),
    /// No token. Views react by sending the user to the login screen.
    LoggedOut,
}

/// Session context handed to every API client instead of a global token slot
#[derive(Debug)]
pub struct Session {
    state: watch::Sender<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::LoggedOut);
        Self { state }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.sign_in(token);
        session
    }

    pub fn sign_in(&self, token: impl Into<String>) {
        self.state.send_replace(SessionState::Authenticated(Masked::new(token.into())));
        info!("Session started");
    }

    pub fn sign_out(&self) {
        self.state.send_replace(SessionState::LoggedOut);
        info!("Session ended");
    }

    /// Backend rejected the token (401)
    pub fn expire(&self) {
        let previous = self.state.send_replace(SessionState::LoggedOut);
        if previous != SessionState::LoggedOut {
            warn!("Session expired, login required");
        }
    }

    pub fn token(&self) -> Option<String> {
        match &*self.state.borrow() {
            SessionState::Authenticated(token) => Some(token.expose().clone()),
            SessionState::LoggedOut => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.borrow(), SessionState::Authenticated(_))
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
