//! Dashboard session state.
//!
//! A single shared-credential session: Unauthenticated until a login with
//! the configured username/password succeeds, Authenticated until an
//! explicit logout. The favorites view kept here is the session overlay that
//! stays usable even when the durable store write fails.

use crate::config::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Unauthenticated,
    Authenticated { username: String },
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Session::Authenticated { username } => Some(username),
            Session::Unauthenticated => None,
        }
    }

    /// Attempt a login. On failure the session stays Unauthenticated.
    pub fn login(&mut self, username: &str, password: &str, settings: &Settings) -> bool {
        if username == settings.dashboard_username && password == settings.dashboard_password {
            *self = Session::Authenticated {
                username: username.to_string(),
            };
            true
        } else {
            *self = Session::Unauthenticated;
            false
        }
    }

    pub fn logout(&mut self) {
        *self = Session::Unauthenticated;
    }
}

/// Per-process dashboard state threaded through the handlers.
#[derive(Debug)]
pub struct DashboardState {
    pub session: Session,
    /// Session view of favorites, seeded from the durable store on first
    /// use and kept current even when a store write fails.
    pub favorites: Vec<String>,
    pub favorites_loaded: bool,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            session: Session::Unauthenticated,
            favorites: Vec::new(),
            favorites_loaded: false,
        }
    }

    /// Flip a currency's favorite flag in the session view, returning the
    /// new value. The caller mirrors the change into the durable store.
    pub fn toggle_favorite(&mut self, currency: &str) -> bool {
        if let Some(pos) = self.favorites.iter().position(|c| c == currency) {
            self.favorites.remove(pos);
            false
        } else {
            self.favorites.push(currency.to_string());
            true
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}
