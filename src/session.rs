//! Session token persistence and the reactive logged-in signal.
//!
//! The token lives in an injected [`KeyValueStore`] together with the time it
//! was issued. A session is valid for 24 hours; the expiry check runs once when
//! the manager is constructed, before anything can observe the logged-in state.
//! After that the current token is served from a `watch` channel, so request
//! building never touches the store.

use std::sync::Arc;

use tokio::sync::watch;

use crate::http::TokenSource;
use crate::storage::KeyValueStore;

pub const TOKEN_KEY: &str = "authToken";
pub const TOKEN_TIMESTAMP_KEY: &str = "authTokenTimestamp";
pub const EXPIRY_HOURS: i64 = 24;

const EXPIRY_MILLIS: i64 = EXPIRY_HOURS * 60 * 60 * 1000;

/// Source of "now" in Unix epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    current: watch::Sender<Option<String>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let (current, _) = watch::channel(None);
        let manager = SessionManager { store, clock, current };

        if manager.is_expired() {
            manager.clear_session();
        }
        let stored = manager.read_token();
        manager.current.send_replace(stored);
        manager
    }

    pub fn save_session(&self, token: &str) {
        let now = self.clock.now_millis().to_string();
        let saved = self
            .store
            .set(TOKEN_KEY, token)
            .and_then(|_| self.store.set(TOKEN_TIMESTAMP_KEY, &now));

        match saved {
            Ok(()) => {
                log::info!("Session saved");
                self.current.send_replace(Some(token.to_string()));
            }
            Err(e) => {
                log::error!("Failed to persist session: {}", e);
                self.current.send_replace(None);
            }
        }
    }

    pub fn clear_session(&self) {
        if let Err(e) = self.store.remove(TOKEN_KEY) {
            log::warn!("Failed to remove session token: {}", e);
        }
        if let Err(e) = self.store.remove(TOKEN_TIMESTAMP_KEY) {
            log::warn!("Failed to remove session timestamp: {}", e);
        }
        self.current.send_replace(None);
    }

    /// True when no issuance time is stored or 24 hours have passed since it.
    pub fn is_expired(&self) -> bool {
        let stored = match self.store.get(TOKEN_TIMESTAMP_KEY) {
            Ok(Some(stored)) => stored,
            Ok(None) => return true,
            Err(e) => {
                log::warn!("Failed to read session timestamp: {}", e);
                return true;
            }
        };

        match stored.trim().parse::<i64>() {
            Ok(issued) => self.clock.now_millis() - issued >= EXPIRY_MILLIS,
            Err(_) => true,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Yields the current token; `None` means logged out.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.current.subscribe()
    }

    pub fn token(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    fn read_token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                log::warn!("Failed to read session token: {}", e);
                None
            }
        }
    }
}

impl TokenSource for SessionManager {
    fn token(&self) -> Option<String> {
        SessionManager::token(self)
    }
}
