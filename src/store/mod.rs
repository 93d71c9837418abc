//! # Application store.
//!
//! [`Store`] owns the [`AppState`]. It is registered on the bus as a reducer,
//! so every event is applied before any watcher or waiter observes it; all
//! other components only read, through [`SessionStore`] or [`Store::select`].
//!
//! At construction the store can [`hydrate`](Store::hydrate) the session
//! token from durable storage, so a persisted login survives restarts.

mod state;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use crate::events::{Event, Reduce, Toast, Token, User};
use crate::io::{ACCESS_TOKEN_KEY, EXPIRATION_KEY, Storage};

pub use state::{AppState, SessionState};

/// Read-only view of the authentication state.
pub trait SessionStore: Send + Sync {
    /// True when a token is held and has not expired.
    fn is_logged_in(&self) -> bool;

    fn current_user(&self) -> Option<User>;
}

/// Single-writer state container.
#[derive(Debug, Default)]
pub struct Store {
    state: RwLock<AppState>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Builds a store whose session token is restored from `storage`.
    ///
    /// Both keys must hold non-null values; anything unreadable starts the
    /// session logged out.
    pub fn hydrate(storage: &dyn Storage) -> Self {
        let token = match restore_token(storage) {
            Ok(token) => token,
            Err(reason) => {
                warn!(%reason, "ignoring persisted session");
                None
            }
        };
        debug!(restored = token.is_some(), "store hydrated");
        Self::with_state(AppState {
            session: SessionState { token, user: None },
            toasts: Vec::new(),
        })
    }

    /// Runs `f` against the current state.
    pub fn select<T>(&self, f: impl FnOnce(&AppState) -> T) -> T {
        f(&self.state.read())
    }

    pub fn snapshot(&self) -> AppState {
        self.state.read().clone()
    }

    pub fn token(&self) -> Option<Token> {
        self.select(|s| s.session.token.clone())
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.select(|s| s.toasts.clone())
    }
}

impl Reduce for Store {
    fn reduce(&self, event: &Event) {
        self.state.write().apply(&event.action);
    }
}

impl SessionStore for Store {
    fn is_logged_in(&self) -> bool {
        let now = Utc::now();
        self.select(|s| {
            s.session
                .token
                .as_ref()
                .is_some_and(|t| !t.is_expired_at(now))
        })
    }

    fn current_user(&self) -> Option<User> {
        self.select(|s| s.session.user.clone())
    }
}

fn restore_token(storage: &dyn Storage) -> Result<Option<Token>, String> {
    let value = storage.get(ACCESS_TOKEN_KEY).map_err(|e| e.to_string())?;
    let expiration = storage.get(EXPIRATION_KEY).map_err(|e| e.to_string())?;

    let (Some(Value::String(value)), Some(Value::String(expiration))) = (value, expiration) else {
        return Ok(None);
    };
    let expires_at = DateTime::parse_from_rfc3339(&expiration)
        .map_err(|e| format!("bad expiration {expiration:?}: {e}"))?
        .with_timezone(&Utc);
    Ok(Some(Token::new(value, expires_at)))
}
