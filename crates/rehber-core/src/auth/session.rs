use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::User;

use super::storage::{KeyValueStore, StorageError};

/// Storage key holding the raw bearer token
pub const TOKEN_KEY: &str = "authToken";

/// Storage key holding the JSON-serialized user
pub const USER_KEY: &str = "user";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Refusing to store an empty token")]
    EmptyToken,

    #[error("Failed to serialize user: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Client-perceived authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated(User),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            AuthState::Anonymous => None,
        }
    }
}

/// Single source of truth for "is there a logged-in user, and who".
///
/// Implementations never perform network I/O.
pub trait SessionStore: Send + Sync {
    /// Persist a token and its user together.
    fn save(&self, token: &str, user: &User) -> Result<(), SessionError>;

    /// Remove token and user. Idempotent and infallible.
    fn clear(&self);

    /// The stored user, or `None` when absent or unreadable.
    fn current_user(&self) -> Option<User>;

    fn token(&self) -> Option<String>;

    /// True iff a token is present. The token itself is not validated.
    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Authenticated only when both a token and a readable user are stored;
    /// a corrupted user record reads as anonymous.
    fn state(&self) -> AuthState {
        match (self.token(), self.current_user()) {
            (Some(_), Some(user)) => AuthState::Authenticated(user),
            _ => AuthState::Anonymous,
        }
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn save(&self, token: &str, user: &User) -> Result<(), SessionError> {
        (**self).save(token, user)
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn current_user(&self) -> Option<User> {
        (**self).current_user()
    }

    fn token(&self) -> Option<String> {
        (**self).token()
    }

    fn is_authenticated(&self) -> bool {
        (**self).is_authenticated()
    }

    fn state(&self) -> AuthState {
        (**self).state()
    }
}

/// [`SessionStore`] over the `authToken` and `user` keys of a
/// [`KeyValueStore`].
///
/// `save` and `clear` are serialized so they cannot interleave into a token
/// stored without its user.
pub struct Session<S> {
    storage: S,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Put the user key back to what it held before a failed save
    fn restore_user(&self, previous: Option<String>) {
        let restored = match previous {
            Some(ref value) => self.storage.set(USER_KEY, value),
            None => self.storage.remove(USER_KEY),
        };
        if let Err(e) = restored {
            warn!(error = %e, "Failed to restore previous user after aborted save");
        }
    }
}

impl<S: KeyValueStore> SessionStore for Session<S> {
    fn save(&self, token: &str, user: &User) -> Result<(), SessionError> {
        if token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        let user_json = serde_json::to_string(user)?;

        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        // User first, token last: the token's presence marks the session as
        // active, so it must never land without its user.
        let previous_user = self.storage.get(USER_KEY).ok().flatten();
        self.storage.set(USER_KEY, &user_json)?;
        if let Err(e) = self.storage.set(TOKEN_KEY, token) {
            self.restore_user(previous_user);
            return Err(e.into());
        }

        debug!(user_id = user.id, "Session saved");
        Ok(())
    }

    fn clear(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());

        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            warn!(error = %e, "Failed to remove stored token");
        }
        if let Err(e) = self.storage.remove(USER_KEY) {
            warn!(error = %e, "Failed to remove stored user");
        }
        debug!("Session cleared");
    }

    fn current_user(&self) -> Option<User> {
        let raw = match self.storage.get(USER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Failed to read stored user");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(error = %e, "Stored user record is corrupted, treating as logged out");
                None
            }
        }
    }

    fn token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
