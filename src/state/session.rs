//! Session token and cached user profile.
//!
//! SYSTEM CONTEXT
//! ==============
//! The token is read on every outgoing request and destroyed on logout or
//! a 401. The cached profile is an opaque JSON blob kept next to it. The two
//! keys are written and deleted as a pair; a failed delete leaves both in place.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use serde_json::Value;

use crate::util::storage::{KeyValueStore, StorageError};

/// Namespace shared by every key the client persists.
pub const STORAGE_PREFIX: &str = "@ChamaFrete";
/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "@ChamaFrete:token";
/// Storage key holding the JSON-serialized user profile.
pub const USER_KEY: &str = "@ChamaFrete:user";

/// Session validity. There are no intermediate states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticated,
    Unauthenticated,
}

/// Handle over the token/profile pair in durable storage.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn KeyValueStore>,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the bearer token. A blank stored value counts as no token.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn token(&self) -> Result<Option<String>, StorageError> {
        let token = self.store.get(TOKEN_KEY)?;
        Ok(token.filter(|t| !t.trim().is_empty()))
    }

    /// Read and parse the cached profile.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or the stored value is not JSON.
    pub fn profile(&self) -> Result<Option<Value>, StorageError> {
        match self.store.get(USER_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Current session state. Unreadable storage counts as unauthenticated.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.token() {
            Ok(Some(_)) => SessionState::Authenticated,
            Ok(None) => SessionState::Unauthenticated,
            Err(e) => {
                tracing::warn!(error = %e, "session token unreadable");
                SessionState::Unauthenticated
            }
        }
    }

    /// Persist a freshly issued token together with the user's profile.
    ///
    /// If the profile cannot be written the token is removed again so the
    /// pair is never left half-populated.
    ///
    /// # Errors
    ///
    /// Returns the first storage error encountered.
    pub fn establish(&self, token: &str, profile: &Value) -> Result<(), StorageError> {
        let raw = serde_json::to_string(profile)?;
        self.store.set(TOKEN_KEY, token)?;
        if let Err(e) = self.store.set(USER_KEY, &raw) {
            if let Err(rollback) = self.store.remove(TOKEN_KEY) {
                tracing::warn!(error = %rollback, "token rollback failed");
            }
            return Err(e);
        }
        tracing::info!("session established");
        Ok(())
    }

    /// Delete both the token and the profile.
    ///
    /// The token goes first. If the profile then cannot be deleted the token
    /// is written back, so a failure never leaves a profile without its token.
    ///
    /// # Errors
    ///
    /// Returns the first storage error encountered.
    pub fn clear(&self) -> Result<(), StorageError> {
        let previous = self.store.get(TOKEN_KEY)?;
        self.store.remove(TOKEN_KEY)?;
        if let Err(e) = self.store.remove(USER_KEY) {
            if let Some(token) = previous {
                if let Err(restore) = self.store.set(TOKEN_KEY, &token) {
                    tracing::warn!(error = %restore, "token restore failed");
                }
            }
            return Err(e);
        }
        tracing::info!("session cleared");
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}
