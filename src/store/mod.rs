//! Credential store — the only owner of persisted session state.
//!
//! SYSTEM CONTEXT
//! ==============
//! The dispatcher reads the bearer token from here on every authenticated
//! call and clears the store on a 401. Auth operations write token/user
//! after register/login and refresh the cached user after `/auth/me`.
//!
//! DESIGN
//! ======
//! Three string-keyed entries mirror the browser layout: the bearer token,
//! the JSON user snapshot, and (only when a TTL is configured) an expiry
//! timestamp. Every write goes through `CredentialStore` under one lock so
//! a generation counter can order late completions against credential
//! changes: a refresh or a 401 from a request sent before a logout or a new
//! login observes a newer generation and leaves the store alone.
//!
//! Write failures from a persistent backend are logged and absorbed. The
//! store's callers never block a login on a disk error.

pub mod storage;

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};

pub const TOKEN_KEY: &str = "profitwavy_token";
pub const USER_KEY: &str = "profitwavy_user";
pub const EXPIRES_AT_KEY: &str = "profitwavy_expires_at";

// =============================================================================
// USER SNAPSHOT
// =============================================================================

/// Cached, denormalized identity snapshot returned by the backend.
///
/// Advisory only. Never consult it for authorization; the server decides
/// access from the bearer token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_returns: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
    /// Any other fields the backend sent, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// Best display name: `fullName`, falling back to a legacy `name` field.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .or_else(|| self.extra.get("name").and_then(serde_json::Value::as_str))
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Cheap-to-clone handle over the shared storage backend.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn Storage>,
    ttl: Option<Duration>,
    /// Bumped whenever the credential changes: every `clear()` and every
    /// token write. Guards late refresh writes and late 401s.
    generation: Mutex<u64>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_ttl(storage, None)
    }

    /// Build a store whose saved tokens lapse after `ttl`.
    #[must_use]
    pub fn with_ttl(storage: Arc<dyn Storage>, ttl: Option<Duration>) -> Self {
        Self { inner: Arc::new(Inner { storage, ttl, generation: Mutex::new(0) }) }
    }

    /// Write whichever of `token`/`user` is provided. The other entry is left
    /// untouched. A new token starts a new generation.
    pub fn save(&self, token: Option<&str>, user: Option<&User>) {
        let mut generation = self.lock_generation();
        if token.is_some() {
            *generation += 1;
        }
        self.write_entries(token, user);
    }

    /// Current credential generation. Capture before an async call and pass
    /// to [`CredentialStore::save_user_if_current`] or
    /// [`CredentialStore::clear_if_current`].
    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.lock_generation()
    }

    /// Write `user` only if the credential has not changed since
    /// `generation` was read. Returns whether the write happened.
    pub fn save_user_if_current(&self, generation: u64, user: &User) -> bool {
        let current = self.lock_generation();
        if *current != generation {
            tracing::debug!(expected = generation, current = *current, "dropping stale user refresh");
            return false;
        }
        self.write_entries(None, Some(user));
        true
    }

    /// Bearer token, or `None` when absent or past its TTL.
    #[must_use]
    pub fn load_token(&self) -> Option<String> {
        if self.ttl_elapsed() {
            return None;
        }
        self.inner.storage.get_item(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Cached user snapshot. Malformed data reads as `None`.
    #[must_use]
    pub fn load_user(&self) -> Option<User> {
        let raw = self.inner.storage.get_item(USER_KEY)?;
        match serde_json::from_str::<Option<User>>(&raw) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed cached user");
                None
            }
        }
    }

    /// Remove token, user and expiry. Idempotent.
    pub fn clear(&self) {
        let mut generation = self.lock_generation();
        self.clear_locked(&mut generation);
    }

    /// Clear only if the credential is still the one seen at `generation`.
    /// Returns whether the clear happened.
    pub fn clear_if_current(&self, generation: u64) -> bool {
        let mut current = self.lock_generation();
        if *current != generation {
            tracing::debug!(expected = generation, current = *current, "keeping newer session");
            return false;
        }
        self.clear_locked(&mut current);
        true
    }

    /// True iff a live token or a cached user is present. A liveness
    /// heuristic only; the server still decides validity.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        if self.ttl_elapsed() {
            return false;
        }
        self.load_token().is_some() || self.load_user().is_some()
    }

    /// Clear the store if its TTL has lapsed. Returns whether it did.
    pub fn purge_expired(&self) -> bool {
        if !self.ttl_elapsed() {
            return false;
        }
        self.clear();
        true
    }

    /// True when a TTL was recorded and has passed.
    #[must_use]
    pub fn ttl_elapsed(&self) -> bool {
        let Some(raw) = self.inner.storage.get_item(EXPIRES_AT_KEY) else {
            return false;
        };
        match raw.parse::<u64>() {
            Ok(expires_at) => unix_now() >= expires_at,
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring malformed session expiry");
                false
            }
        }
    }

    fn clear_locked(&self, generation: &mut u64) {
        *generation += 1;
        for key in [TOKEN_KEY, USER_KEY, EXPIRES_AT_KEY] {
            if let Err(e) = self.inner.storage.remove_item(key) {
                tracing::warn!(key, error = %e, "failed to remove session entry");
            }
        }
    }

    fn write_entries(&self, token: Option<&str>, user: Option<&User>) {
        let storage = &self.inner.storage;
        if let Some(token) = token {
            if let Err(e) = storage.set_item(TOKEN_KEY, token) {
                tracing::warn!(error = %e, "failed to persist session token");
            }
            self.write_expiry();
        }
        if let Some(user) = user {
            let written = serde_json::to_string(user)
                .map_err(StorageError::from)
                .and_then(|raw| storage.set_item(USER_KEY, &raw));
            if let Err(e) = written {
                tracing::warn!(error = %e, "failed to persist cached user");
            }
        }
    }

    fn write_expiry(&self) {
        let storage = &self.inner.storage;
        let result = match self.inner.ttl {
            Some(ttl) => {
                let expires_at = unix_now().saturating_add(ttl.as_secs());
                storage.set_item(EXPIRES_AT_KEY, &expires_at.to_string())
            }
            None => storage.remove_item(EXPIRES_AT_KEY),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist session expiry");
        }
    }

    fn lock_generation(&self) -> std::sync::MutexGuard<'_, u64> {
        self.inner
            .generation
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("ttl", &self.inner.ttl)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
