//! Session lifecycle state and redirect policy.
//!
//! SYSTEM CONTEXT
//! ==============
//! Built once per page load (or CLI invocation) with an explicit
//! [`PageKind`]. The dispatcher reports 401s here; auth operations report
//! login/register success and logout.
//!
//! DESIGN
//! ======
//! ```text
//! Unknown ──check──▶ Authenticated ──401──▶ Expired ──cleared──▶ Anonymous
//!    └─────check───────────────────────────────────────────────▶ Anonymous
//! ```
//! Every redirect goes through one gate that allows a single redirect per
//! session epoch. A new epoch starts when a login or registration succeeds.
//! Expiry never redirects while the current page is itself an auth page.

pub mod navigator;

use std::sync::{Arc, Mutex};

use crate::config::{DEFAULT_DASHBOARD_PATH, DEFAULT_LOGIN_PATH};
use crate::store::CredentialStore;

pub use navigator::{Navigator, RecordingNavigator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Before the page-load check.
    Unknown,
    Authenticated,
    /// A 401 was observed or the TTL lapsed; the store is being cleared.
    Expired,
    Anonymous,
}

/// The page the controller serves. Replaces inspecting a global location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Login,
    Register,
    /// Requires a session (dashboard, deposit, withdraw, ...).
    Protected,
    /// Reachable with or without a session (landing, about, help).
    Public,
}

impl PageKind {
    /// Login and registration pages are exempt from expiry redirects.
    #[must_use]
    pub fn is_auth_page(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

/// Outcome of the page-load guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageDecision {
    Stay,
    Redirect(String),
}

#[derive(Debug)]
struct Lifecycle {
    state: SessionState,
    redirect_issued: bool,
}

/// Cheap-to-clone handle; clones share state.
#[derive(Clone)]
pub struct SessionController {
    lifecycle: Arc<Mutex<Lifecycle>>,
    navigator: Arc<dyn Navigator>,
    page: PageKind,
    login_path: String,
    dashboard_path: String,
}

impl SessionController {
    #[must_use]
    pub fn new(page: PageKind, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            lifecycle: Arc::new(Mutex::new(Lifecycle { state: SessionState::Unknown, redirect_issued: false })),
            navigator,
            page,
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            dashboard_path: DEFAULT_DASHBOARD_PATH.to_owned(),
        }
    }

    #[must_use]
    pub fn with_routes(mut self, login_path: impl Into<String>, dashboard_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self.dashboard_path = dashboard_path.into();
        self
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    #[must_use]
    pub fn page(&self) -> PageKind {
        self.page
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Page-load check. Resolves `Unknown` once; later calls return the
    /// current state unchanged.
    pub fn check(&self, store: &CredentialStore) -> SessionState {
        let mut lifecycle = self.lock();
        if lifecycle.state != SessionState::Unknown {
            return lifecycle.state;
        }

        if store.purge_expired() {
            tracing::info!(page = ?self.page, "session ttl elapsed");
            lifecycle.state = SessionState::Expired;
            let target = self.expiry_redirect(&mut lifecycle);
            lifecycle.state = SessionState::Anonymous;
            drop(lifecycle);
            self.navigate(target);
            return SessionState::Anonymous;
        }

        lifecycle.state = if store.is_authenticated() { SessionState::Authenticated } else { SessionState::Anonymous };
        tracing::debug!(page = ?self.page, state = ?lifecycle.state, "session checked");
        lifecycle.state
    }

    /// Page-load guard: protected pages need a session, auth pages bounce
    /// an existing session to the dashboard.
    pub fn guard(&self, store: &CredentialStore) -> PageDecision {
        let state = self.check(store);
        let decision = match (self.page, state) {
            (PageKind::Protected, SessionState::Anonymous) => PageDecision::Redirect(self.login_path.clone()),
            (PageKind::Login | PageKind::Register, SessionState::Authenticated) => {
                PageDecision::Redirect(self.dashboard_path.clone())
            }
            _ => PageDecision::Stay,
        };
        if let PageDecision::Redirect(target) = &decision {
            let target = self.claim_redirect(&mut self.lock(), target);
            self.navigate(target);
        }
        decision
    }

    /// Login or registration succeeded. Starts a new redirect epoch.
    pub fn on_authenticated(&self) {
        let mut lifecycle = self.lock();
        lifecycle.state = SessionState::Authenticated;
        lifecycle.redirect_issued = false;
    }

    /// The server rejected the credential. Redirects to login at most once
    /// per epoch, never from an auth page.
    pub fn on_unauthorized(&self) {
        let mut lifecycle = self.lock();
        tracing::info!(from = ?lifecycle.state, page = ?self.page, "session rejected by server");
        lifecycle.state = SessionState::Expired;
        let target = self.expiry_redirect(&mut lifecycle);
        drop(lifecycle);
        self.navigate(target);
    }

    /// The store has been cleared.
    pub fn on_cleared(&self) {
        self.lock().state = SessionState::Anonymous;
    }

    /// Local logout finished. Redirects to login unless this epoch already
    /// redirected.
    pub fn on_logout(&self) {
        let mut lifecycle = self.lock();
        lifecycle.state = SessionState::Anonymous;
        let target = self.claim_redirect(&mut lifecycle, &self.login_path);
        drop(lifecycle);
        self.navigate(target);
    }

    fn expiry_redirect(&self, lifecycle: &mut Lifecycle) -> Option<String> {
        if self.page.is_auth_page() {
            tracing::debug!(page = ?self.page, "already on auth page, not redirecting");
            return None;
        }
        self.claim_redirect(lifecycle, &self.login_path)
    }

    fn claim_redirect(&self, lifecycle: &mut Lifecycle, target: &str) -> Option<String> {
        if lifecycle.redirect_issued {
            tracing::debug!(target, "redirect already issued this session");
            return None;
        }
        lifecycle.redirect_issued = true;
        Some(target.to_owned())
    }

    // Called with the lock released so navigators may call back in.
    fn navigate(&self, target: Option<String>) {
        if let Some(target) = target {
            tracing::info!(target = %target, "redirecting");
            self.navigator.redirect(&target);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("page", &self.page)
            .field("lifecycle", &*self.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
