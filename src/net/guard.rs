//! Response session guard: turns a 401 into a clean logout.
//!
//! DESIGN
//! ======
//! Only status 401 is special-cased. The token and cached profile are both
//! cleared, then the user is sent to the login page with a hard redirect
//! unless the current location is already a public page. The public page
//! list is exact-matched and is configured separately from the request
//! suffix list in [`crate::net::auth`]; the two lists differ on purpose
//! (`/forgot-password` here, `/reset-password` there).
//!
//! Two concurrent 401s both clear storage. The second redirect is skipped
//! because the navigator then reports the login page.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::sync::Arc;

use reqwest::StatusCode;

use crate::state::session::Session;
use crate::util::navigation::Navigator;

/// What the guard did with a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Not a 401; nothing touched.
    Passed,
    /// Session was cleared; `redirected` tells whether navigation fired.
    SessionCleared { redirected: bool },
}

#[derive(Clone)]
pub struct SessionGuard {
    session: Session,
    navigator: Arc<dyn Navigator>,
    public_pages: Vec<String>,
    login_path: String,
}

impl SessionGuard {
    pub fn new(
        session: Session,
        navigator: Arc<dyn Navigator>,
        public_pages: Vec<String>,
        login_path: String,
    ) -> Self {
        Self { session, navigator, public_pages, login_path }
    }

    /// Whether `path` is exactly one of the public pages.
    #[must_use]
    pub fn is_public_page(&self, path: &str) -> bool {
        self.public_pages.iter().any(|page| page == path)
    }

    /// Run session side effects for a response status.
    pub fn inspect(&self, status: StatusCode) -> GuardOutcome {
        if status != StatusCode::UNAUTHORIZED {
            return GuardOutcome::Passed;
        }

        if let Err(e) = self.session.clear() {
            tracing::warn!(error = %e, "session teardown after 401 incomplete");
        }

        let current = self.navigator.current_path();
        if current.as_deref().is_some_and(|path| self.is_public_page(path)) {
            tracing::debug!(path = ?current, "401 on public page; redirect skipped");
            return GuardOutcome::SessionCleared { redirected: false };
        }

        tracing::info!(from = ?current, to = %self.login_path, "session rejected; forcing login");
        self.navigator.redirect(&self.login_path);
        GuardOutcome::SessionCleared { redirected: true }
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("public_pages", &self.public_pages)
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}
