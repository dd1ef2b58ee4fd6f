//! Navigation capability used for forced logouts.
//!
//! SYSTEM CONTEXT
//! ==============
//! After a 401 the session guard checks where the user currently is and,
//! unless already on a public page, performs a hard redirect to the login
//! page. The browser implementation reloads the document; other hosts
//! decide what a redirect means for them.

#[cfg(test)]
#[path = "navigation_test.rs"]
mod navigation_test;

use std::sync::Mutex;

/// Reads the current location and performs full-page redirects.
pub trait Navigator: Send + Sync {
    /// Path of the current location, `None` when unknown.
    fn current_path(&self) -> Option<String>;

    /// Navigate to `path`, discarding in-memory application state.
    fn redirect(&self, path: &str);
}

/// In-memory navigator that tracks its location and records redirects.
///
/// A redirect moves the location, so a second forced logout issued while
/// already on the login page is suppressed the same way a browser would.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    inner: Mutex<MemoryLocation>,
}

#[derive(Debug, Default)]
struct MemoryLocation {
    current: Option<String>,
    redirects: Vec<String>,
}

impl MemoryNavigator {
    /// Start at `path`.
    pub fn at(path: impl Into<String>) -> Self {
        Self { inner: Mutex::new(MemoryLocation { current: Some(path.into()), redirects: Vec::new() }) }
    }

    /// Move to `path` without recording a redirect (in-app route change).
    pub fn visit(&self, path: impl Into<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.current = Some(path.into());
        }
    }

    /// Redirect targets in the order they were issued.
    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|inner| inner.redirects.clone())
            .unwrap_or_default()
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> Option<String> {
        self.inner.lock().map_or(None, |inner| inner.current.clone())
    }

    fn redirect(&self, path: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.current = Some(path.to_owned());
            inner.redirects.push(path.to_owned());
        }
    }
}

/// `window.location`: redirects set `href`, which reloads the application.
#[cfg(feature = "web")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

#[cfg(feature = "web")]
impl Navigator for BrowserNavigator {
    fn current_path(&self) -> Option<String> {
        let window = web_sys::window()?;
        match window.location().pathname() {
            Ok(path) => Some(path),
            Err(_) => None,
        }
    }

    fn redirect(&self, path: &str) {
        let Some(window) = web_sys::window() else {
            tracing::warn!(%path, "no window; redirect skipped");
            return;
        };
        if let Err(e) = window.location().set_href(path) {
            tracing::warn!(%path, error = ?e, "redirect failed");
        }
    }
}
