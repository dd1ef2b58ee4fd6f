//! Transport configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3333";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const LOGIN_PAGE_PATH: &str = "/login";

/// API path suffixes that never carry credentials.
pub const DEFAULT_PUBLIC_REQUEST_SUFFIXES: [&str; 3] = ["/login", "/register", "/reset-password"];

/// Page paths on which a 401 does not trigger a redirect.
pub const DEFAULT_PUBLIC_PAGE_PATHS: [&str; 3] = ["/login", "/register", "/forgot-password"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base address every request path is appended to (no trailing `/`).
    pub base_url: String,
    /// Ceiling after which an in-flight request is abandoned.
    pub timeout: Duration,
    /// Suffix-matched against the outgoing request path.
    pub public_request_suffixes: Vec<String>,
    /// Exact-matched against the current page location.
    pub public_page_paths: Vec<String>,
    /// Target of the forced redirect after a 401.
    pub login_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            public_request_suffixes: to_owned_list(&DEFAULT_PUBLIC_REQUEST_SUFFIXES),
            public_page_paths: to_owned_list(&DEFAULT_PUBLIC_PAGE_PATHS),
            login_path: LOGIN_PAGE_PATH.to_owned(),
        }
    }
}

impl ClientConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `API_BASE_URL`: default `http://localhost:3333`
    /// - `API_PUBLIC_REQUEST_SUFFIXES`: comma separated, default `/login,/register,/reset-password`
    /// - `API_PUBLIC_PAGE_PATHS`: comma separated, default `/login,/register,/forgot-password`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let base_url = lookup("API_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_owned())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.base_url);
        let public_request_suffixes =
            parse_list(lookup("API_PUBLIC_REQUEST_SUFFIXES").as_deref()).unwrap_or(defaults.public_request_suffixes);
        let public_page_paths =
            parse_list(lookup("API_PUBLIC_PAGE_PATHS").as_deref()).unwrap_or(defaults.public_page_paths);

        Self { base_url, public_request_suffixes, public_page_paths, ..defaults }
    }

    /// Override the base URL, trimming any trailing `/`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

fn parse_list(raw: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();
    if items.is_empty() { None } else { Some(items) }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
