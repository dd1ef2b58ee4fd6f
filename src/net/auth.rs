//! Request authenticator: attaches the bearer token to outgoing requests.
//!
//! DESIGN
//! ======
//! A request is public when its URL path ends with one of the configured
//! suffixes (`/login`, `/register`, `/reset-password` by default). Matching
//! is by suffix, not equality, so `/v2/login` is public too. This also means
//! any unrelated endpoint whose last segment is `login` skips credentials.
//!
//! ERROR HANDLING
//! ==============
//! Attachment fails open: if storage cannot be read, or the token is not a
//! valid header value, the request proceeds without credentials.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use reqwest::Request;
use reqwest::header::{AUTHORIZATION, HeaderValue};

use crate::state::session::Session;

/// Whether `path` ends with any of `suffixes`.
pub fn is_public_request(path: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
}

fn bearer_value(token: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            Some(value)
        }
        Err(_) => None,
    }
}

/// Set `Authorization: Bearer <token>` on `request` unless the target is public
/// or no token is stored. Returns whether a header was attached.
pub fn authorize_request(request: &mut Request, session: &Session, public_suffixes: &[String]) -> bool {
    let path = request.url().path();
    if is_public_request(path, public_suffixes) {
        tracing::debug!(%path, "public route; credentials skipped");
        return false;
    }

    let token = match session.token() {
        Ok(Some(token)) => token,
        Ok(None) => return false,
        Err(e) => {
            tracing::warn!(error = %e, %path, "session storage unreadable; sending without credentials");
            return false;
        }
    };

    let Some(value) = bearer_value(&token) else {
        tracing::warn!(%path, "stored token is not a valid header value; sending without credentials");
        return false;
    };

    tracing::debug!(%path, "attaching bearer credentials");
    request.headers_mut().insert(AUTHORIZATION, value);
    true
}
