//! Error taxonomy surfaced to calling views.

use std::time::Duration;

/// Errors produced by [`crate::net::api::ApiClient`] calls.
///
/// The client never swallows a failure: session side effects run first and
/// the original outcome is then handed back through one of these variants.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The configured base URL is not an absolute URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request exceeded the transport timeout and was abandoned.
    #[error("request timed out after {}s", .after.as_secs())]
    Timeout { after: Duration },

    /// Network, DNS, or connection failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API response error: status {status}")]
    Status { status: u16, body: String },

    /// A success body could not be deserialized.
    #[error("API response parse failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status for [`ApiError::Status`], `None` otherwise.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the session (401).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
