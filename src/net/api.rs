//! REST client shared by every view that talks to the Chama Frete API.
//!
//! Each request passes through two stages around the transport:
//! [`authorize_request`] before sending and [`SessionGuard::inspect`] after
//! a non-success status. The guard's side effects never replace the
//! outcome; the caller still receives the original error.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures come back as [`ApiError::Transport`] or
//! [`ApiError::Timeout`], non-2xx statuses as [`ApiError::Status`]. Nothing
//! is retried.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::auth::authorize_request;
use super::config::ClientConfig;
use super::guard::SessionGuard;
use super::types::ApiError;
use crate::state::session::{Session, SessionState};
use crate::util::navigation::Navigator;
use crate::util::storage::{KeyValueStore, StorageError};

/// Build a client over `store` and `navigator` with explicit configuration.
///
/// # Errors
///
/// Returns an error if the base URL is not absolute or the HTTP client
/// cannot be built.
pub fn create_client(
    config: ClientConfig,
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
) -> Result<ApiClient, ApiError> {
    validate_base_url(&config.base_url)?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let http = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .build()
        .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;

    let session = Session::new(store);
    let guard = SessionGuard::new(
        session.clone(),
        navigator,
        config.public_page_paths.clone(),
        config.login_path.clone(),
    );
    tracing::debug!(base_url = %config.base_url, timeout_secs = config.timeout.as_secs(), "api client created");
    Ok(ApiClient { http, config, session, guard })
}

fn validate_base_url(base_url: &str) -> Result<(), ApiError> {
    let url = reqwest::Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidBaseUrl(base_url.to_owned()));
    }
    Ok(())
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') { format!("{base}{path}") } else { format!("{base}/{path}") }
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    session: Session,
    guard: SessionGuard,
}

impl ApiClient {
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Absolute URL for `path`. Absolute `http(s)` URLs are used as given.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        join_url(&self.config.base_url, path)
    }

    /// Start a request against `path`. The only way to send it is
    /// [`ApiRequest::send`], which runs credential attachment and the 401 guard.
    pub fn request(&self, method: Method, path: &str) -> ApiRequest<'_> {
        ApiRequest { client: self, builder: self.http.request(method, self.url(path)) }
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let mut request = builder.build()?;
        authorize_request(&mut request, &self.session, &self.config.public_request_suffixes);

        let method = request.method().clone();
        let path = request.url().path().to_owned();
        let response = self.http.execute(request).await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        self.guard.inspect(status);
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, "error body unreadable");
                String::new()
            }
        };
        tracing::debug!(%method, %path, status = status.as_u16(), "request rejected");
        Err(ApiError::Status { status: status.as_u16(), body })
    }

    /// `GET path`, decoding a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiRequest::send_json`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path).send_json().await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path).json(body).send_json().await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path).json(body).send_json().await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, path).json(body).send_json().await
    }

    /// `DELETE path`. An empty body decodes as JSON `null`.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::DELETE, path).send_json().await
    }

    /// `POST path` as `multipart/form-data` (file uploads).
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path).multipart(form).send_json().await
    }

    /// Explicit logout: drop the token and cached profile.
    ///
    /// # Errors
    ///
    /// Returns the storage error; the token/profile pair is left intact.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.session.clear()
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout { after: self.config.timeout }
        } else {
            ApiError::Transport(e)
        }
    }
}

/// A request bound to its [`ApiClient`]. Headers set here take precedence
/// over the client defaults; `.json()` sets `Content-Type: application/json`.
#[must_use = "requests do nothing until sent"]
pub struct ApiRequest<'a> {
    client: &'a ApiClient,
    builder: RequestBuilder,
}

impl ApiRequest<'_> {
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    pub fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Self {
        self.builder = self.builder.query(query);
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        self.builder = self.builder.json(body);
        self
    }

    pub fn multipart(mut self, form: reqwest::multipart::Form) -> Self {
        self.builder = self.builder.multipart(form);
        self
    }

    /// Authenticate, send, and guard the request.
    ///
    /// # Errors
    ///
    /// Returns the transport failure, timeout, or non-success status.
    pub async fn send(self) -> Result<Response, ApiError> {
        self.client.execute(self.builder).await
    }

    /// [`Self::send`], then decode the body as JSON. An empty body decodes as `null`.
    ///
    /// # Errors
    ///
    /// See [`Self::send`]; also [`ApiError::Decode`] for unexpected bodies.
    pub async fn send_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let client = self.client;
        let response = self.send().await?;
        let text = response.text().await.map_err(|e| client.transport_error(e))?;
        parse_body(&text)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}
