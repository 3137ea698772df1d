//! HTTP client factory bound to the backend base address.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every service holds a clone of [`ApiClient`]. Clones share one connection
//! pool and one cookie jar, so the session cookie written by `login` is sent
//! with every later call regardless of which service issues it.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ApiError, ResponseBody};

/// Name of the cookie carrying the backend identity session.
pub const SESSION_COOKIE_NAME: &str = ".AspNetCore.Identity.Application";

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    origin: Url,
    jar: Arc<Jar>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client with a fresh cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the base address is invalid or the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let origin = config.url()?;
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), origin, jar })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/api/chat/get`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.endpoint(path))
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.endpoint(path))
    }

    #[must_use]
    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.http.delete(self.endpoint(path))
    }

    /// Send a request and deserialize a JSON success body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Request`] on transport failure, [`ApiError::Status`]
    /// on a non-2xx answer and [`ApiError::Parse`] on a malformed body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = check_status(request.send().await?).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Send a request whose success body is irrelevant.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Request`] on transport failure and [`ApiError::Status`] on a non-2xx answer.
    pub async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        check_status(request.send().await?).await?;
        Ok(())
    }

    /// Send a request and hand back the open response for incremental reading.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Request`] on transport failure and [`ApiError::Status`] on a non-2xx answer.
    pub async fn send_streaming(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        check_status(request.send().await?).await
    }

    /// Whether the jar currently holds a session cookie for the backend.
    #[must_use]
    pub fn has_session_cookie(&self) -> bool {
        self.jar
            .cookies(&self.origin)
            .and_then(|header| header.to_str().map(str::to_owned).ok())
            .is_some_and(|cookies| {
                cookies
                    .split(';')
                    .any(|pair| pair.trim().split('=').next() == Some(SESSION_COOKIE_NAME))
            })
    }

    /// Expire the session cookie so later calls go out unauthenticated.
    pub fn remove_session_cookie(&self) {
        let expired = format!("{SESSION_COOKIE_NAME}=; Path=/; Max-Age=0");
        self.jar.add_cookie_str(&expired, &self.origin);
        tracing::debug!(cookie = SESSION_COOKIE_NAME, "session cookie removed");
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(ApiError::Status { status: status.as_u16(), body: ResponseBody::from_text(&text) })
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
