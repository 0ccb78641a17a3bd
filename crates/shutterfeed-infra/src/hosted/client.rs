//! Shared HTTP client for the hosted platform's REST surface.
//!
//! Every request carries the project API key in an `apikey` header. The
//! `Authorization` bearer is the signed-in user's access token when there is
//! one, else the API key itself. Neither value is ever logged.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use shutterfeed_types::error::RepositoryError;

/// Cheap to clone; clones share the access token slot.
#[derive(Clone)]
pub struct HostedClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    access_token: RwLock<Option<SecretString>>,
}

impl HostedClient {
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
                access_token: RwLock::new(None),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Build the full URL for a path beginning with `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    /// Use `token` as the bearer for subsequent requests, or fall back to the
    /// API key when `None`.
    pub fn set_access_token(&self, token: Option<SecretString>) {
        if let Ok(mut slot) = self.inner.access_token.write() {
            *slot = token;
        }
    }

    pub fn has_access_token(&self) -> bool {
        self.inner
            .access_token
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    fn bearer(&self) -> String {
        let token = self
            .inner
            .access_token
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(|t| t.expose_secret().to_string()));
        token.unwrap_or_else(|| self.inner.api_key.expose_secret().to_string())
    }

    /// Start an authenticated request to `path`.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, self.url(path))
            .header("apikey", self.inner.api_key.expose_secret())
            .bearer_auth(self.bearer())
    }

    /// Send and decode a JSON body, mapping HTTP failures to `RepositoryError`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, RepositoryError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RepositoryError::Query(format!("failed to parse response: {e}")))
    }

    /// Send, returning the response only if the status is a success.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, RepositoryError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "hosted request failed");
            RepositoryError::Connection
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, body))
    }
}

/// Map a failed HTTP status onto the port error vocabulary.
pub fn status_error(status: StatusCode, body: String) -> RepositoryError {
    match status.as_u16() {
        404 => RepositoryError::NotFound,
        409 => RepositoryError::Conflict(body),
        // The table API reports unique violations as 23505.
        400 if body.contains("23505") || body.contains("Duplicate") => {
            RepositoryError::Conflict(body)
        }
        408 | 429 | 500..=599 => RepositoryError::Connection,
        _ => RepositoryError::Query(format!("HTTP {status}: {body}")),
    }
}
