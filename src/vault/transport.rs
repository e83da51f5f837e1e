//! HTTP plumbing shared by the session bootstrap and the secret store.
//!
//! Every call goes through [`VaultTransport::request_json`], which attaches the
//! token header, applies the client timeouts and hands back status plus JSON
//! body. Interpreting the status is left to the caller so that "not found" can
//! be told apart from real failures.

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

const VAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const VAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("invalid JSON body from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("vault address cannot be used as a base URL: {0}")]
    Base(String),
}

/// Response wrapper for Vault requests.
#[derive(Debug)]
pub struct VaultResponse {
    pub url: String,
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Clone)]
pub struct VaultTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl VaultTransport {
    /// Build a transport for the given Vault address.
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(user_agent: &str, base_url: Url) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(VAULT_CONNECT_TIMEOUT)
            .timeout(VAULT_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the `/v1/...` URL for a logical path. Segments are percent-encoded
    /// individually and empty segments are dropped, so `a//b/` and `a/b` map to
    /// the same URL.
    /// # Errors
    /// Returns an error if the base URL cannot carry a path.
    pub fn api_url(&self, path: &str, list: bool) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);

        url.path_segments_mut()
            .map_err(|()| TransportError::Base(self.base_url.to_string()))?
            .clear()
            .push("v1")
            .extend(path.split('/').filter(|segment| !segment.is_empty()));

        if list {
            url.query_pairs_mut().append_pair("list", "true");
        }

        Ok(url)
    }

    /// Execute a request and decode the body as JSON. An empty body decodes
    /// to `Value::Null`.
    /// # Errors
    /// Returns an error if the request fails or the response body is not JSON.
    pub async fn request_json(
        &self,
        method: Method,
        url: Url,
        token: Option<&SecretString>,
        body: Option<&Value>,
    ) -> Result<VaultResponse, TransportError> {
        let url_display = url.to_string();
        debug!("vault request: {} {}", method, url_display);

        let mut request = self
            .client
            .request(method, url)
            .header("Accept", "application/json");
        if let Some(token) = token {
            request = request.header("X-Vault-Token", token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|source| TransportError::Json {
                url: url_display.clone(),
                source,
            })?
        };

        Ok(VaultResponse {
            url: url_display,
            status,
            body,
        })
    }
}

impl std::fmt::Debug for VaultTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
