use crate::vault::{TransportError, VaultTransport, vault_error_message};
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde_json::{Map, Value};
use std::future::Future;
use thiserror::Error;
use tracing::{Instrument, info_span};

/// Unordered field map of a secret record.
pub type Fields = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no such key")]
    NotFound,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{url} - {status}, {message}")]
    Status {
        url: String,
        status: StatusCode,
        message: String,
    },
    #[error("unexpected response from {url}: {reason}")]
    InvalidResponse { url: String, reason: &'static str },
}

/// Read-only view of a hierarchical secret store.
///
/// Implementations are shared by every traversal task, so they must be safe
/// for concurrent use.
pub trait SecretStore: Send + Sync + 'static {
    /// Child names of a directory key. Sub-directories carry a trailing `/`.
    fn list(&self, key: &str) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Field map of a leaf key, `None` when the key exists but holds no data.
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<Fields>, StoreError>> + Send;
}

/// [`SecretStore`] over Vault's logical API (`LIST` as `GET ?list=true`).
#[derive(Clone)]
pub struct VaultStore {
    transport: VaultTransport,
    token: SecretString,
}

impl VaultStore {
    #[must_use]
    pub fn new(transport: VaultTransport, token: SecretString) -> Self {
        Self { transport, token }
    }

    async fn get(&self, key: &str, list: bool) -> Result<Value, StoreError> {
        let url = self.transport.api_url(key, list)?;
        let response = self
            .transport
            .request_json(Method::GET, url, Some(&self.token), None)
            .await?;

        if response.status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound);
        }

        if !response.status.is_success() {
            return Err(StoreError::Status {
                message: vault_error_message(&response.body).to_string(),
                url: response.url,
                status: response.status,
            });
        }

        Ok(response.body)
    }
}

impl SecretStore for VaultStore {
    async fn list(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let span = info_span!("vault.list", key = %key);
        let body = self.get(key, true).instrument(span).await?;

        let Some(keys) = body.get("data").and_then(|data| data.get("keys")) else {
            return Ok(Vec::new());
        };

        let keys = keys.as_array().ok_or_else(|| StoreError::InvalidResponse {
            url: key.to_string(),
            reason: "data.keys is not an array",
        })?;

        Ok(keys
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }

    async fn read(&self, key: &str) -> Result<Option<Fields>, StoreError> {
        let span = info_span!("vault.read", key = %key);
        let body = self.get(key, false).instrument(span).await?;

        match body.get("data") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(fields)) => Ok(Some(fields.clone())),
            Some(_) => Err(StoreError::InvalidResponse {
                url: key.to_string(),
                reason: "data is not an object",
            }),
        }
    }
}

impl std::fmt::Debug for VaultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultStore")
            .field("transport", &self.transport)
            .field("token", &"***")
            .finish()
    }
}
