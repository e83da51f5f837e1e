//! Session bootstrap: turn an address plus credentials into a usable store.
//!
//! A configured token is checked with `lookup-self` first. When it is missing
//! or rejected and a GitHub access token is available, the GitHub auth method
//! is used to obtain a fresh client token. Failing both is the only fatal
//! error of a harvest.

use crate::vault::{TransportError, VaultStore, VaultTransport, parse_address, vault_error_message};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{Instrument, debug, info_span, instrument};

pub const DEFAULT_GITHUB_MOUNT: &str = "github";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid vault address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("unable to create client: {0}")]
    Client(#[source] reqwest::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("vault token rejected: {0}")]
    TokenRejected(String),
    #[error("login did not work: {0}")]
    Login(String),
    #[error("no vault credentials: provide a token or a GitHub access token")]
    MissingCredentials,
}

#[derive(Clone)]
pub struct VaultSettings {
    pub address: String,
    pub token: Option<SecretString>,
    pub github_token: Option<SecretString>,
    pub github_mount: String,
}

impl VaultSettings {
    #[must_use]
    pub fn new(address: String) -> Self {
        Self {
            address,
            token: None,
            github_token: None,
            github_mount: DEFAULT_GITHUB_MOUNT.to_string(),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    #[must_use]
    pub fn with_github_token(mut self, token: SecretString) -> Self {
        self.github_token = Some(token);
        self
    }
}

impl std::fmt::Debug for VaultSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSettings")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("github_token", &self.github_token.as_ref().map(|_| "***"))
            .field("github_mount", &self.github_mount)
            .finish()
    }
}

/// Establish a session and return a store bound to a valid client token.
///
/// # Errors
/// Returns an error if the address is invalid, the client cannot be built, or
/// neither the configured token nor the GitHub login yields a usable token.
#[instrument(skip(settings), fields(address = %settings.address))]
pub async fn establish(settings: &VaultSettings) -> Result<VaultStore, SessionError> {
    let base_url = parse_address(&settings.address)?;
    let transport =
        VaultTransport::new(crate::APP_USER_AGENT, base_url).map_err(SessionError::Client)?;

    let mut rejection = None;

    if let Some(token) = &settings.token {
        match lookup_self(&transport, token).await {
            Ok(ttl) => {
                debug!("Token is valid for another {}s", ttl);
                return Ok(VaultStore::new(transport, token.clone()));
            }
            Err(e) => {
                debug!("Token did not meet requirements: {}", e);
                rejection = Some(e);
            }
        }
    }

    if let Some(github_token) = &settings.github_token {
        let token = github_login(&transport, &settings.github_mount, github_token).await?;
        return Ok(VaultStore::new(transport, token));
    }

    Err(rejection.unwrap_or(SessionError::MissingCredentials))
}

/// Validate a token, returning its remaining TTL in seconds.
async fn lookup_self(transport: &VaultTransport, token: &SecretString) -> Result<u64, SessionError> {
    let url = transport.api_url("auth/token/lookup-self", false)?;

    let span = info_span!("vault.lookup_self", http.method = "GET", url = %url);
    let response = transport
        .request_json(Method::GET, url, Some(token), None)
        .instrument(span)
        .await?;

    if !response.status.is_success() {
        return Err(SessionError::TokenRejected(format!(
            "{} - {}, {}",
            response.url,
            response.status,
            vault_error_message(&response.body)
        )));
    }

    let data = response
        .body
        .get("data")
        .filter(|data| !data.is_null())
        .ok_or_else(|| SessionError::TokenRejected("lookup-self returned no data".to_string()))?;

    Ok(data.get("ttl").and_then(Value::as_u64).unwrap_or(0))
}

/// Exchange a GitHub access token for a Vault client token.
async fn github_login(
    transport: &VaultTransport,
    mount: &str,
    github_token: &SecretString,
) -> Result<SecretString, SessionError> {
    let url = transport.api_url(&format!("auth/{mount}/login"), false)?;
    let payload = json!({ "token": github_token.expose_secret() });

    let span = info_span!("vault.github_login", http.method = "POST", url = %url);
    let response = transport
        .request_json(Method::POST, url, None, Some(&payload))
        .instrument(span)
        .await?;

    if !response.status.is_success() {
        return Err(SessionError::Login(format!(
            "{} - {}, {}",
            response.url,
            response.status,
            vault_error_message(&response.body)
        )));
    }

    response
        .body
        .get("auth")
        .and_then(|auth| auth.get("client_token"))
        .and_then(Value::as_str)
        .map(|token| SecretString::from(token.to_string()))
        .ok_or_else(|| SessionError::Login("no client_token found".to_string()))
}
