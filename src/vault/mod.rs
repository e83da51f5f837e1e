pub mod session;
pub mod store;
pub mod transport;

pub use session::{SessionError, VaultSettings};
pub use store::{Fields, SecretStore, StoreError, VaultStore};
pub use transport::{TransportError, VaultResponse, VaultTransport};

use serde_json::Value;
use url::Url;

/// First entry of the `errors` array Vault returns on failures.
pub(crate) fn vault_error_message(json_response: &Value) -> &str {
    json_response
        .get("errors")
        .and_then(|v| v.get(0))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Parse and validate the Vault address.
///
/// # Errors
/// Returns an error if `address` cannot be parsed, has no host, or uses an unsupported scheme.
pub fn parse_address(address: &str) -> Result<Url, SessionError> {
    let invalid = |reason: String| SessionError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let url = Url::parse(address).map_err(|e| invalid(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(format!("unsupported scheme {scheme}"))),
    }

    if url.host().is_none() {
        return Err(invalid("no host specified".to_string()));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use serde_json::json;

    #[test]
    fn parse_address_accepts_http_and_https() -> Result<()> {
        let url = parse_address("http://127.0.0.1:8200")?;
        assert_eq!(url.port_or_known_default(), Some(8200));

        let url = parse_address("https://vault.example.com")?;
        assert_eq!(url.port_or_known_default(), Some(443));
        Ok(())
    }

    #[test]
    fn parse_address_rejects_unsupported_scheme() -> Result<()> {
        let err = parse_address("ftp://vault.example.com")
            .err()
            .ok_or_else(|| anyhow!("expected error"))?;
        assert!(err.to_string().contains("unsupported scheme"));
        Ok(())
    }

    #[test]
    fn parse_address_rejects_garbage() {
        assert!(parse_address("vault.example.com").is_err());
    }

    #[test]
    fn vault_error_message_picks_first_error() {
        let body = json!({"errors": ["permission denied", "other"]});
        assert_eq!(vault_error_message(&body), "permission denied");
        assert_eq!(vault_error_message(&json!({})), "");
    }
}
