//! Time-based code derivation.
//!
//! Secrets are stored the way authenticator apps export them: base32, often
//! lower-case and without padding. They are normalized before decoding.

use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use totp_rs::{Algorithm, Secret, TOTP};

pub const DEFAULT_DIGITS: u32 = 6;
pub const DEFAULT_PERIOD: u64 = 30;
pub const SKEW: u8 = 1;
pub const MAX_DIGITS: u32 = 9;

const PAD: char = '=';
const BLOCK: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeGenerationError {
    #[error("invalid secret: {0}")]
    InvalidSecret(String),
    #[error("unsupported parameters: {0}")]
    UnsupportedParameters(String),
}

#[derive(Debug, Clone, Copy)]
pub struct OtpParams<'a> {
    pub secret: &'a str,
    pub digits: u32,
    pub period: u64,
}

/// Derives a code for a secret at a given unix timestamp.
pub trait CodeGenerator: Send + Sync + 'static {
    /// Returns an empty string when there is nothing to derive from.
    ///
    /// # Errors
    /// Returns an error if the secret cannot be decoded or the parameters are unsupported.
    fn generate(&self, params: &OtpParams<'_>, at: u64) -> Result<String, CodeGenerationError>;
}

/// HMAC-SHA1 TOTP (RFC 6238).
#[derive(Debug, Default, Clone, Copy)]
pub struct TotpEngine;

impl CodeGenerator for TotpEngine {
    fn generate(&self, params: &OtpParams<'_>, at: u64) -> Result<String, CodeGenerationError> {
        let secret = normalize_secret(params.secret);
        if secret.is_empty() {
            return Ok(String::new());
        }

        if params.digits == 0 || params.digits > MAX_DIGITS {
            return Err(CodeGenerationError::UnsupportedParameters(format!(
                "digits must be between 1 and {MAX_DIGITS}, got {}",
                params.digits
            )));
        }
        if params.period == 0 {
            return Err(CodeGenerationError::UnsupportedParameters(
                "period must be greater than zero".to_string(),
            ));
        }

        let bytes = Secret::Encoded(secret)
            .to_bytes()
            .map_err(|e| CodeGenerationError::InvalidSecret(e.to_string()))?;

        // Short secrets are common in the wild, so skip the 128-bit minimum.
        let totp = TOTP::new_unchecked(
            Algorithm::SHA1,
            params.digits as usize,
            SKEW,
            params.period,
            bytes,
        );

        Ok(totp.generate(at))
    }
}

/// Upper-case, strip whitespace and pad to a multiple of eight characters.
#[must_use]
pub fn normalize_secret(secret: &str) -> String {
    let mut normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let remainder = normalized.len() % BLOCK;
    if remainder != 0 {
        normalized.extend(std::iter::repeat_n(PAD, BLOCK - remainder));
    }

    normalized
}

/// Seconds since the unix epoch.
#[must_use]
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
