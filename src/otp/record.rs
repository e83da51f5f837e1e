//! Typed decoding of a leaf's field map into a [`Record`].

use crate::otp::engine::{
    CodeGenerationError, CodeGenerator, DEFAULT_DIGITS, DEFAULT_PERIOD, OtpParams,
};
use crate::vault::Fields;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::{num::ParseIntError, str::FromStr};
use thiserror::Error;

pub const DEFAULT_ICON: &str = "key";
pub const DEFAULT_SECRET_FIELD: &str = "secret";

#[derive(Debug, Error)]
pub enum FieldParseError {
    #[error("field {field} must be a string")]
    NotAString { field: String },
    #[error("field {field} must be a number")]
    NotANumber { field: String },
    #[error("unable to parse {field}: {source}")]
    Number {
        field: String,
        #[source]
        source: ParseIntError,
    },
    #[error("field {field} is out of range")]
    OutOfRange { field: String },
}

/// A code ready for display. The secret never leaves the process through
/// serialization.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub key: String,
    pub name: String,
    pub icon: String,
    #[serde(skip)]
    pub secret: Option<SecretString>,
    pub digits: u32,
    pub period: u64,
    pub code: String,
}

/// Fields of a leaf after decoding, before a code has been derived.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub key: String,
    pub name: String,
    pub icon: String,
    pub secret: Option<SecretString>,
    pub code: Option<String>,
    pub digits: Option<u32>,
    pub period: Option<u64>,
}

impl RecordDraft {
    /// Decode known fields; unknown fields are ignored. Fields that fail to
    /// decode are reported and keep their default.
    #[must_use]
    pub fn from_fields(
        key: &str,
        fields: &Fields,
        secret_field: &str,
    ) -> (Self, Vec<FieldParseError>) {
        let mut draft = Self {
            key: key.to_string(),
            name: key.to_string(),
            icon: DEFAULT_ICON.to_string(),
            secret: None,
            code: None,
            digits: None,
            period: None,
        };
        let mut name = None;
        let mut account_name = None;
        let mut errors = Vec::new();

        for (field, value) in fields {
            let decoded = match field.as_str() {
                f if f == secret_field => {
                    string_field(f, value).map(|s| draft.secret = Some(SecretString::from(s)))
                }
                "code" => string_field(field, value).map(|s| draft.code = Some(s)),
                "name" => string_field(field, value).map(|s| name = Some(s)),
                "account_name" => string_field(field, value).map(|s| account_name = Some(s)),
                "icon" => string_field(field, value).map(|s| draft.icon = s),
                "digits" => number_field::<u32>(field, value).map(|n| draft.digits = n),
                "period" => number_field::<u64>(field, value).map(|n| draft.period = n),
                _ => Ok(()),
            };

            if let Err(e) = decoded {
                errors.push(e);
            }
        }

        if let Some(display) = name.or(account_name) {
            draft.name = display;
        }

        (draft, errors)
    }

    #[must_use]
    pub fn digits(&self) -> u32 {
        self.digits.unwrap_or(DEFAULT_DIGITS)
    }

    #[must_use]
    pub fn period(&self) -> u64 {
        self.period.unwrap_or(DEFAULT_PERIOD)
    }

    /// Derive the code at `at`. A secret takes precedence over a preset
    /// `code` field; `Ok(None)` means the leaf is not an OTP record.
    ///
    /// # Errors
    /// Returns an error if code generation fails.
    pub fn into_record<G: CodeGenerator + ?Sized>(
        self,
        engine: &G,
        at: u64,
    ) -> Result<Option<Record>, CodeGenerationError> {
        let digits = self.digits();
        let period = self.period();

        let secret = self
            .secret
            .filter(|secret| !secret.expose_secret().trim().is_empty());

        let code = match &secret {
            Some(secret) => engine.generate(
                &OtpParams {
                    secret: secret.expose_secret(),
                    digits,
                    period,
                },
                at,
            )?,
            None => self.code.unwrap_or_default(),
        };

        if code.is_empty() {
            return Ok(None);
        }

        Ok(Some(Record {
            key: self.key,
            name: self.name,
            icon: self.icon,
            secret,
            digits,
            period,
            code,
        }))
    }
}

fn string_field(field: &str, value: &Value) -> Result<String, FieldParseError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| FieldParseError::NotAString {
            field: field.to_string(),
        })
}

/// Vault stores most values as strings, but JSON numbers are accepted too.
/// Zero means "use the default".
fn number_field<T>(field: &str, value: &Value) -> Result<Option<T>, FieldParseError>
where
    T: FromStr<Err = ParseIntError> + TryFrom<u64> + PartialEq + Default,
{
    let parsed = match value {
        Value::String(s) => s.trim().parse::<T>().map_err(|source| FieldParseError::Number {
            field: field.to_string(),
            source,
        })?,
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| T::try_from(n).ok())
            .ok_or_else(|| FieldParseError::OutOfRange {
                field: field.to_string(),
            })?,
        _ => {
            return Err(FieldParseError::NotANumber {
                field: field.to_string(),
            });
        }
    };

    Ok((parsed != T::default()).then_some(parsed))
}
