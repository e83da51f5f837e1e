//! Concurrent discovery and collection of OTP records.
//!
//! [`harvest`] establishes a Vault session and hands the store to a
//! [`Dispatcher`], which fans out one task per directory listing and one per
//! leaf read. Only a failed session is reported as an error; everything that
//! goes wrong below the root is logged and leaves the affected key out.

pub mod aggregate;
pub mod dispatcher;
mod fetch;
pub mod pending;
mod scan;

#[cfg(test)]
mod testing;

pub use aggregate::ResultSet;
pub use dispatcher::{DispatchStats, Dispatcher, WorkItem};

use crate::otp::{TotpEngine, engine::unix_now, record::DEFAULT_SECRET_FIELD};
use crate::vault::{SessionError, VaultSettings, session};
use std::sync::Arc;
use tracing::instrument;

/// Immutable per-run settings shared with every worker.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Field holding the base32 secret.
    pub secret_field: String,
    /// Show the code of the next period instead of the current one.
    pub want_next: bool,
    /// Fixed evaluation time in unix seconds; the wall clock when unset.
    pub timestamp: Option<u64>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            secret_field: DEFAULT_SECRET_FIELD.to_string(),
            want_next: false,
            timestamp: None,
        }
    }
}

impl HarvestConfig {
    #[must_use]
    pub fn with_secret_field(mut self, field: impl Into<String>) -> Self {
        self.secret_field = field.into();
        self
    }

    #[must_use]
    pub fn with_next(mut self, want_next: bool) -> Self {
        self.want_next = want_next;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// The instant a record with the given period is evaluated at.
    #[must_use]
    pub fn evaluation_time(&self, period: u64) -> u64 {
        let now = self.timestamp.unwrap_or_else(unix_now);
        if self.want_next {
            now.saturating_add(period)
        } else {
            now
        }
    }
}

/// Collect the current codes below `root_key`.
///
/// # Errors
/// Returns an error only if no Vault session can be established.
#[instrument(skip(settings, config))]
pub async fn harvest(
    settings: &VaultSettings,
    config: HarvestConfig,
    root_key: &str,
) -> Result<ResultSet, SessionError> {
    let store = session::establish(settings).await?;

    let dispatcher = Dispatcher::new(Arc::new(store), Arc::new(TotpEngine), Arc::new(config));

    Ok(dispatcher.run(root_key).await)
}
