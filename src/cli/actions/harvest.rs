use crate::cli::commands::{harvest, vault};
use crate::cli::render::render;
use crate::harvest::HarvestConfig;
use crate::otp::engine::unix_now;
use crate::vault::VaultSettings;
use anyhow::{Context, Result, anyhow};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub vault: vault::Options,
    pub harvest: harvest::Options,
}

impl Args {
    fn settings(&self) -> VaultSettings {
        let mut settings = VaultSettings::new(self.vault.address.clone());
        settings.github_mount.clone_from(&self.vault.github_mount);
        if let Some(token) = &self.vault.token {
            settings = settings.with_token(token.clone());
        }
        if let Some(token) = &self.vault.github_token {
            settings = settings.with_github_token(token.clone());
        }
        settings
    }

    fn config(&self, now: u64) -> HarvestConfig {
        HarvestConfig::default()
            .with_secret_field(self.harvest.secret_field.clone())
            .with_next(self.harvest.next)
            .with_timestamp(now)
    }
}

/// Harvest codes below the prefix and print them to stdout.
///
/// # Errors
/// Returns an error if no Vault session can be established, the run exceeds
/// the timeout, or the output cannot be written.
pub async fn execute(args: Args) -> Result<()> {
    let settings = args.settings();
    // One timestamp for the whole run so every code and the footer agree.
    let now = unix_now();
    let config = args.config(now);

    debug!("Harvesting codes below {}", args.harvest.prefix);

    let run = crate::harvest(&settings, config, &args.harvest.prefix);

    let results = match args.harvest.timeout {
        Some(seconds) => tokio::time::timeout(Duration::from_secs(seconds), run)
            .await
            .map_err(|_| anyhow!("harvest did not finish within {seconds}s"))?,
        None => run.await,
    }
    .context("failed to establish a Vault session")?;

    info!("Collected {} codes", results.len());

    let output = render(&results, args.harvest.format, now, args.harvest.next)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::render::OutputFormat;
    use secrecy::{ExposeSecret, SecretString};

    fn args() -> Args {
        Args {
            vault: vault::Options {
                address: "http://127.0.0.1:8200".to_string(),
                token: Some(SecretString::from("s.token".to_string())),
                github_token: None,
                github_mount: "gh".to_string(),
            },
            harvest: harvest::Options {
                prefix: "secret/otp".to_string(),
                secret_field: "seed".to_string(),
                next: true,
                format: OutputFormat::Text,
                timeout: None,
            },
        }
    }

    #[test]
    fn test_settings_from_args() {
        let settings = args().settings();
        assert_eq!(settings.address, "http://127.0.0.1:8200");
        assert_eq!(settings.github_mount, "gh");
        assert_eq!(
            settings.token.as_ref().map(|t| t.expose_secret().to_string()),
            Some("s.token".to_string())
        );
        assert!(settings.github_token.is_none());
    }

    #[test]
    fn test_config_from_args() {
        let config = args().config(1_700_000_000);
        assert_eq!(config.secret_field, "seed");
        assert!(config.want_next);
        assert_eq!(config.timestamp, Some(1_700_000_000));
    }

    #[tokio::test]
    async fn test_execute_without_credentials_fails() {
        let mut args = args();
        args.vault.token = None;

        let result = execute(args).await;
        assert!(result.is_err());
    }
}
