use crate::vault::session::DEFAULT_GITHUB_MOUNT;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_VAULT_ADDR: &str = "vault-addr";
pub const ARG_VAULT_TOKEN: &str = "vault-token";
pub const ARG_GITHUB_TOKEN: &str = "github-token";
pub const ARG_GITHUB_MOUNT: &str = "github-mount";

#[derive(Debug, Clone)]
pub struct Options {
    pub address: String,
    pub token: Option<SecretString>,
    pub github_token: Option<SecretString>,
    pub github_mount: String,
}

impl Options {
    /// Parse Vault connection arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the address is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let secret = |id: &str| {
            matches
                .get_one::<String>(id)
                .filter(|v| !v.trim().is_empty())
                .map(|v| SecretString::from(v.clone()))
        };

        Ok(Self {
            address: matches
                .get_one::<String>(ARG_VAULT_ADDR)
                .cloned()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_VAULT_ADDR}"))?,
            token: secret(ARG_VAULT_TOKEN),
            github_token: secret(ARG_GITHUB_TOKEN),
            github_mount: matches
                .get_one::<String>(ARG_GITHUB_MOUNT)
                .cloned()
                .unwrap_or_else(|| DEFAULT_GITHUB_MOUNT.to_string()),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VAULT_ADDR)
                .long(ARG_VAULT_ADDR)
                .help("Vault base URL, example: https://vault.tld:8200")
                .env("VAULT_ADDR")
                .required(true),
        )
        .arg(
            Arg::new(ARG_VAULT_TOKEN)
                .long(ARG_VAULT_TOKEN)
                .help("Vault token, validated with lookup-self before use")
                .env("VAULT_TOKEN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_GITHUB_TOKEN)
                .long(ARG_GITHUB_TOKEN)
                .help("GitHub access token used to log in when no valid Vault token is available")
                .env("VAULT_OTP_GITHUB_TOKEN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_GITHUB_MOUNT)
                .long(ARG_GITHUB_MOUNT)
                .help("Mount path of the GitHub auth method")
                .env("VAULT_OTP_GITHUB_MOUNT")
                .default_value(DEFAULT_GITHUB_MOUNT),
        )
}
