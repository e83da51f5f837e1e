use crate::cli::actions::{Action, harvest::Args};
use crate::cli::commands::{harvest, vault};
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let vault = vault::Options::parse(matches)?;
    let harvest = harvest::Options::parse(matches)?;

    crate::vault::parse_address(&vault.address).context("invalid VAULT_ADDR")?;

    Ok(Action::Harvest(Args { vault, harvest }))
}
