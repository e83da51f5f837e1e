use crate::cli::actions::{Action, harvest};
use anyhow::Result;

/// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Harvest(args) => harvest::execute(args).await,
    }
}
