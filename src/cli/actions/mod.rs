pub mod harvest;

// The match over actions lives in `run` so this module only declares them.
mod run;

#[derive(Debug)]
pub enum Action {
    Harvest(harvest::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
