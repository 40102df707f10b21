//! Interactive prompts using dialoguer

use std::path::Path;

use anyhow::Result;
use dialoguer::Confirm;

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Prompt user before replacing the model in an artifacts directory
pub fn confirm_overwrite(artifacts: &Path) -> Result<bool> {
    let message = format!(
        "A model already exists in {}. Replace it?",
        artifacts.display()
    );
    confirm_step(&message)
}
