use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its backups subdirectory and a starter `config.json`.
///
/// The starter configuration has no vendor patterns. Edit `patterns_wf` and `cash_investments`
/// in `config.json` before the first import.
///
/// # Errors
/// - Returns an error if any file operations fail.
/// - Returns an error if a `config.json` already exists in `home`.
pub fn init(home: &Path) -> Result<Out<()>> {
    let config = Config::create(home).context("Unable to create the home directory and config")?;
    Ok(format!(
        "Created {}. Add your vendor patterns to {} before importing",
        config.root().display(),
        config.config_path().display()
    )
    .into())
}
