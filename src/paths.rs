use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::PathBuf;

pub fn app_data_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("resolve home dir")?;
    Ok(base.data_local_dir().join("hearthview"))
}

/// Destination root for the extracted dashboard UI. Owned exclusively by the
/// asset bootstrap; nothing else writes under it.
pub fn dashboard_dir() -> Result<PathBuf> {
    Ok(app_data_dir()?.join("dashboard"))
}
