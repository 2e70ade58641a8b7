use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_endpoint")]
    pub mod_api_endpoint: String,
    /// Overrides the default per-user dashboard UI directory when set.
    #[serde(default)]
    pub dashboard_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mod_api_endpoint: default_api_endpoint(),
            dashboard_dir: None,
        }
    }
}

impl AppConfig {
    pub fn load_or_create() -> Result<Self> {
        let base_dir = paths::app_data_dir()?;
        fs::create_dir_all(&base_dir).context("create app data dir")?;
        let path = base_dir.join("config.json");
        if path.exists() {
            let raw = fs::read_to_string(&path).context("read app config")?;
            let config = serde_json::from_str(&raw).context("parse app config")?;
            return Ok(config);
        }

        let config = AppConfig::default();
        config.save()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let base_dir = paths::app_data_dir()?;
        fs::create_dir_all(&base_dir).context("create app data dir")?;
        let path = base_dir.join("config.json");
        let raw = serde_json::to_string_pretty(self).context("serialize app config")?;
        fs::write(path, raw).context("write app config")?;
        Ok(())
    }

    pub fn resolve_dashboard_dir(&self) -> Result<PathBuf> {
        match &self.dashboard_dir {
            Some(dir) => Ok(dir.clone()),
            None => paths::dashboard_dir(),
        }
    }
}

fn default_api_endpoint() -> String {
    "http://127.0.0.1:7103/api/v1".to_string()
}
