//! Mod management glue. Dependency resolution and tree rendering live in the
//! mod service; this side only speaks the install/uninstall/update/list
//! contract and formats the results.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path, time::Duration};

pub const MODFILE_NAME: &str = "mod.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRequest {
    pub names: Vec<String>,
    pub dry_run: bool,
    pub force: bool,
    pub prune: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallResponse {
    pub installed_count: usize,
    /// Dependency tree rendered by the service, ready to print.
    #[serde(default)]
    pub installed_tree: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpResponse {
    pub count: usize,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedMod {
    pub name: String,
    pub version: String,
}

pub trait ModInstaller {
    fn install(&self, request: &InstallRequest) -> Result<InstallResponse>;
    fn uninstall(&self, names: &[String], dry_run: bool) -> Result<OpResponse>;
    fn update(&self, names: &[String], dry_run: bool) -> Result<OpResponse>;
    fn list(&self) -> Result<Vec<ListedMod>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Installed,
    Uninstalled,
    Upgraded,
    Downgraded,
    Pruned,
}

impl Verb {
    pub fn label(self, dry_run: bool) -> &'static str {
        match (self, dry_run) {
            (Verb::Installed, false) => "Installed",
            (Verb::Installed, true) => "Would install",
            (Verb::Uninstalled, false) => "Uninstalled",
            (Verb::Uninstalled, true) => "Would uninstall",
            (Verb::Upgraded, false) => "Upgraded",
            (Verb::Upgraded, true) => "Would upgrade",
            (Verb::Downgraded, false) => "Downgraded",
            (Verb::Downgraded, true) => "Would downgrade",
            (Verb::Pruned, false) => "Pruned",
            (Verb::Pruned, true) => "Would prune",
        }
    }
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

pub fn build_install_summary(response: &InstallResponse, dry_run: bool) -> String {
    if response.installed_count == 0 {
        return "All mods are up to date".to_string();
    }
    format!(
        "\n{} {} {}:\n\n{}\n",
        Verb::Installed.label(dry_run),
        response.installed_count,
        pluralize("mod", response.installed_count),
        response.installed_tree
    )
}

/// JSON client for a locally running mod service.
pub struct ApiInstaller {
    endpoint: String,
    agent: ureq::Agent,
}

#[derive(Serialize)]
struct OpRequest<'a> {
    names: &'a [String],
    dry_run: bool,
}

impl ApiInstaller {
    pub fn new(endpoint: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(30))
            .timeout_write(Duration::from_secs(30))
            .build();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn url(&self, op: &str) -> String {
        format!("{}/mod/{op}", self.endpoint)
    }
}

impl ModInstaller for ApiInstaller {
    fn install(&self, request: &InstallRequest) -> Result<InstallResponse> {
        let response = self
            .agent
            .post(&self.url("install"))
            .send_json(request)
            .context("call mod service install")?;
        response.into_json().context("decode install response")
    }

    fn uninstall(&self, names: &[String], dry_run: bool) -> Result<OpResponse> {
        let response = self
            .agent
            .post(&self.url("uninstall"))
            .send_json(OpRequest { names, dry_run })
            .context("call mod service uninstall")?;
        response.into_json().context("decode uninstall response")
    }

    fn update(&self, names: &[String], dry_run: bool) -> Result<OpResponse> {
        let response = self
            .agent
            .post(&self.url("update"))
            .send_json(OpRequest { names, dry_run })
            .context("call mod service update")?;
        response.into_json().context("decode update response")
    }

    fn list(&self) -> Result<Vec<ListedMod>> {
        let response = self
            .agent
            .get(&self.url("list"))
            .call()
            .context("call mod service list")?;
        response.into_json().context("decode list response")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modfile {
    pub name: String,
    #[serde(default)]
    pub require: BTreeMap<String, String>,
}

pub fn modfile_exists(dir: &Path) -> bool {
    dir.join(MODFILE_NAME).exists()
}

pub fn load_modfile(dir: &Path) -> Result<Modfile> {
    let raw = fs::read_to_string(dir.join(MODFILE_NAME)).context("read modfile")?;
    serde_json::from_str(&raw).context("parse modfile")
}

/// Create a default modfile in `dir`. Returns `None` when the directory
/// already carries one, leaving it untouched.
pub fn init_workspace(dir: &Path) -> Result<Option<Modfile>> {
    if !dir.is_dir() {
        bail!("mod init cancelled: {} is not a directory", dir.display());
    }
    if modfile_exists(dir) {
        return Ok(None);
    }

    let name = dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("local")
        .to_string();
    let modfile = Modfile {
        name,
        require: BTreeMap::new(),
    };
    let raw = serde_json::to_string_pretty(&modfile).context("serialize modfile")?;
    fs::write(dir.join(MODFILE_NAME), raw).context("write modfile")?;

    // hand back the parsed form of what landed on disk
    let modfile = load_modfile(dir)?;
    Ok(Some(modfile))
}
