//! Bootstrap for the dashboard web UI bundled into the binary.
//!
//! The UI ships as a gzip-compressed tar archive embedded at build time. On
//! startup the bootstrap compares the version recorded next to the extracted
//! tree with the running binary's version and, when they differ, re-extracts
//! the archive file by file. Extraction is idempotent and safe to repeat; a
//! crash mid-way leaves a partial tree that the next run replaces.

use crate::status::StatusContext;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io,
    path::Path,
};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const ASSET_ARCHIVE_NAME: &str = "dashboard_ui.tar.gz";
pub const ASSET_VERSION_FILE_NAME: &str = "assets_version.json";

static DASHBOARD_UI: &[u8] = include_bytes!("../assets/dashboard_ui.tar.gz");

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no bundled asset named {0}")]
    MissingBundleEntry(String),
    #[error("unsupported archive entry type {kind:?} in {name}")]
    UnsupportedEntry { name: String, kind: tar::EntryType },
}

/// Version recorded alongside the extracted tree. A missing file reads as an
/// empty version, which never matches and so forces a reinstall.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetVersionFile {
    pub version: String,
}

/// Open a named entry from the read-only bundle compiled into the binary.
pub fn bundled(name: &str) -> Result<&'static [u8], AssetError> {
    match name {
        ASSET_ARCHIVE_NAME => Ok(DASHBOARD_UI),
        other => Err(AssetError::MissingBundleEntry(other.to_string())),
    }
}

/// Install or refresh the dashboard UI under the default data directory.
pub fn ensure(ctx: &StatusContext) -> Result<()> {
    ensure_into(ctx, &crate::paths::dashboard_dir()?)
}

/// Install or refresh the dashboard UI under an explicit destination root.
pub fn ensure_into(ctx: &StatusContext, dest: &Path) -> Result<()> {
    let archive = bundled(ASSET_ARCHIVE_NAME)
        .context("could not open embedded dashboard assets archive")?;
    let marker = dest.join(ASSET_VERSION_FILE_NAME);
    ensure_at(ctx, crate::APP_VERSION, archive, dest, &marker)
}

/// The check-and-install pipeline over explicit inputs. `ensure` and
/// `ensure_into` supply the production values; tests drive this directly
/// with synthetic archives.
pub fn ensure_at(
    ctx: &StatusContext,
    current_version: &str,
    archive: &[u8],
    dest: &Path,
    marker_path: &Path,
) -> Result<()> {
    debug!("dashboard asset bootstrap start");
    if installed_assets_current(marker_path, current_version) {
        debug!("dashboard assets already at v{current_version}");
        return Ok(());
    }

    fs::create_dir_all(dest).context("create dashboard assets dir")?;
    extract_tar_gz(ctx, archive, dest)
        .context("could not extract embedded dashboard assets archive")?;
    write_asset_version(marker_path, current_version)
        .context("could not update dashboard assets version file")?;
    debug!("dashboard asset bootstrap end");
    Ok(())
}

/// True when the recorded version matches the running one. Read failures are
/// logged and reported as stale: a corrupt marker must never block updates.
pub fn installed_assets_current(marker_path: &Path, current_version: &str) -> bool {
    match load_asset_version(marker_path) {
        Ok(marker) => marker.version == current_version,
        Err(err) => {
            warn!("unreadable dashboard assets version file, forcing reinstall: {err:#}");
            false
        }
    }
}

pub fn load_asset_version(path: &Path) -> Result<AssetVersionFile> {
    if !path.exists() {
        return Ok(AssetVersionFile::default());
    }
    let raw = fs::read_to_string(path).context("read dashboard assets version file")?;
    let marker = serde_json::from_str(&raw).context("parse dashboard assets version file")?;
    Ok(marker)
}

pub fn write_asset_version(path: &Path, version: &str) -> Result<()> {
    let marker = AssetVersionFile {
        version: version.to_string(),
    };
    let raw = serde_json::to_string(&marker).context("serialize dashboard assets version file")?;
    fs::write(path, raw).context("write dashboard assets version file")?;
    Ok(())
}

/// Remove the extracted tree (marker included), returning how many files
/// were dropped. The next `ensure` reinstalls from the bundle.
pub fn clean(dest: &Path) -> Result<usize> {
    if !dest.exists() {
        return Ok(0);
    }
    let removed = WalkDir::new(dest)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .count();
    fs::remove_dir_all(dest).context("remove dashboard assets dir")?;
    Ok(removed)
}

// Entries are taken strictly in archive order; the producer guarantees
// directories precede the files inside them, so files never create parents.
fn extract_tar_gz(ctx: &StatusContext, archive: &[u8], dest: &Path) -> Result<()> {
    debug!("dashboard asset extraction start");
    let decoder = GzDecoder::new(archive);
    let mut tar = tar::Archive::new(decoder);

    for entry in tar.entries().context("read archive entries")? {
        let mut entry = entry.context("read archive entry header")?;
        let name = entry.path().context("read archive entry path")?.into_owned();
        // entry names come from the build-time bundle, not user input
        let target = dest.join(&name);
        let kind = entry.header().entry_type();

        if kind.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("create directory {}", target.display()))?;
        } else if kind.is_file() {
            ctx.set_status(&format!("Extracting {}…", name.display()));
            let mut out = File::create(&target)
                .with_context(|| format!("create {}", target.display()))?;
            io::copy(&mut entry, &mut out)
                .with_context(|| format!("write {}", target.display()))?;
        } else {
            return Err(AssetError::UnsupportedEntry {
                name: name.display().to_string(),
                kind,
            }
            .into());
        }
    }

    debug!("dashboard asset extraction end");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_serves_the_known_archive() {
        let archive = bundled(ASSET_ARCHIVE_NAME).unwrap();
        assert!(!archive.is_empty());
        // gzip magic
        assert_eq!(&archive[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn bundle_rejects_unknown_names() {
        let err = bundled("no_such_entry.tar.gz").unwrap_err();
        assert!(matches!(err, AssetError::MissingBundleEntry(_)));
        assert!(err.to_string().contains("no_such_entry.tar.gz"));
    }

    #[test]
    fn missing_marker_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let marker = load_asset_version(&dir.path().join("absent.json")).unwrap();
        assert_eq!(marker, AssetVersionFile::default());
        assert!(marker.version.is_empty());
    }

    #[test]
    fn corrupt_marker_reports_stale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ASSET_VERSION_FILE_NAME);
        fs::write(&path, "{not json").unwrap();
        assert!(load_asset_version(&path).is_err());
        assert!(!installed_assets_current(&path, "1.0.0"));
    }

    #[test]
    fn marker_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ASSET_VERSION_FILE_NAME);
        write_asset_version(&path, "1.2.3").unwrap();
        let marker = load_asset_version(&path).unwrap();
        assert_eq!(marker.version, "1.2.3");
        assert!(installed_assets_current(&path, "1.2.3"));
        assert!(!installed_assets_current(&path, "1.2.4"));
    }

    #[test]
    fn clean_counts_removed_files() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dashboard");
        fs::create_dir_all(dest.join("js")).unwrap();
        fs::write(dest.join("index.html"), "x").unwrap();
        fs::write(dest.join("js").join("app.js"), "y").unwrap();
        assert_eq!(clean(&dest).unwrap(), 2);
        assert!(!dest.exists());
        assert_eq!(clean(&dest).unwrap(), 0);
    }
}
