// ─── Modpack Archive Import ───
// Two archive schemas share one import surface: detection picks the
// family by marker file, the family module turns the archive into
// extracted files, download tasks, and a normalized manifest.

pub mod curseforge;
pub mod modrinth;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use zip::ZipArchive;

use crate::download::Downloader;
use crate::error::{LauncherError, LauncherResult};
use crate::loader::{LoaderKind, Version};
use crate::progress::ProgressSink;

/// Normalized result of a pack import. `skipped` entries carry enough
/// context for the caller to report unresolved files to the user.
#[derive(Debug)]
pub struct PackManifest {
    pub game_version: String,
    pub loader_kind: LoaderKind,
    pub loader_version: Version,
    pub bundled: Vec<String>,
    pub downloaded: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackFormat {
    CurseForge,
    Modrinth,
}

pub struct PackImporter {
    pub(crate) client: reqwest::Client,
    pub(crate) sink: Arc<dyn ProgressSink>,
    pub(crate) curseforge_api_base: String,
    pub(crate) curseforge_api_key: Option<String>,
}

impl PackImporter {
    pub fn new(
        client: reqwest::Client,
        sink: Arc<dyn ProgressSink>,
        curseforge_api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            sink,
            curseforge_api_base: "https://api.curseforge.com".to_string(),
            curseforge_api_key,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.curseforge_api_base = base.into();
        self
    }

    pub(crate) fn downloader(&self) -> Downloader {
        Downloader::new(self.client.clone(), Arc::clone(&self.sink))
    }

    /// Import a pack archive into `dest`, bundled files first, remote
    /// files after. `dest` becomes the instance root (mods under
    /// `dest/mods`, overrides merged into `dest` itself).
    pub async fn import(&self, archive_path: &Path, dest: &Path) -> LauncherResult<PackManifest> {
        let file =
            File::open(archive_path).map_err(|e| LauncherError::io(archive_path, e))?;
        let mut archive = ZipArchive::new(file)?;

        match detect_format(&mut archive) {
            Some(PackFormat::CurseForge) => curseforge::import(self, &mut archive, dest).await,
            Some(PackFormat::Modrinth) => modrinth::import(self, &mut archive, dest).await,
            None => Err(LauncherError::Pack(format!(
                "Unrecognized pack archive {} (no manifest.json or modrinth.index.json)",
                archive_path.display()
            ))),
        }
    }
}

/// Marker files decide the schema; CurseForge checked first since a
/// Modrinth archive never carries a top-level `manifest.json`.
pub fn detect_format(archive: &mut ZipArchive<File>) -> Option<PackFormat> {
    if archive.by_name("manifest.json").is_ok() {
        Some(PackFormat::CurseForge)
    } else if archive.by_name("modrinth.index.json").is_ok() {
        Some(PackFormat::Modrinth)
    } else {
        None
    }
}

pub(crate) fn read_entry_string(
    archive: &mut ZipArchive<File>,
    name: &str,
) -> LauncherResult<String> {
    let mut entry = archive.by_name(name)?;
    let mut raw = String::new();
    entry
        .read_to_string(&mut raw)
        .map_err(|e| LauncherError::io(name, e))?;
    Ok(raw)
}

/// Extract every archive entry under `prefix/` to the corresponding
/// path under `dest`, preserving structure. Entries escaping the
/// archive root are rejected. Returns the extracted relative paths.
pub(crate) fn extract_prefixed(
    archive: &mut ZipArchive<File>,
    prefix: &str,
    dest: &Path,
) -> LauncherResult<Vec<String>> {
    let mut extracted = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let Some(enclosed) = entry.enclosed_name() else {
            return Err(LauncherError::Pack(format!(
                "Archive entry escapes the pack root: {}",
                entry.name()
            )));
        };
        let Ok(relative) = enclosed.strip_prefix(prefix) else {
            continue;
        };
        let relative: PathBuf = relative.to_path_buf();

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let mut out = File::create(&target).map_err(|e| LauncherError::io(&target, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&target, e))?;
        debug!("Extracted {}", target.display());
        extracted.push(relative.to_string_lossy().replace('\\', "/"));
    }
    Ok(extracted)
}
