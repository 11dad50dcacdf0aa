// ─── Version Manifest ───
// Fetches and parses the Mojang version manifest v2.

use serde::Deserialize;
use tracing::info;

use crate::error::{LauncherError, LauncherResult};
use crate::http::fetch_json;

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level Mojang version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    #[serde(rename = "releaseTime")]
    pub release_time: String,
    pub url: String,
}

impl VersionManifest {
    /// Fetch the version manifest from its default endpoint.
    pub async fn fetch(client: &reqwest::Client) -> LauncherResult<Self> {
        Self::fetch_from(client, VERSION_MANIFEST_URL).await
    }

    /// Fetch from an explicit endpoint (tests point this at a stub).
    pub async fn fetch_from(client: &reqwest::Client, url: &str) -> LauncherResult<Self> {
        info!("Fetching game version manifest...");
        let manifest: VersionManifest = fetch_json(client, url).await?;
        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by id (e.g. "1.21.1").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Like `find_version` but absence is an error: the identifier does
    /// not exist upstream and retrying will not help.
    pub fn require_version(&self, id: &str) -> LauncherResult<&VersionEntry> {
        self.find_version(id)
            .ok_or_else(|| LauncherError::VersionNotFound(id.to_string()))
    }

    /// All stable release entries.
    pub fn releases(&self) -> Vec<&VersionEntry> {
        self.versions
            .iter()
            .filter(|v| v.version_type == "release")
            .collect()
    }
}
