// ─── Version Descriptor ───
// Normalized in-memory form of a version JSON: everything the download
// and synthesis steps need, nothing else.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::download::DownloadTask;
use crate::error::{LauncherError, LauncherResult};

/// A parsed version JSON.
///
/// Once the raw document has been written to `<id>.json` it is treated as
/// immutable for that identifier: later installs of the same id load the
/// on-disk copy instead of re-fetching.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    pub id: Option<String>,
    pub main_class: String,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexRef>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy single-blob game arguments (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VersionDownloads {
    pub client: Option<ClientArtifactRef>,
}

/// Client binary reference from `downloads.client`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientArtifactRef {
    pub url: String,
}

/// Asset index reference: id names the on-disk index document.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<serde_json::Value>,
    #[serde(default)]
    pub jvm: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryDownloads {
    pub artifact: Option<LibraryRef>,
}

/// Maven-style relative path plus its source URL.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryRef {
    pub path: String,
    pub url: String,
}

impl VersionDescriptor {
    /// Fetch and parse a version JSON, returning the raw text alongside so
    /// the exact upstream bytes can be persisted.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> LauncherResult<(Self, String)> {
        let raw = crate::http::fetch_text(client, url).await?;
        let descriptor: VersionDescriptor = serde_json::from_str(&raw)?;
        Ok((descriptor, raw))
    }

    /// Load the descriptor for `version_id` from `descriptor_path` if a
    /// prior acquisition wrote it, otherwise fetch from `url` and persist.
    pub async fn load_or_fetch(
        client: &reqwest::Client,
        url: &str,
        descriptor_path: &Path,
    ) -> LauncherResult<Self> {
        if descriptor_path.exists() {
            debug!("Reusing on-disk descriptor {:?}", descriptor_path);
            let raw = tokio::fs::read_to_string(descriptor_path)
                .await
                .map_err(|e| LauncherError::Io {
                    path: descriptor_path.to_path_buf(),
                    source: e,
                })?;
            return Ok(serde_json::from_str(&raw)?);
        }

        let (descriptor, raw) = Self::fetch(client, url).await?;
        if let Some(parent) = descriptor_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        tokio::fs::write(descriptor_path, &raw)
            .await
            .map_err(|e| LauncherError::Io {
                path: descriptor_path.to_path_buf(),
                source: e,
            })?;
        info!("Saved version descriptor to {:?}", descriptor_path);
        Ok(descriptor)
    }

    /// Download task for every library that carries a concrete artifact.
    /// Destinations mirror the upstream relative path under `libraries_dir`.
    pub fn library_tasks(&self, libraries_dir: &Path) -> Vec<DownloadTask> {
        self.libraries
            .iter()
            .filter_map(|lib| {
                let artifact = lib.downloads.as_ref()?.artifact.as_ref()?;
                Some(DownloadTask::new(
                    artifact.url.clone(),
                    libraries_dir.join(&artifact.path),
                    artifact.path.clone(),
                ))
            })
            .collect()
    }

    /// Download task for the client binary, if the descriptor declares one.
    pub fn client_task(&self, client_jar: &Path) -> Option<DownloadTask> {
        let client = self.downloads.as_ref()?.client.as_ref()?;
        let label = client_jar
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "client.jar".to_string());
        Some(DownloadTask::new(
            client.url.clone(),
            client_jar.to_path_buf(),
            label,
        ))
    }

    /// Game argument templates: string entries only. Structured conditional
    /// entries are dropped; the legacy blob splits on whitespace.
    pub fn game_arg_templates(&self) -> Vec<String> {
        match &self.arguments {
            Some(args) => string_entries(&args.game),
            None => self
                .minecraft_arguments
                .as_deref()
                .map(|blob| blob.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }

    /// JVM argument templates: string entries only, same policy as game args.
    pub fn jvm_arg_templates(&self) -> Vec<String> {
        match &self.arguments {
            Some(args) => string_entries(&args.jvm),
            None => Vec::new(),
        }
    }
}

fn string_entries(values: &[serde_json::Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> VersionDescriptor {
        serde_json::from_value(serde_json::json!({
            "id": "1.21.1",
            "mainClass": "net.minecraft.client.main.Main",
            "downloads": {
                "client": {"url": "https://example.com/client.jar"}
            },
            "assetIndex": {"id": "17", "url": "https://example.com/17.json"},
            "libraries": [
                {"name": "com.mojang:blocklist:1.0.10",
                 "downloads": {"artifact": {
                     "path": "com/mojang/blocklist/1.0.10/blocklist-1.0.10.jar",
                     "url": "https://libraries.minecraft.net/com/mojang/blocklist/1.0.10/blocklist-1.0.10.jar"}}},
                {"name": "org.lwjgl:lwjgl:3.3.3:natives-linux"}
            ],
            "arguments": {
                "jvm": [
                    "-Djava.library.path=${natives_directory}",
                    {"rules": [{"action": "allow", "os": {"name": "osx"}}],
                     "value": ["-XstartOnFirstThread"]}
                ],
                "game": [
                    "--username", "${auth_player_name}",
                    {"rules": [{"action": "allow", "features": {"is_demo_user": true}}],
                     "value": "--demo"}
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn library_tasks_skip_entries_without_artifacts() {
        let descriptor = fixture();
        let tasks = descriptor.library_tasks(Path::new("/libs"));
        assert_eq!(tasks.len(), 1);
        assert_eq!(
            tasks[0].dest,
            Path::new("/libs/com/mojang/blocklist/1.0.10/blocklist-1.0.10.jar")
        );
        assert_eq!(tasks[0].label, "com/mojang/blocklist/1.0.10/blocklist-1.0.10.jar");
    }

    #[test]
    fn conditional_argument_objects_are_dropped() {
        let descriptor = fixture();
        assert_eq!(
            descriptor.jvm_arg_templates(),
            vec!["-Djava.library.path=${natives_directory}".to_string()]
        );
        assert_eq!(
            descriptor.game_arg_templates(),
            vec!["--username".to_string(), "${auth_player_name}".to_string()]
        );
    }

    #[test]
    fn legacy_blob_splits_on_whitespace() {
        let descriptor: VersionDescriptor = serde_json::from_value(serde_json::json!({
            "mainClass": "net.minecraft.client.main.Main",
            "minecraftArguments": "--username ${auth_player_name} --gameDir ${game_directory}"
        }))
        .unwrap();
        assert_eq!(
            descriptor.game_arg_templates(),
            vec!["--username", "${auth_player_name}", "--gameDir", "${game_directory}"]
        );
        assert!(descriptor.jvm_arg_templates().is_empty());
    }

    #[tokio::test]
    async fn load_or_fetch_prefers_on_disk_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.21.1.json");
        std::fs::write(
            &path,
            r#"{"id": "1.21.1", "mainClass": "on.disk.Main"}"#,
        )
        .unwrap();

        let client = crate::http::build_http_client().unwrap();
        // URL would fail if contacted; the disk copy must win.
        let descriptor =
            VersionDescriptor::load_or_fetch(&client, "http://127.0.0.1:1/x.json", &path)
                .await
                .unwrap();
        assert_eq!(descriptor.main_class, "on.disk.Main");
    }
}
