// CurseForge pack archives: `manifest.json` plus optional bundled
// `mods/` jars and an `overrides/` tree. Remote files are only
// project/file id pairs; each one needs an API lookup to become a URL.

use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};
use zip::ZipArchive;

use crate::download::DownloadTask;
use crate::error::{LauncherError, LauncherResult};
use crate::loader::{LoaderKind, Version};
use crate::progress::LogSource;

use super::{extract_prefixed, read_entry_string, PackImporter, PackManifest};

#[derive(Debug, Deserialize)]
struct Manifest {
    minecraft: Minecraft,
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Minecraft {
    version: String,
    #[serde(default)]
    mod_loaders: Vec<ModLoader>,
}

#[derive(Debug, Deserialize)]
struct ModLoader {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileEntry {
    #[serde(rename = "projectID")]
    project_id: u64,
    #[serde(rename = "fileID")]
    file_id: u64,
    /// Absent means required; only an explicit `false` marks optional.
    #[serde(default = "default_required")]
    required: bool,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct FileLookup {
    data: FileData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    file_name: String,
    download_url: Option<String>,
}

/// Loader id strings look like `forge-52.0.2` or `neoforge-21.1.77`:
/// family by substring, version after the separator.
fn parse_loader(loaders: &[ModLoader]) -> (LoaderKind, Version) {
    let Some(first) = loaders.first() else {
        return (LoaderKind::Vanilla, Version::Latest);
    };
    let kind = LoaderKind::detect(&first.id).unwrap_or(LoaderKind::Vanilla);
    let version = first
        .id
        .split_once('-')
        .map(|(_, v)| Version::parse(v))
        .unwrap_or(Version::Latest);
    (kind, version)
}

pub(crate) async fn import(
    importer: &PackImporter,
    archive: &mut ZipArchive<File>,
    dest: &Path,
) -> LauncherResult<PackManifest> {
    let raw = read_entry_string(archive, "manifest.json")?;
    let manifest: Manifest =
        serde_json::from_str(&raw).map_err(|e| LauncherError::Pack(format!(
            "Malformed CurseForge manifest: {e}"
        )))?;

    let (loader_kind, loader_version) = parse_loader(&manifest.minecraft.mod_loaders);
    info!(
        "Importing CurseForge pack: minecraft {} with {loader_kind} {loader_version}",
        manifest.minecraft.version
    );

    let mods_dir = dest.join("mods");
    let bundled = extract_prefixed(archive, "mods", &mods_dir)?;
    extract_prefixed(archive, "overrides", dest)?;

    let mut tasks = Vec::new();
    let mut skipped = Vec::new();
    for entry in &manifest.files {
        match lookup_file(importer, entry).await {
            Ok(Some((file_name, url))) => {
                tasks.push(DownloadTask::new(url, mods_dir.join(&file_name), file_name));
            }
            Ok(None) => skip(importer, &mut skipped, entry, "no download URL"),
            Err(e) => skip(importer, &mut skipped, entry, &e.to_string()),
        }
    }

    let downloaded: Vec<String> = tasks.iter().map(|t| t.label.clone()).collect();
    importer.downloader().run(tasks).await?;

    Ok(PackManifest {
        game_version: manifest.minecraft.version,
        loader_kind,
        loader_version,
        bundled,
        downloaded,
        skipped,
    })
}

/// Unresolvable entries degrade to a warning; a pack with a few dead
/// project ids still imports.
fn skip(importer: &PackImporter, skipped: &mut Vec<String>, entry: &FileEntry, reason: &str) {
    let label = format!(
        "project {} file {}{}",
        entry.project_id,
        entry.file_id,
        if entry.required { " (required)" } else { "" }
    );
    warn!("Skipping unresolved pack file {label}: {reason}");
    importer.sink.emit(
        &format!("Skipping {label}: {reason}"),
        LogSource::Launcher,
    );
    skipped.push(label);
}

async fn lookup_file(
    importer: &PackImporter,
    entry: &FileEntry,
) -> LauncherResult<Option<(String, String)>> {
    let url = format!(
        "{}/v1/mods/{}/files/{}",
        importer.curseforge_api_base, entry.project_id, entry.file_id
    );
    let mut request = importer.client.get(&url);
    if let Some(key) = &importer.curseforge_api_key {
        request = request.header("x-api-key", key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| LauncherError::Upstream(format!("{url}: {e}")))?;
    if !response.status().is_success() {
        return Err(LauncherError::Upstream(format!(
            "{url}: HTTP {}",
            response.status().as_u16()
        )));
    }
    let lookup: FileLookup = response
        .json()
        .await
        .map_err(|e| LauncherError::Upstream(format!("{url}: {e}")))?;

    Ok(lookup
        .data
        .download_url
        .map(|download| (lookup.data.file_name, download)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_support::write_archive;
    use super::*;
    use crate::http::build_http_client;
    use crate::progress::test_support::MemorySink;

    const MANIFEST: &str = r#"{
        "minecraft": {
            "version": "1.21.1",
            "modLoaders": [{ "id": "neoforge-21.1.77", "primary": true }]
        },
        "files": [
            { "projectID": 238222, "fileID": 5629790, "required": true }
        ]
    }"#;

    #[test]
    fn absent_required_flag_means_required() {
        let manifest: Manifest = serde_json::from_str(
            r#"{
                "minecraft": {"version": "1.21.1", "modLoaders": []},
                "files": [
                    { "projectID": 1, "fileID": 10 },
                    { "projectID": 2, "fileID": 20, "required": false }
                ]
            }"#,
        )
        .unwrap();
        assert!(manifest.files[0].required);
        assert!(!manifest.files[1].required);
    }

    #[test]
    fn loader_id_parses_into_kind_and_version() {
        let loaders = vec![ModLoader {
            id: "neoforge-21.1.77".into(),
        }];
        let (kind, version) = parse_loader(&loaders);
        assert_eq!(kind, LoaderKind::NeoForge);
        assert_eq!(version, Version::Exact("21.1.77".into()));

        assert_eq!(parse_loader(&[]), (LoaderKind::Vanilla, Version::Latest));
    }

    #[tokio::test]
    async fn bundled_mods_import_and_dead_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = write_archive(
            dir.path(),
            "pack.zip",
            &[
                ("manifest.json", MANIFEST.as_bytes()),
                ("mods/bundled-mod.jar", b"jar"),
                ("overrides/config/common.toml", b"x = 1"),
            ],
        );

        let sink = Arc::new(MemorySink::new());
        let importer = PackImporter::new(
            build_http_client().unwrap(),
            Arc::clone(&sink) as Arc<dyn crate::progress::ProgressSink>,
            None,
        )
        .with_api_base("http://127.0.0.1:1");

        let dest = dir.path().join("instance");
        let manifest = importer.import(&archive_path, &dest).await.unwrap();

        assert_eq!(manifest.game_version, "1.21.1");
        assert_eq!(manifest.loader_kind, LoaderKind::NeoForge);
        assert_eq!(manifest.bundled, vec!["bundled-mod.jar"]);
        assert!(dest.join("mods/bundled-mod.jar").exists());
        assert!(dest.join("config/common.toml").exists());

        assert!(manifest.downloaded.is_empty());
        assert_eq!(manifest.skipped.len(), 1);
        assert!(manifest.skipped[0].contains("238222"));
        assert!(manifest.skipped[0].contains("(required)"));
        assert!(sink
            .messages()
            .iter()
            .any(|m| m.starts_with("Skipping project 238222")));
    }
}
