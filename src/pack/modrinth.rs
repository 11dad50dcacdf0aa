// Modrinth `.mrpack` archives: `modrinth.index.json` carries direct
// download URLs per file, so no remote lookups are needed before the
// batch runs.

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
#[serde(rename_all = "camelCase")]
struct Index {
    game_version: String,
    #[serde(default)]
    loaders: Vec<LoaderEntry>,
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct LoaderEntry {
    id: String,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    path: String,
    #[serde(default)]
    downloads: Vec<String>,
}

fn parse_loader(loaders: &[LoaderEntry]) -> (LoaderKind, Version) {
    let Some(first) = loaders.first() else {
        return (LoaderKind::Vanilla, Version::Latest);
    };
    let kind = LoaderKind::detect(&first.id).unwrap_or(LoaderKind::Vanilla);
    let version = match &first.version {
        Some(v) => Version::parse(v),
        None => Version::Latest,
    };
    (kind, version)
}

/// File paths come from the archive author; anything absolute or
/// escaping the destination is rejected before a task is created.
fn sanitize_path(raw: &str) -> Option<&str> {
    let normalized = raw.trim_start_matches("./");
    let escapes = Path::new(normalized).components().any(|c| {
        matches!(
            c,
            std::path::Component::ParentDir
                | std::path::Component::RootDir
                | std::path::Component::Prefix(_)
        )
    });
    if normalized.is_empty() || escapes {
        None
    } else {
        Some(normalized)
    }
}

pub(crate) async fn import(
    importer: &PackImporter,
    archive: &mut ZipArchive<File>,
    dest: &Path,
) -> LauncherResult<PackManifest> {
    let raw = read_entry_string(archive, "modrinth.index.json")?;
    let index: Index = serde_json::from_str(&raw)
        .map_err(|e| LauncherError::Pack(format!("Malformed Modrinth index: {e}")))?;

    let (loader_kind, loader_version) = parse_loader(&index.loaders);
    info!(
        "Importing Modrinth pack: minecraft {} with {loader_kind} {loader_version}",
        index.game_version
    );

    let bundled = extract_prefixed(archive, "overrides", dest)?;

    let mut tasks = Vec::new();
    let mut skipped = Vec::new();
    for file in &index.files {
        let Some(relative) = sanitize_path(&file.path) else {
            warn!("Skipping pack file with unsafe path: {}", file.path);
            importer.sink.emit(
                &format!("Skipping {}: unsafe path", file.path),
                LogSource::Launcher,
            );
            skipped.push(file.path.clone());
            continue;
        };
        let Some(url) = file.downloads.first() else {
            warn!("Skipping pack file without a download URL: {relative}");
            importer.sink.emit(
                &format!("Skipping {relative}: no download URL"),
                LogSource::Launcher,
            );
            skipped.push(relative.to_string());
            continue;
        };
        tasks.push(DownloadTask::new(
            url.clone(),
            dest.join(relative),
            relative,
        ));
    }

    let downloaded: Vec<String> = tasks.iter().map(|t| t.label.clone()).collect();
    importer.downloader().run(tasks).await?;

    Ok(PackManifest {
        game_version: index.game_version,
        loader_kind,
        loader_version,
        bundled,
        downloaded,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_support::write_archive;
    use super::*;
    use crate::http::build_http_client;
    use crate::progress::test_support::MemorySink;
    use crate::progress::ProgressSink;

    const INDEX: &str = r#"{
        "formatVersion": 1,
        "game": "minecraft",
        "versionId": "1.0.0",
        "name": "Test Pack",
        "gameVersion": "1.21.1",
        "loaders": [{ "id": "fabric-loader", "version": "0.16.9" }],
        "files": [
            { "path": "mods/present.jar", "downloads": ["http://127.0.0.1:1/present.jar"] },
            { "path": "mods/no-url.jar", "downloads": [] },
            { "path": "../escape.jar", "downloads": ["http://127.0.0.1:1/escape.jar"] }
        ]
    }"#;

    #[test]
    fn loader_entry_parses_into_kind_and_version() {
        let loaders = vec![LoaderEntry {
            id: "fabric-loader".into(),
            version: Some("0.16.9".into()),
        }];
        let (kind, version) = parse_loader(&loaders);
        assert_eq!(kind, LoaderKind::Fabric);
        assert_eq!(version, Version::Exact("0.16.9".into()));
    }

    #[test]
    fn unsafe_paths_are_rejected() {
        assert_eq!(sanitize_path("mods/fine.jar"), Some("mods/fine.jar"));
        assert_eq!(sanitize_path("./mods/fine.jar"), Some("mods/fine.jar"));
        assert_eq!(sanitize_path("../escape.jar"), None);
        assert_eq!(sanitize_path("/etc/escape.jar"), None);
        assert_eq!(sanitize_path(""), None);
    }

    #[tokio::test]
    async fn existing_files_skip_the_network_and_bad_entries_warn() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = write_archive(
            dir.path(),
            "pack.mrpack",
            &[
                ("modrinth.index.json", INDEX.as_bytes()),
                ("overrides/config/fabric.toml", b"y = 2"),
            ],
        );

        let dest = dir.path().join("instance");
        // Pre-place the only downloadable file so the batch never
        // touches its (unreachable) URL.
        std::fs::create_dir_all(dest.join("mods")).unwrap();
        std::fs::write(dest.join("mods/present.jar"), b"jar").unwrap();

        let sink = Arc::new(MemorySink::new());
        let importer = PackImporter::new(
            build_http_client().unwrap(),
            Arc::clone(&sink) as Arc<dyn ProgressSink>,
            None,
        );

        let manifest = importer.import(&archive_path, &dest).await.unwrap();

        assert_eq!(manifest.game_version, "1.21.1");
        assert_eq!(manifest.loader_kind, LoaderKind::Fabric);
        assert_eq!(manifest.loader_version, Version::Exact("0.16.9".into()));
        assert_eq!(manifest.bundled, vec!["config/fabric.toml"]);
        assert!(dest.join("config/fabric.toml").exists());
        assert_eq!(manifest.downloaded, vec!["mods/present.jar"]);
        assert_eq!(
            manifest.skipped,
            vec!["mods/no-url.jar".to_string(), "../escape.jar".to_string()]
        );
        assert!(sink.messages().iter().any(|m| m.contains("no download URL")));
    }
}
