// ─── Installer Acquisition ───
// Canonical download first, local cache scan second, manual placement
// last. Every acquired artifact lands in the loaders cache under its
// deterministic name, so a rerun short-circuits on the cache.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::download::Downloader;
use crate::error::{LauncherError, LauncherResult};
use crate::progress::{ConfirmPrompt, LogSource, ProgressSink};

use super::manual::ManualPlacement;
use super::meta::{InstallerSource, LoaderEndpoints, LoaderMeta};
use super::{LoaderKind, Version};

pub struct InstallerAcquirer {
    client: reqwest::Client,
    endpoints: LoaderEndpoints,
    loaders_dir: PathBuf,
    sink: Arc<dyn ProgressSink>,
}

impl InstallerAcquirer {
    pub fn new(
        client: reqwest::Client,
        endpoints: LoaderEndpoints,
        loaders_dir: PathBuf,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            client,
            endpoints,
            loaders_dir,
            sink,
        }
    }

    /// Acquire the installer jar for one loader, returning its path in
    /// the loaders cache. The prompt is only ever reached after both
    /// the canonical download and the cache scan have failed.
    pub async fn acquire(
        &self,
        game_version: &str,
        kind: LoaderKind,
        requested: &Version,
        prompt: &dyn ConfirmPrompt,
    ) -> LauncherResult<PathBuf> {
        let meta = LoaderMeta::new(kind, self.client.clone(), self.endpoints.clone())
            .ok_or_else(|| {
                LauncherError::Other("Vanilla installations have no loader installer".to_string())
            })?;
        let fragment = kind
            .installer_fragment()
            .ok_or_else(|| LauncherError::Other(format!("No installer fragment for {kind}")))?;

        match self.try_download(&meta, game_version, requested).await {
            Ok(path) => return Ok(path),
            Err(e) => {
                warn!("Automatic {kind} installer acquisition failed: {e}");
                self.sink.emit(
                    &format!("Automatic {kind} installer download failed: {e}"),
                    LogSource::Launcher,
                );
            }
        }

        if let Some(cached) = self.scan_cache(fragment) {
            info!("Using cached installer {}", cached.display());
            self.sink.emit(
                &format!("Using cached installer {}", cached.display()),
                LogSource::Launcher,
            );
            return Ok(cached);
        }

        ManualPlacement::new(self.loaders_dir.clone(), fragment)
            .wait(prompt, self.sink.as_ref())
            .await
    }

    async fn try_download(
        &self,
        meta: &LoaderMeta,
        game_version: &str,
        requested: &Version,
    ) -> LauncherResult<PathBuf> {
        let descriptor = meta.resolve(game_version, requested).await?;
        let (url, file_name) = match descriptor.installer {
            InstallerSource::Url { url, file_name } => (url, file_name),
            InstallerSource::Manual => {
                return Err(LauncherError::Other(format!(
                    "{} {} has no automated installer source",
                    descriptor.kind, descriptor.version
                )))
            }
        };

        let dest = self.loaders_dir.join(&file_name);
        if dest.exists() {
            info!("Installer already cached: {file_name}");
            return Ok(dest);
        }

        self.sink.emit(
            &format!("Downloading {} installer {}", descriptor.kind, descriptor.version),
            LogSource::Launcher,
        );
        let downloader = Downloader::new(self.client.clone(), Arc::clone(&self.sink));
        downloader.download_file(&url, &dest).await?;
        Ok(dest)
    }

    /// Any cached jar whose name starts with the family fragment will
    /// do when the exact version is unreachable; sorted so repeated
    /// scans pick the same file.
    fn scan_cache(&self, fragment: &str) -> Option<PathBuf> {
        let entries = std::fs::read_dir(&self.loaders_dir).ok()?;
        let mut jars: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(fragment) && n.ends_with(".jar"))
                    .unwrap_or(false)
            })
            .collect();
        jars.sort();
        jars.into_iter().next()
    }
}
