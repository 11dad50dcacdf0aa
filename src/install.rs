// ─── Version Install Flow ───
// Wires the resolvers, the downloader and the synthesizer into one
// operation: after `install_version` returns, the version directory is
// complete and the args file on disk matches what the caller received.

use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use crate::assets::{self, RESOURCES_URL};
use crate::config::SessionConfig;
use crate::download::Downloader;
use crate::error::LauncherResult;
use crate::launch::{synthesize, LaunchSpecification};
use crate::paths::Layout;
use crate::progress::{LogSource, ProgressSink};
use crate::version::{VersionDescriptor, VersionManifest};
use crate::version::manifest::VERSION_MANIFEST_URL;

pub struct Installer {
    client: Client,
    layout: Layout,
    config: SessionConfig,
    sink: Arc<dyn ProgressSink>,
    manifest_url: String,
    resources_url: String,
    parallel: bool,
    concurrency: Option<usize>,
}

impl Installer {
    pub fn new(
        client: Client,
        layout: Layout,
        config: SessionConfig,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            client,
            layout,
            config,
            sink,
            manifest_url: VERSION_MANIFEST_URL.to_string(),
            resources_url: RESOURCES_URL.to_string(),
            parallel: true,
            concurrency: None,
        }
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = Some(n);
        self
    }

    /// Override the metadata endpoints (tests point these at a stub).
    pub fn with_endpoints(
        mut self,
        manifest_url: impl Into<String>,
        resources_url: impl Into<String>,
    ) -> Self {
        self.manifest_url = manifest_url.into();
        self.resources_url = resources_url.into();
        self
    }

    fn downloader(&self) -> Downloader {
        let mut downloader = Downloader::new(self.client.clone(), Arc::clone(&self.sink))
            .with_parallel(self.parallel);
        if let Some(n) = self.concurrency {
            downloader = downloader.with_concurrency(n);
        }
        downloader
    }

    /// Acquire everything a version needs and synthesize its launch
    /// arguments. Idempotent: files already on disk are not re-fetched
    /// and an existing descriptor pins the version JSON.
    pub async fn install_version(&self, version_id: &str) -> LauncherResult<LaunchSpecification> {
        info!("Installing version {version_id}");
        self.sink.emit(
            &format!("Installing Minecraft {version_id}"),
            LogSource::Launcher,
        );

        let manifest = VersionManifest::fetch_from(&self.client, &self.manifest_url).await?;
        let entry = manifest.require_version(version_id)?;
        let descriptor = VersionDescriptor::load_or_fetch(
            &self.client,
            &entry.url,
            &self.layout.descriptor_file(version_id),
        )
        .await?;

        let mut tasks = descriptor.library_tasks(&self.layout.libraries_dir(version_id));
        if let Some(client_task) = descriptor.client_task(&self.layout.client_jar(version_id)) {
            tasks.push(client_task);
        }
        self.sink.emit(
            &format!("Downloading {} files for {version_id}", tasks.len()),
            LogSource::Launcher,
        );
        self.downloader().run(tasks).await?;

        if let Some(index_ref) = &descriptor.asset_index {
            let index = assets::fetch_asset_index(
                &self.client,
                index_ref,
                &self.layout.asset_indexes_dir(version_id),
            )
            .await?;
            let object_tasks = index.object_tasks(
                &self.layout.asset_objects_dir(version_id),
                &self.resources_url,
            );
            self.sink.emit(
                &format!("Downloading {} assets for {version_id}", object_tasks.len()),
                LogSource::Launcher,
            );
            self.downloader().run(object_tasks).await?;
        }

        let spec = synthesize(&descriptor, version_id, &self.layout, &self.config)?;
        spec.write(&self.layout.args_file(version_id)).await?;
        self.sink.emit(
            &format!("Version {version_id} is ready"),
            LogSource::Launcher,
        );
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LauncherError;
    use crate::http::build_http_client;
    use crate::progress::test_support::MemorySink;
    use std::collections::HashMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn object_hash() -> &'static str {
        "ab12cd34ef56ab12cd34ef56ab12cd34ef56ab12"
    }

    /// Path-routed HTTP stub serving a complete 1.21.1 version tree.
    async fn serve_full_version() -> String {
        // Bind first so the bodies below can embed the base URL.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base = format!("http://{addr}");

        let manifest = format!(
            r#"{{"versions": [{{"id": "1.21.1", "type": "release",
                "releaseTime": "2024-08-08T12:24:45+00:00",
                "url": "{base}/1.21.1.json"}}]}}"#
        );
        let descriptor = format!(
            r#"{{"id": "1.21.1",
                "mainClass": "net.minecraft.client.main.Main",
                "downloads": {{"client": {{"url": "{base}/client.jar"}}}},
                "assetIndex": {{"id": "17", "url": "{base}/17.json"}},
                "libraries": [{{"name": "com.mojang:blocklist:1.0.10",
                    "downloads": {{"artifact": {{
                        "path": "com/mojang/blocklist/1.0.10/blocklist-1.0.10.jar",
                        "url": "{base}/blocklist.jar"}}}}}}],
                "arguments": {{
                    "jvm": ["-Djava.library.path=${{natives_directory}}"],
                    "game": ["--username", "${{auth_player_name}}"]
                }}}}"#
        );
        let index = format!(
            r#"{{"objects": {{"minecraft/lang/en_us.json":
                {{"hash": "{}", "size": 3}}}}}}"#,
            object_hash()
        );

        let mut routes = HashMap::new();
        routes.insert("/manifest.json".to_string(), manifest);
        routes.insert("/1.21.1.json".to_string(), descriptor);
        routes.insert("/17.json".to_string(), index);
        routes.insert("/client.jar".to_string(), "client".to_string());
        routes.insert("/blocklist.jar".to_string(), "lib".to_string());
        routes.insert(
            format!("/ab/{}", object_hash()),
            "ogg".to_string(),
        );

        let routes = Arc::new(routes);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let routes = Arc::clone(&routes);
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = request
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or("/")
                        .to_string();
                    let response = match routes.get(&path) {
                        Some(body) => format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        ),
                        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                            .to_string(),
                    };
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
        base
    }

    #[tokio::test]
    async fn full_install_produces_tree_and_args_file() {
        let base = serve_full_version().await;
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let sink = Arc::new(MemorySink::new());

        let installer = Installer::new(
            build_http_client().unwrap(),
            layout.clone(),
            SessionConfig::default(),
            sink,
        )
        .with_endpoints(format!("{base}/manifest.json"), base.clone());

        let spec = installer.install_version("1.21.1").await.unwrap();

        assert!(layout.descriptor_file("1.21.1").exists());
        assert!(layout.client_jar("1.21.1").exists());
        assert!(layout
            .libraries_dir("1.21.1")
            .join("com/mojang/blocklist/1.0.10/blocklist-1.0.10.jar")
            .exists());
        assert!(layout
            .asset_objects_dir("1.21.1")
            .join("ab")
            .join(object_hash())
            .exists());
        assert!(layout
            .asset_indexes_dir("1.21.1")
            .join("17.json")
            .exists());

        let args_file = layout.args_file("1.21.1");
        assert!(args_file.exists());
        let body = std::fs::read_to_string(&args_file).unwrap();
        assert!(body.contains("net.minecraft.client.main.Main"));
        assert!(!body.contains("${"));
        assert_eq!(
            body.trim_end().split('\n').count(),
            spec.args().len()
        );
    }

    #[tokio::test]
    async fn unknown_version_id_is_not_found() {
        let base = serve_full_version().await;
        let dir = tempfile::tempdir().unwrap();

        let installer = Installer::new(
            build_http_client().unwrap(),
            Layout::new(dir.path()),
            SessionConfig::default(),
            Arc::new(MemorySink::new()),
        )
        .with_endpoints(format!("{base}/manifest.json"), base.clone());

        let err = installer.install_version("0.0.0").await.unwrap_err();
        assert!(matches!(err, LauncherError::VersionNotFound(_)));
    }

    #[tokio::test]
    async fn reinstall_reuses_pinned_descriptor() {
        let base = serve_full_version().await;
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());

        // Pin a descriptor on disk before the first install; the served
        // one must never replace it.
        let pinned = layout.descriptor_file("1.21.1");
        std::fs::create_dir_all(pinned.parent().unwrap()).unwrap();
        std::fs::write(
            &pinned,
            r#"{"id": "1.21.1", "mainClass": "pinned.Main"}"#,
        )
        .unwrap();

        let installer = Installer::new(
            build_http_client().unwrap(),
            layout.clone(),
            SessionConfig::default(),
            Arc::new(MemorySink::new()),
        )
        .with_endpoints(format!("{base}/manifest.json"), base.clone());

        let spec = installer.install_version("1.21.1").await.unwrap();
        assert!(spec.args().iter().any(|a| a == "pinned.Main"));
    }
}
