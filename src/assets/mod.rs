// ─── Asset Index ───
// Resolves an asset index document into sharded object download tasks.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::download::DownloadTask;
use crate::error::{LauncherError, LauncherResult};
use crate::version::AssetIndexRef;

pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

/// Top-level asset index JSON structure.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetIndex {
    /// Build one task per object. The hash shards the destination path:
    /// first two hex characters become a directory, the full hash the
    /// filename. Objects with an unusable hash are skipped with a warning.
    pub fn object_tasks(&self, objects_dir: &Path, object_base: &str) -> Vec<DownloadTask> {
        let mut tasks = Vec::with_capacity(self.objects.len());
        for (name, obj) in &self.objects {
            let Some(prefix) = obj.hash.get(..2) else {
                warn!("Asset {name} has malformed hash {:?}, skipping", obj.hash);
                continue;
            };
            tasks.push(DownloadTask::new(
                format!("{object_base}/{prefix}/{}", obj.hash),
                objects_dir.join(prefix).join(&obj.hash),
                name.clone(),
            ));
        }
        tasks
    }
}

/// Fetch the asset index referenced by a descriptor, persist it under
/// `indexes/<id>.json`, and return the parsed index.
pub async fn fetch_asset_index(
    client: &reqwest::Client,
    index_ref: &AssetIndexRef,
    indexes_dir: &Path,
) -> LauncherResult<AssetIndex> {
    let raw = crate::http::fetch_text(client, &index_ref.url).await?;
    let index: AssetIndex = serde_json::from_str(&raw)?;

    tokio::fs::create_dir_all(indexes_dir)
        .await
        .map_err(|e| LauncherError::Io {
            path: indexes_dir.to_path_buf(),
            source: e,
        })?;
    let index_path = indexes_dir.join(format!("{}.json", index_ref.id));
    tokio::fs::write(&index_path, &raw)
        .await
        .map_err(|e| LauncherError::Io {
            path: index_path.clone(),
            source: e,
        })?;

    info!(
        "Asset index {} lists {} objects",
        index_ref.id,
        index.objects.len()
    );
    Ok(index)
}
