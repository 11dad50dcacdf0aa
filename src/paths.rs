// ─── Acquisition Layout ───
// Every on-disk path the core produces is derived here, so the tree layout
// lives in exactly one place.

use std::path::{Path, PathBuf};

/// On-disk layout rooted at the launcher's installation directory:
///
/// ```text
/// <root>/
///   vanilla/
///     java_args_<id>.txt            — generated launch specification
///     <id>/
///       <id>.json                   — raw version descriptor
///       libraries/...               — upstream-relative library tree
///       versions/<id>/<id>.jar      — client artifact
///       assets/objects/<xx>/<hash>  — sharded asset object store
///       assets/indexes/<id>.json    — asset index document
///   loaders/                        — one cached installer per loader acquisition
///   instances/<id>/                 — default game working directory
/// ```
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all acquired vanilla versions and args files.
    pub fn vanilla_root(&self) -> PathBuf {
        self.root.join("vanilla")
    }

    /// Acquisition root for one version id.
    pub fn version_root(&self, id: &str) -> PathBuf {
        self.vanilla_root().join(id)
    }

    pub fn descriptor_file(&self, id: &str) -> PathBuf {
        self.version_root(id).join(format!("{id}.json"))
    }

    pub fn libraries_dir(&self, id: &str) -> PathBuf {
        self.version_root(id).join("libraries")
    }

    pub fn client_jar(&self, id: &str) -> PathBuf {
        self.version_root(id)
            .join("versions")
            .join(id)
            .join(format!("{id}.jar"))
    }

    pub fn assets_dir(&self, id: &str) -> PathBuf {
        self.version_root(id).join("assets")
    }

    pub fn asset_indexes_dir(&self, id: &str) -> PathBuf {
        self.assets_dir(id).join("indexes")
    }

    pub fn asset_objects_dir(&self, id: &str) -> PathBuf {
        self.assets_dir(id).join("objects")
    }

    /// Generated launch specification, named by convention from the id.
    pub fn args_file(&self, id: &str) -> PathBuf {
        self.vanilla_root().join(format!("java_args_{id}.txt"))
    }

    /// Cache directory for acquired modloader installers.
    pub fn loaders_dir(&self) -> PathBuf {
        self.root.join("loaders")
    }

    /// Default game working directory when the session supplies no override.
    pub fn instance_dir(&self, id: &str) -> PathBuf {
        self.root.join("instances").join(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_tree_is_rooted_per_id() {
        let layout = Layout::new("/data/wildcat");
        assert_eq!(
            layout.descriptor_file("1.21.1"),
            PathBuf::from("/data/wildcat/vanilla/1.21.1/1.21.1.json")
        );
        assert_eq!(
            layout.client_jar("1.21.1"),
            PathBuf::from("/data/wildcat/vanilla/1.21.1/versions/1.21.1/1.21.1.jar")
        );
        assert_eq!(
            layout.args_file("1.21.1"),
            PathBuf::from("/data/wildcat/vanilla/java_args_1.21.1.txt")
        );
    }

    #[test]
    fn loaders_cache_is_shared_across_versions() {
        let layout = Layout::new("/data/wildcat");
        assert_eq!(layout.loaders_dir(), PathBuf::from("/data/wildcat/loaders"));
    }
}
