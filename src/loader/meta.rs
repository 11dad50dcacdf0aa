// ─── Loader Metadata Resolution ───
// Three upstream families, three schemas, one shape out. All listing
// endpoints are third-party and uncontrolled: listing degrades to a
// "latest" sentinel instead of failing, resolution for acquisition is
// strict and lets the caller fall back.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{LauncherError, LauncherResult};
use crate::http::{fetch_json, fetch_text};

use super::{LoaderKind, Version};

/// Remote endpoints, overridable for tests.
#[derive(Debug, Clone)]
pub struct LoaderEndpoints {
    pub forge_promotions: String,
    pub forge_maven: String,
    pub neoforge_metadata: String,
    pub neoforge_maven: String,
    pub fabric_meta: String,
}

impl Default for LoaderEndpoints {
    fn default() -> Self {
        Self {
            forge_promotions:
                "https://files.minecraftforge.net/net/minecraftforge/forge/promotions_slim.json"
                    .to_string(),
            forge_maven: "https://maven.minecraftforge.net".to_string(),
            neoforge_metadata:
                "https://maven.neoforged.net/releases/net/neoforged/neoforge/maven-metadata.xml"
                    .to_string(),
            neoforge_maven: "https://maven.neoforged.net/releases".to_string(),
            fabric_meta: "https://meta.fabricmc.net/v2".to_string(),
        }
    }
}

/// Where the installer artifact for a resolved loader version comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallerSource {
    /// Canonical download URL plus the deterministic cache file name.
    Url { url: String, file_name: String },
    /// No automated source; the artifact must be supplied manually.
    Manual,
}

/// Normalized loader metadata for one installation attempt. Never
/// persisted; only the installer artifact it leads to is cached.
#[derive(Debug, Clone)]
pub struct LoaderDescriptor {
    pub kind: LoaderKind,
    pub version: String,
    pub installer: InstallerSource,
}

/// Candidate versions for display/selection, newest first. `approximate`
/// is set when numeric ordering degraded to reverse-lexical.
#[derive(Debug, Clone)]
pub struct VersionCandidates {
    pub entries: Vec<Version>,
    pub approximate: bool,
}

impl VersionCandidates {
    fn latest_sentinel() -> Self {
        Self {
            entries: vec![Version::Latest],
            approximate: false,
        }
    }
}

/// One resolution function per loader family behind a common shape.
#[async_trait]
pub trait LoaderMetaSource {
    /// Strict resolution for acquisition: a concrete version plus its
    /// installer source, or an error the acquirer can fall back from.
    async fn resolve(
        &self,
        game_version: &str,
        requested: &Version,
    ) -> LauncherResult<LoaderDescriptor>;

    /// Best-effort candidate listing. Degrades to a single `Latest`
    /// sentinel on any upstream failure or empty result, never an error.
    async fn available_versions(&self, game_version: &str) -> VersionCandidates;
}

// ─── Version ordering ───────────────────────────────────

/// Parse up to `depth` leading dot-separated components as integers.
fn numeric_tuple(raw: &str, depth: usize) -> Option<Vec<u64>> {
    raw.split('.')
        .take(depth)
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// Sort newest-first by numeric tuple; if any entry fails to parse, fall
/// back to reverse lexical order for the whole set. Returns whether the
/// ordering is approximate. Never raises.
pub(crate) fn sort_versions_desc(mut versions: Vec<String>, depth: usize) -> (Vec<String>, bool) {
    let tuples: Option<Vec<Vec<u64>>> = versions
        .iter()
        .map(|v| numeric_tuple(v, depth))
        .collect();

    match tuples {
        Some(_) => {
            versions.sort_by(|a, b| {
                let ta = numeric_tuple(a, depth).unwrap_or_default();
                let tb = numeric_tuple(b, depth).unwrap_or_default();
                tb.cmp(&ta).then_with(|| b.cmp(a))
            });
            (versions, false)
        }
        None => {
            versions.sort_by(|a, b| b.cmp(a));
            (versions, true)
        }
    }
}

fn leading_component(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

// ─── Forge (promotion map) ──────────────────────────────

#[derive(Debug, Deserialize)]
struct ForgePromotions {
    #[serde(default)]
    promos: HashMap<String, String>,
}

pub struct ForgeMeta {
    client: reqwest::Client,
    endpoints: LoaderEndpoints,
}

impl ForgeMeta {
    pub fn new(client: reqwest::Client, endpoints: LoaderEndpoints) -> Self {
        Self { client, endpoints }
    }

    /// All promoted versions for one game version, deduplicated,
    /// newest first.
    fn versions_from_promos(
        promos: &HashMap<String, String>,
        game_version: &str,
    ) -> (Vec<String>, bool) {
        let prefix = format!("{game_version}-");
        let mut versions = Vec::new();
        for (key, version) in promos {
            if key.starts_with(&prefix) && !versions.contains(version) {
                versions.push(version.clone());
            }
        }
        sort_versions_desc(versions, usize::MAX)
    }

    fn installer_source(&self, game_version: &str, version: &str) -> InstallerSource {
        let id = format!("{game_version}-{version}");
        let file_name = format!("forge-{id}-installer.jar");
        InstallerSource::Url {
            url: format!(
                "{}/net/minecraftforge/forge/{id}/{file_name}",
                self.endpoints.forge_maven
            ),
            file_name,
        }
    }
}

#[async_trait]
impl LoaderMetaSource for ForgeMeta {
    async fn resolve(
        &self,
        game_version: &str,
        requested: &Version,
    ) -> LauncherResult<LoaderDescriptor> {
        let version = match requested {
            Version::Exact(v) => v.clone(),
            Version::Latest => {
                let promotions: ForgePromotions =
                    fetch_json(&self.client, &self.endpoints.forge_promotions).await?;
                let key = format!("{game_version}-latest");
                promotions
                    .promos
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| LauncherError::VersionNotFound(key))?
            }
        };

        Ok(LoaderDescriptor {
            kind: LoaderKind::Forge,
            installer: self.installer_source(game_version, &version),
            version,
        })
    }

    async fn available_versions(&self, game_version: &str) -> VersionCandidates {
        let promotions: ForgePromotions =
            match fetch_json(&self.client, &self.endpoints.forge_promotions).await {
                Ok(p) => p,
                Err(e) => {
                    debug!("Forge promotions unavailable: {e}");
                    return VersionCandidates::latest_sentinel();
                }
            };

        let (versions, approximate) = Self::versions_from_promos(&promotions.promos, game_version);
        if versions.is_empty() {
            return VersionCandidates::latest_sentinel();
        }
        if approximate {
            warn!("Forge version ordering degraded to lexical for {game_version}");
        }
        VersionCandidates {
            entries: versions.into_iter().map(Version::Exact).collect(),
            approximate,
        }
    }
}

// ─── NeoForge (Maven metadata XML) ──────────────────────

#[derive(Debug, Deserialize)]
struct MavenMetadata {
    versioning: MavenVersioning,
}

#[derive(Debug, Deserialize)]
struct MavenVersioning {
    versions: MavenVersions,
}

#[derive(Debug, Deserialize)]
struct MavenVersions {
    #[serde(default, rename = "version")]
    entries: Vec<String>,
}

pub struct NeoForgeMeta {
    client: reqwest::Client,
    endpoints: LoaderEndpoints,
}

/// NeoForge candidate lists are capped at the newest 15 entries.
const NEOFORGE_CANDIDATE_CAP: usize = 15;

impl NeoForgeMeta {
    pub fn new(client: reqwest::Client, endpoints: LoaderEndpoints) -> Self {
        Self { client, endpoints }
    }

    /// Filter on matching leading version component, order by the first
    /// two numeric components, cap the list.
    fn candidates(all: Vec<String>, game_version: &str) -> (Vec<String>, bool) {
        let target = leading_component(game_version);
        let mut matching = Vec::new();
        for version in all {
            if leading_component(&version) == target && !matching.contains(&version) {
                matching.push(version);
            }
        }
        let (mut sorted, approximate) = sort_versions_desc(matching, 2);
        sorted.truncate(NEOFORGE_CANDIDATE_CAP);
        (sorted, approximate)
    }

    async fn fetch_versions(&self) -> LauncherResult<Vec<String>> {
        let xml = fetch_text(&self.client, &self.endpoints.neoforge_metadata).await?;
        let metadata: MavenMetadata = quick_xml::de::from_str(&xml)?;
        Ok(metadata.versioning.versions.entries)
    }

    fn installer_source(&self, version: &str) -> InstallerSource {
        let file_name = format!("neoforge-{version}-installer.jar");
        InstallerSource::Url {
            url: format!(
                "{}/net/neoforged/neoforge/{version}/{file_name}",
                self.endpoints.neoforge_maven
            ),
            file_name,
        }
    }
}

#[async_trait]
impl LoaderMetaSource for NeoForgeMeta {
    async fn resolve(
        &self,
        game_version: &str,
        requested: &Version,
    ) -> LauncherResult<LoaderDescriptor> {
        let version = match requested {
            Version::Exact(v) => v.clone(),
            Version::Latest => {
                let (candidates, _) = Self::candidates(self.fetch_versions().await?, game_version);
                candidates
                    .into_iter()
                    .next()
                    .ok_or_else(|| LauncherError::VersionNotFound(game_version.to_string()))?
            }
        };

        Ok(LoaderDescriptor {
            kind: LoaderKind::NeoForge,
            installer: self.installer_source(&version),
            version,
        })
    }

    async fn available_versions(&self, game_version: &str) -> VersionCandidates {
        let all = match self.fetch_versions().await {
            Ok(v) => v,
            Err(e) => {
                debug!("NeoForge metadata unavailable: {e}");
                return VersionCandidates::latest_sentinel();
            }
        };

        let (versions, approximate) = Self::candidates(all, game_version);
        if versions.is_empty() {
            return VersionCandidates::latest_sentinel();
        }
        if approximate {
            warn!("NeoForge version ordering degraded to lexical for {game_version}");
        }
        VersionCandidates {
            entries: versions.into_iter().map(Version::Exact).collect(),
            approximate,
        }
    }
}

// ─── Fabric (loader/installer list pair) ────────────────

#[derive(Debug, Deserialize)]
struct FabricLoaderEntry {
    version: String,
}

#[derive(Debug, Deserialize)]
struct FabricInstallerEntry {
    version: String,
}

pub struct FabricMeta {
    client: reqwest::Client,
    endpoints: LoaderEndpoints,
}

/// Fabric candidate lists pair the newest installer with the top 10
/// loader entries.
const FABRIC_CANDIDATE_CAP: usize = 10;

impl FabricMeta {
    pub fn new(client: reqwest::Client, endpoints: LoaderEndpoints) -> Self {
        Self { client, endpoints }
    }

    async fn fetch_loaders(&self) -> LauncherResult<Vec<FabricLoaderEntry>> {
        let url = format!("{}/versions/loader", self.endpoints.fabric_meta);
        fetch_json(&self.client, &url).await
    }

    async fn fetch_installers(&self) -> LauncherResult<Vec<FabricInstallerEntry>> {
        let url = format!("{}/versions/installer", self.endpoints.fabric_meta);
        fetch_json(&self.client, &url).await
    }

    /// Top loader versions, each implicitly paired with the newest
    /// installer. Both lists come pre-sorted newest-first upstream.
    fn pair(loaders: &[FabricLoaderEntry], installers: &[FabricInstallerEntry]) -> Vec<String> {
        if installers.is_empty() {
            return Vec::new();
        }
        loaders
            .iter()
            .take(FABRIC_CANDIDATE_CAP)
            .map(|l| l.version.clone())
            .collect()
    }

    fn installer_source(
        &self,
        game_version: &str,
        loader_version: &str,
        installer_version: &str,
    ) -> InstallerSource {
        InstallerSource::Url {
            url: format!(
                "{}/versions/loader/{game_version}/{loader_version}/installer/{installer_version}/server.jar",
                self.endpoints.fabric_meta
            ),
            file_name: format!("fabric-installer-{game_version}-{loader_version}.jar"),
        }
    }
}

#[async_trait]
impl LoaderMetaSource for FabricMeta {
    async fn resolve(
        &self,
        game_version: &str,
        requested: &Version,
    ) -> LauncherResult<LoaderDescriptor> {
        let loader_version = match requested {
            Version::Exact(v) => v.clone(),
            Version::Latest => self
                .fetch_loaders()
                .await?
                .into_iter()
                .next()
                .map(|l| l.version)
                .ok_or_else(|| LauncherError::VersionNotFound(game_version.to_string()))?,
        };

        let installer_version = self
            .fetch_installers()
            .await?
            .into_iter()
            .next()
            .map(|i| i.version)
            .ok_or_else(|| {
                LauncherError::Upstream("Fabric installer list is empty".to_string())
            })?;

        Ok(LoaderDescriptor {
            kind: LoaderKind::Fabric,
            installer: self.installer_source(game_version, &loader_version, &installer_version),
            version: loader_version,
        })
    }

    async fn available_versions(&self, _game_version: &str) -> VersionCandidates {
        let loaders = match self.fetch_loaders().await {
            Ok(l) => l,
            Err(e) => {
                debug!("Fabric loader list unavailable: {e}");
                return VersionCandidates::latest_sentinel();
            }
        };
        let installers = match self.fetch_installers().await {
            Ok(i) => i,
            Err(e) => {
                debug!("Fabric installer list unavailable: {e}");
                return VersionCandidates::latest_sentinel();
            }
        };

        let versions = Self::pair(&loaders, &installers);
        if versions.is_empty() {
            return VersionCandidates::latest_sentinel();
        }
        VersionCandidates {
            entries: versions.into_iter().map(Version::Exact).collect(),
            approximate: false,
        }
    }
}

// ─── Dispatcher ─────────────────────────────────────────

/// Enum dispatcher over the three families, no `Box<dyn>` needed.
pub enum LoaderMeta {
    Forge(ForgeMeta),
    NeoForge(NeoForgeMeta),
    Fabric(FabricMeta),
}

impl LoaderMeta {
    /// `None` for vanilla, which has no loader metadata to resolve.
    pub fn new(
        kind: LoaderKind,
        client: reqwest::Client,
        endpoints: LoaderEndpoints,
    ) -> Option<Self> {
        match kind {
            LoaderKind::Vanilla => None,
            LoaderKind::Forge => Some(Self::Forge(ForgeMeta::new(client, endpoints))),
            LoaderKind::NeoForge => Some(Self::NeoForge(NeoForgeMeta::new(client, endpoints))),
            LoaderKind::Fabric => Some(Self::Fabric(FabricMeta::new(client, endpoints))),
        }
    }

    pub async fn resolve(
        &self,
        game_version: &str,
        requested: &Version,
    ) -> LauncherResult<LoaderDescriptor> {
        match self {
            LoaderMeta::Forge(m) => m.resolve(game_version, requested).await,
            LoaderMeta::NeoForge(m) => m.resolve(game_version, requested).await,
            LoaderMeta::Fabric(m) => m.resolve(game_version, requested).await,
        }
    }

    pub async fn available_versions(&self, game_version: &str) -> VersionCandidates {
        match self {
            LoaderMeta::Forge(m) => m.available_versions(game_version).await,
            LoaderMeta::NeoForge(m) => m.available_versions(game_version).await,
            LoaderMeta::Fabric(m) => m.available_versions(game_version).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::build_http_client;

    fn unreachable_endpoints() -> LoaderEndpoints {
        LoaderEndpoints {
            forge_promotions: "http://127.0.0.1:1/promotions_slim.json".into(),
            forge_maven: "http://127.0.0.1:1".into(),
            neoforge_metadata: "http://127.0.0.1:1/maven-metadata.xml".into(),
            neoforge_maven: "http://127.0.0.1:1".into(),
            fabric_meta: "http://127.0.0.1:1".into(),
        }
    }

    #[test]
    fn numeric_sort_is_newest_first() {
        let (sorted, approximate) = sort_versions_desc(
            vec!["52.0.2".into(), "52.0.10".into(), "51.0.33".into()],
            usize::MAX,
        );
        assert!(!approximate);
        assert_eq!(sorted, vec!["52.0.10", "52.0.2", "51.0.33"]);
    }

    #[test]
    fn unparsable_entry_degrades_whole_sort_to_lexical() {
        let (sorted, approximate) = sort_versions_desc(
            vec!["52.0.2".into(), "52.0.x".into()],
            usize::MAX,
        );
        assert!(approximate);
        assert_eq!(sorted, vec!["52.0.x", "52.0.2"]);
    }

    #[test]
    fn beta_suffix_sorts_numerically_at_depth_two() {
        // Only the first two components are compared, so "-beta" in the
        // third never breaks numeric order.
        let (sorted, approximate) = sort_versions_desc(
            vec!["21.0.35-beta".into(), "21.1.77".into(), "20.4.109".into()],
            2,
        );
        assert!(!approximate);
        assert_eq!(sorted, vec!["21.1.77", "21.0.35-beta", "20.4.109"]);
    }

    #[test]
    fn forge_promotions_filter_by_game_version() {
        let mut promos = HashMap::new();
        promos.insert("1.21.1-latest".to_string(), "52.0.2".to_string());
        promos.insert("1.21.1-recommended".to_string(), "52.0.1".to_string());
        promos.insert("1.20.1-latest".to_string(), "47.3.0".to_string());

        let (versions, approximate) = ForgeMeta::versions_from_promos(&promos, "1.21.1");
        assert!(!approximate);
        assert_eq!(versions, vec!["52.0.2", "52.0.1"]);
    }

    #[test]
    fn neoforge_candidates_match_leading_component() {
        let all = vec![
            "21.1.77".to_string(),
            "21.0.35-beta".to_string(),
            "20.4.109".to_string(),
        ];
        let (versions, _) = NeoForgeMeta::candidates(all, "21.1.77");
        assert_eq!(versions, vec!["21.1.77", "21.0.35-beta"]);
    }

    #[test]
    fn neoforge_candidates_are_capped() {
        let all: Vec<String> = (0..30).map(|i| format!("21.{i}.0")).collect();
        let (versions, _) = NeoForgeMeta::candidates(all, "21.0.0");
        assert_eq!(versions.len(), NEOFORGE_CANDIDATE_CAP);
        assert_eq!(versions[0], "21.29.0");
    }

    #[test]
    fn fabric_pairing_requires_an_installer() {
        let loaders: Vec<FabricLoaderEntry> = (0..12)
            .map(|i| FabricLoaderEntry {
                version: format!("0.16.{}", 12 - i),
            })
            .collect();

        assert!(FabricMeta::pair(&loaders, &[]).is_empty());

        let installers = vec![FabricInstallerEntry {
            version: "1.0.1".into(),
        }];
        let paired = FabricMeta::pair(&loaders, &installers);
        assert_eq!(paired.len(), FABRIC_CANDIDATE_CAP);
        assert_eq!(paired[0], "0.16.12");
    }

    #[test]
    fn maven_metadata_xml_deserializes() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <metadata>
              <groupId>net.neoforged</groupId>
              <artifactId>neoforge</artifactId>
              <versioning>
                <latest>21.1.77</latest>
                <release>21.1.77</release>
                <versions>
                  <version>20.4.109</version>
                  <version>21.1.77</version>
                </versions>
              </versioning>
            </metadata>"#;
        let metadata: MavenMetadata = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(
            metadata.versioning.versions.entries,
            vec!["20.4.109", "21.1.77"]
        );
    }

    #[tokio::test]
    async fn listing_degrades_to_latest_sentinel_when_unreachable() {
        let client = build_http_client().unwrap();
        for kind in [LoaderKind::Forge, LoaderKind::NeoForge, LoaderKind::Fabric] {
            let meta = LoaderMeta::new(kind, client.clone(), unreachable_endpoints()).unwrap();
            let candidates = meta.available_versions("1.21.1").await;
            assert_eq!(candidates.entries, vec![Version::Latest]);
        }
    }

    #[tokio::test]
    async fn strict_resolution_errors_when_unreachable() {
        let client = build_http_client().unwrap();
        let meta =
            LoaderMeta::new(LoaderKind::Forge, client, unreachable_endpoints()).unwrap();
        let err = meta.resolve("1.21.1", &Version::Latest).await.unwrap_err();
        assert!(matches!(err, LauncherError::Upstream(_)));
    }

    #[tokio::test]
    async fn exact_version_resolves_without_touching_the_network() {
        let client = build_http_client().unwrap();
        let meta = LoaderMeta::new(LoaderKind::Forge, client, unreachable_endpoints()).unwrap();
        let descriptor = meta
            .resolve("1.21.1", &Version::Exact("52.0.2".into()))
            .await
            .unwrap();
        assert_eq!(descriptor.version, "52.0.2");
        match descriptor.installer {
            InstallerSource::Url { url, file_name } => {
                assert_eq!(file_name, "forge-1.21.1-52.0.2-installer.jar");
                assert!(url.ends_with(
                    "/net/minecraftforge/forge/1.21.1-52.0.2/forge-1.21.1-52.0.2-installer.jar"
                ));
            }
            InstallerSource::Manual => panic!("expected a URL source"),
        }
    }
}
