pub mod installer;
pub mod manual;
pub mod meta;

pub use installer::InstallerAcquirer;
pub use manual::ManualPlacement;
pub use meta::{LoaderDescriptor, LoaderEndpoints, LoaderMeta, VersionCandidates};

use serde::{Deserialize, Serialize};

/// Supported mod loader families.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    Vanilla,
    Forge,
    Fabric,
    NeoForge,
}

impl LoaderKind {
    /// Filename fragment identifying this family's installers in the
    /// loaders cache (prefix for scans, substring for manual placement).
    pub fn installer_fragment(&self) -> Option<&'static str> {
        match self {
            LoaderKind::Vanilla => None,
            LoaderKind::Forge => Some("forge-"),
            LoaderKind::Fabric => Some("fabric-"),
            LoaderKind::NeoForge => Some("neoforge-"),
        }
    }

    /// Detect a loader family from a free-form loader-id string, e.g.
    /// `"neoforge-21.1.77"` or `"fabric"`. Case-insensitive substring
    /// match; NeoForge is checked first since it contains "forge".
    pub fn detect(loader_id: &str) -> Option<LoaderKind> {
        let lowered = loader_id.to_lowercase();
        if lowered.contains("neoforge") {
            Some(LoaderKind::NeoForge)
        } else if lowered.contains("forge") {
            Some(LoaderKind::Forge)
        } else if lowered.contains("fabric") {
            Some(LoaderKind::Fabric)
        } else {
            None
        }
    }
}

impl std::fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderKind::Vanilla => write!(f, "vanilla"),
            LoaderKind::Forge => write!(f, "forge"),
            LoaderKind::Fabric => write!(f, "fabric"),
            LoaderKind::NeoForge => write!(f, "neoforge"),
        }
    }
}

/// A requested loader or game version: either a pinned identifier or
/// "whatever the upstream resolves as newest at acquisition time".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Version {
    Latest,
    Exact(String),
}

impl Version {
    /// Parse the conventional string form; empty or "latest" is the
    /// sentinel, anything else is exact.
    pub fn parse(raw: &str) -> Version {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("latest") {
            Version::Latest
        } else {
            Version::Exact(trimmed.to_string())
        }
    }

    pub fn as_exact(&self) -> Option<&str> {
        match self {
            Version::Latest => None,
            Version::Exact(v) => Some(v),
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::Latest => write!(f, "latest"),
            Version::Exact(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_prefers_neoforge_over_forge() {
        assert_eq!(LoaderKind::detect("neoforge-21.1.77"), Some(LoaderKind::NeoForge));
        assert_eq!(LoaderKind::detect("forge-52.0.2"), Some(LoaderKind::Forge));
        assert_eq!(LoaderKind::detect("Fabric"), Some(LoaderKind::Fabric));
        assert_eq!(LoaderKind::detect("quilt-0.26"), None);
    }

    #[test]
    fn version_parse_maps_sentinels() {
        assert_eq!(Version::parse(""), Version::Latest);
        assert_eq!(Version::parse("LATEST"), Version::Latest);
        assert_eq!(Version::parse(" 52.0.2 "), Version::Exact("52.0.2".into()));
    }
}
