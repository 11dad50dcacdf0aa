use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the entire acquisition core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    /// Remote metadata endpoint unreachable or returned a malformed document.
    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    // ── Resolution ──────────────────────────────────────
    #[error("Version not found upstream: {0}")]
    VersionNotFound(String),

    // ── Download batches ────────────────────────────────
    /// First failing task in a batch. Siblings already in flight were
    /// allowed to drain; no further tasks were started.
    #[error("Download task failed ({label}): {source}")]
    Task {
        label: String,
        #[source]
        source: Box<LauncherError>,
    },

    // ── Manual installer placement ──────────────────────
    #[error("Manual installer placement cancelled by user")]
    ManualCancelled,

    #[error("Timed out waiting for an installer matching '{fragment}' in {dir:?}")]
    ManualTimeout { dir: PathBuf, fragment: String },

    // ── Argument synthesis ──────────────────────────────
    #[error("Missing required configuration value: {0}")]
    MissingConfig(&'static str),

    #[error("Unresolved placeholder token: ${{{0}}}")]
    UnresolvedToken(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    // ── Pack import ─────────────────────────────────────
    #[error("Pack import error: {0}")]
    Pack(String),

    // ── XML ─────────────────────────────────────────────
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// IO error carrying the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable kind tag, paired with `to_string()` for the
    /// human-readable half of every fatal report.
    pub fn kind(&self) -> &'static str {
        match self {
            LauncherError::Io { .. } => "io",
            LauncherError::Http(_) => "http",
            LauncherError::DownloadFailed { .. } => "download_failed",
            LauncherError::Upstream(_) => "upstream_unavailable",
            LauncherError::VersionNotFound(_) => "not_found",
            LauncherError::Task { .. } => "task_failure",
            LauncherError::ManualCancelled => "manual_cancelled",
            LauncherError::ManualTimeout { .. } => "manual_timeout",
            LauncherError::MissingConfig(_)
            | LauncherError::UnresolvedToken(_)
            | LauncherError::Synthesis(_) => "synthesis_error",
            LauncherError::Pack(_) => "pack_import",
            LauncherError::Xml(_) => "xml",
            LauncherError::Json(_) => "json",
            LauncherError::Zip(_) => "zip",
            LauncherError::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_failure_preserves_cause() {
        let cause = LauncherError::DownloadFailed {
            url: "https://example.com/a.jar".into(),
            status: 404,
        };
        let err = LauncherError::Task {
            label: "a.jar".into(),
            source: Box::new(cause),
        };
        assert_eq!(err.kind(), "task_failure");
        assert!(err.to_string().contains("a.jar"));
    }

    #[test]
    fn kind_tags_cover_synthesis_family() {
        assert_eq!(LauncherError::MissingConfig("player name").kind(), "synthesis_error");
        assert_eq!(
            LauncherError::UnresolvedToken("auth_session".into()).kind(),
            "synthesis_error"
        );
    }
}
