//! Wildcat launcher acquisition core: version manifest resolution,
//! bounded-parallel downloads, loader installer acquisition, modpack
//! import and launch argument synthesis. The GUI, process supervision
//! and config persistence live in the embedding application.

pub mod assets;
pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod install;
pub mod launch;
pub mod loader;
pub mod pack;
pub mod paths;
pub mod progress;
pub mod version;

use tracing_subscriber::EnvFilter;

pub use config::SessionConfig;
pub use error::{LauncherError, LauncherResult};
pub use install::Installer;
pub use launch::LaunchSpecification;
pub use loader::{InstallerAcquirer, LoaderKind, Version};
pub use pack::{PackImporter, PackManifest};
pub use paths::Layout;

/// Initialize structured logging. Call once from the embedding
/// application's entry point.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,wildcat_core=debug")),
        )
        .init();
}
