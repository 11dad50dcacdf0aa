pub mod descriptor;
pub mod manifest;

pub use descriptor::{AssetIndexRef, ClientArtifactRef, LibraryRef, VersionDescriptor};
pub use manifest::{VersionEntry, VersionManifest};
