pub(crate) mod extract;
mod manifest;
mod paths;

pub use extract::{extract_pack, ExtractedPack, MANIFEST_NAME, OVERRIDES_PREFIX};
pub use manifest::{
    Environment, FileEntry, ModrinthIndex, PackManifest, Side, FABRIC_LOADER_DEPENDENCY,
    MINECRAFT_DEPENDENCY, QUILT_LOADER_DEPENDENCY,
};
pub use paths::{normalize_relative, resolve_within};
