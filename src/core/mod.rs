// ─── mrpack installer core ───
// Installs Modrinth modpacks into the vanilla launcher.
//
// Architecture:
//   core/
//     version/    - Loose version comparison and sorting
//     catalog/    - Release feed + game-version index
//     mrpack/     - Pack manifest, path safety, archive extraction
//     downloader/ - Mirror fallback downloads + progress sinks
//     loaders/    - Fabric / Quilt profile resolution and staging
//     launcher/   - launcher_profiles.json registry
//     install/    - End-to-end install pipeline
//     state/      - Installer configuration

pub mod catalog;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod launcher;
pub mod loaders;
pub mod mrpack;
pub mod state;
pub mod version;
