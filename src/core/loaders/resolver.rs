use std::collections::BTreeMap;
use std::fmt;

use tracing::info;

use super::fabric::FabricDialect;
use crate::core::error::{InstallerError, InstallerResult};
use crate::core::mrpack::{FABRIC_LOADER_DEPENDENCY, QUILT_LOADER_DEPENDENCY};
use crate::core::state::LoaderEndpoints;

/// Mod loaders a pack can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    Quilt,
    Fabric(FabricDialect),
}

impl LoaderKind {
    /// Dependency key used in `modrinth.index.json`.
    pub fn dependency_name(&self) -> &'static str {
        match self {
            LoaderKind::Quilt => QUILT_LOADER_DEPENDENCY,
            LoaderKind::Fabric(_) => FABRIC_LOADER_DEPENDENCY,
        }
    }

    fn endpoint_template<'a>(&self, endpoints: &'a LoaderEndpoints) -> &'a str {
        match self {
            LoaderKind::Quilt => &endpoints.quilt,
            LoaderKind::Fabric(FabricDialect::Standard) => &endpoints.fabric,
            LoaderKind::Fabric(FabricDialect::Legacy) => &endpoints.fabric_legacy,
            LoaderKind::Fabric(FabricDialect::Combat) => &endpoints.fabric_combat,
        }
    }
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderKind::Quilt => write!(f, "quilt"),
            LoaderKind::Fabric(FabricDialect::Standard) => write!(f, "fabric"),
            LoaderKind::Fabric(FabricDialect::Legacy) => write!(f, "fabric (legacy)"),
            LoaderKind::Fabric(FabricDialect::Combat) => write!(f, "fabric (combat)"),
        }
    }
}

/// A resolved loader runtime profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderProfile {
    pub kind: LoaderKind,
    pub loader_version: String,
    pub game_version: String,
    /// `<loader>-<loader version>-<game version>`; also the local directory name.
    pub profile_id: String,
    pub metadata_url: String,
}

/// Pick the loader declared by a pack and the metadata URL to fetch for it.
///
/// Quilt takes precedence over Fabric when both are declared.
pub fn resolve_loader(
    dependencies: &BTreeMap<String, String>,
    game_version: &str,
    endpoints: &LoaderEndpoints,
) -> InstallerResult<LoaderProfile> {
    let (kind, loader_version) = if let Some(v) = dependencies.get(QUILT_LOADER_DEPENDENCY) {
        (LoaderKind::Quilt, v)
    } else if let Some(v) = dependencies.get(FABRIC_LOADER_DEPENDENCY) {
        (LoaderKind::Fabric(FabricDialect::for_game_version(game_version)), v)
    } else {
        return Err(InstallerError::UnsupportedLoader(format!("{:?}", dependencies)));
    };

    let profile_id = format!("{}-{}-{}", kind.dependency_name(), loader_version, game_version);
    let metadata_url = kind
        .endpoint_template(endpoints)
        .replace("{game_version}", game_version)
        .replace("{loader_version}", loader_version);

    info!("Resolved {} loader {} for Minecraft {}", kind, loader_version, game_version);

    Ok(LoaderProfile {
        kind,
        loader_version: loader_version.clone(),
        game_version: game_version.to_string(),
        profile_id,
        metadata_url,
    })
}
