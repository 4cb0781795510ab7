use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{InstallerError, InstallerResult};
use crate::core::mrpack::Side;

const DEFAULT_USER_AGENT: &str = concat!("mrpack-installer/", env!("CARGO_PKG_VERSION"));
const DEFAULT_API_BASE: &str = "https://api.modrinth.com/v2";
const DEFAULT_PROJECT: &str = "axolotlclient-modpack";
const DEFAULT_DISPLAY_NAME: &str = "AxolotlClient";

/// Metadata URL templates for each loader dialect.
///
/// `{game_version}` and `{loader_version}` are substituted verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoaderEndpoints {
    pub quilt: String,
    pub fabric: String,
    pub fabric_legacy: String,
    pub fabric_combat: String,
}

impl Default for LoaderEndpoints {
    fn default() -> Self {
        Self {
            quilt: "https://meta.quiltmc.org/v3/versions/loader/{game_version}/{loader_version}/profile/json".into(),
            fabric: "https://meta.fabricmc.net/v2/versions/loader/{game_version}/{loader_version}/profile/json".into(),
            fabric_legacy: "https://meta.legacyfabric.net/v2/versions/loader/{game_version}/{loader_version}/profile/json".into(),
            fabric_combat: "https://meta.fabricmc.net/v2/versions/loader/{game_version}/{loader_version}/profile/json".into(),
        }
    }
}

/// Installer configuration, built once by the entry point and passed down.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub user_agent: String,
    pub api_base: String,
    /// Modrinth project slug or id of the modpack.
    pub project: String,
    /// Only request versions flagged as featured.
    pub featured_only: bool,
    /// Prefix for launcher profile names ("<display_name> <game version>").
    pub display_name: String,
    pub side: Side,
    pub endpoints: LoaderEndpoints,
    pub install_optional: bool,
    pub verify_checksums: bool,
    /// PNG embedded as a data URI in the launcher profile.
    pub icon: Option<PathBuf>,
    pub launcher_root: Option<PathBuf>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            project: DEFAULT_PROJECT.to_string(),
            featured_only: true,
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            side: Side::Client,
            endpoints: LoaderEndpoints::default(),
            install_optional: false,
            verify_checksums: false,
            icon: None,
            launcher_root: None,
        }
    }
}

impl InstallerConfig {
    /// Read a JSON config file. Keys that are absent keep their defaults.
    pub fn load(path: &Path) -> InstallerResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| InstallerError::io(path, e))?;
        let config: InstallerConfig = serde_json::from_str(&raw)?;
        debug!("Loaded installer config from {:?}", path);
        Ok(config)
    }

    /// The configured launcher root, or the platform's `.minecraft`.
    pub fn launcher_root(&self) -> PathBuf {
        self.launcher_root
            .clone()
            .unwrap_or_else(default_launcher_root)
    }

    /// Default game directory for a game version: `<launcher>/<project>/<version>`.
    pub fn default_game_dir(&self, launcher_root: &Path, game_version: &str) -> PathBuf {
        launcher_root.join(&self.project).join(game_version)
    }
}

/// Location of the vanilla launcher's data directory on this platform.
pub fn default_launcher_root() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minecraft")
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("minecraft")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".minecraft")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let json = r#"{ "project": "my-pack", "side": "server" }"#;
        let config: InstallerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.project, "my-pack");
        assert_eq!(config.side, Side::Server);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(config.featured_only);
        assert!(!config.verify_checksums);
        assert_eq!(config.endpoints, LoaderEndpoints::default());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installer.json");
        std::fs::write(&path, r#"{ "display_name": "Test Pack", "install_optional": true }"#)
            .unwrap();

        let config = InstallerConfig::load(&path).unwrap();
        assert_eq!(config.display_name, "Test Pack");
        assert!(config.install_optional);
    }

    #[test]
    fn default_game_dir_is_under_project_folder() {
        let config = InstallerConfig::default();
        let dir = config.default_game_dir(Path::new("/mc"), "1.20.1");
        assert_eq!(dir, PathBuf::from("/mc/axolotlclient-modpack/1.20.1"));
    }
}
