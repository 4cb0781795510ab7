use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::core::error::{InstallerError, InstallerResult};

pub const PROFILES_FILE: &str = "launcher_profiles.json";
const PROFILES_SCHEMA_VERSION: u32 = 3;
const FALLBACK_ICON: &str = "Furnace";

fn default_schema_version() -> u32 {
    PROFILES_SCHEMA_VERSION
}

/// The vanilla launcher's `launcher_profiles.json`.
///
/// Existing profiles and unknown top-level keys are kept as raw JSON so a
/// read-modify-write never drops data written by the launcher itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LauncherProfiles {
    #[serde(default = "default_schema_version")]
    pub version: u32,
    #[serde(default)]
    pub profiles: Map<String, Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Default for LauncherProfiles {
    fn default() -> Self {
        Self {
            version: PROFILES_SCHEMA_VERSION,
            profiles: Map::new(),
            other: Map::new(),
        }
    }
}

/// A single launcher profile entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LauncherProfile {
    pub created: String,
    pub last_used: String,
    pub last_version_id: String,
    pub name: String,
    pub icon: String,
    pub game_dir: String,
    #[serde(rename = "type")]
    pub profile_type: String,
}

impl LauncherProfile {
    pub fn new(name: &str, version_id: &str, game_dir: &Path, icon: String) -> Self {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        Self {
            created: now.clone(),
            last_used: now,
            last_version_id: version_id.to_string(),
            name: name.to_string(),
            icon,
            game_dir: game_dir.to_string_lossy().to_string(),
            profile_type: "custom".to_string(),
        }
    }
}

impl LauncherProfiles {
    pub fn path(launcher_root: &Path) -> PathBuf {
        launcher_root.join(PROFILES_FILE)
    }

    /// Read the registry. A missing or malformed file yields a fresh document.
    pub async fn load(path: &Path) -> Self {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Cannot read {:?}: {}; starting fresh", path, e);
                }
                return Self::default();
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Corrupt {:?}: {}; starting fresh", path, e);
                Self::default()
            }
        }
    }

    /// Add or replace the profile under `key`, keeping its original
    /// creation time when it already existed.
    pub fn upsert(&mut self, key: &str, mut profile: LauncherProfile) -> InstallerResult<()> {
        let created = self
            .profiles
            .get(key)
            .and_then(|existing| existing.get("created"))
            .and_then(Value::as_str);
        if let Some(created) = created {
            profile.created = created.to_string();
        }

        self.profiles
            .insert(key.to_string(), serde_json::to_value(profile)?);
        Ok(())
    }

    /// Overwrite the whole file.
    pub async fn save(&self, path: &Path) -> InstallerResult<()> {
        let local_state = |reason: String| InstallerError::LocalState {
            path: path.to_path_buf(),
            reason,
        };

        let json = serde_json::to_string_pretty(self).map_err(|e| local_state(e.to_string()))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| local_state(e.to_string()))?;
        }
        tokio::fs::write(path, json)
            .await
            .map_err(|e| local_state(e.to_string()))?;
        Ok(())
    }
}

/// Read-modify-write `launcher_profiles.json` under `launcher_root`.
pub async fn register_profile(
    launcher_root: &Path,
    key: &str,
    profile: LauncherProfile,
) -> InstallerResult<()> {
    let path = LauncherProfiles::path(launcher_root);
    let mut doc = LauncherProfiles::load(&path).await;
    doc.upsert(key, profile).map_err(|e| InstallerError::LocalState {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    doc.save(&path).await?;
    info!("Registered launcher profile '{}'", key);
    Ok(())
}

/// Stable profile name for a pack and game version.
pub fn profile_name(display_name: &str, game_version: &str) -> String {
    format!("{} {}", display_name, game_version)
}

/// Launcher icon: the PNG at `icon` as a data URI, or a built-in icon name.
pub async fn icon_value(icon: Option<&Path>) -> String {
    let Some(path) = icon else {
        return FALLBACK_ICON.to_string();
    };
    match tokio::fs::read(path).await {
        Ok(bytes) => format!("data:image/png;base64,{}", STANDARD.encode(bytes)),
        Err(e) => {
            warn!("Cannot read icon {:?}: {}; using default", path, e);
            FALLBACK_ICON.to_string()
        }
    }
}
