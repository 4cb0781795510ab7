use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::paths::normalize_relative;
use crate::core::error::InstallerResult;

pub const MINECRAFT_DEPENDENCY: &str = "minecraft";
pub const FABRIC_LOADER_DEPENDENCY: &str = "fabric-loader";
pub const QUILT_LOADER_DEPENDENCY: &str = "quilt-loader";

/// Installation context a pack is being installed for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Client,
    Server,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Client => "client",
            Side::Server => "server",
        }
    }

    /// Archive prefix holding overrides only applied on this side.
    pub fn overrides_prefix(&self) -> String {
        format!("{}-overrides/", self.as_str())
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a file applies to the side being installed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Required,
    Optional,
    Unsupported,
}

/// A file the pack expects to be downloaded into the game directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Normalized path relative to the install root.
    pub relative_path: PathBuf,
    pub sha1: String,
    pub size_bytes: u64,
    pub environment: Environment,
    /// Candidate sources, tried in order.
    pub mirror_urls: Vec<String>,
}

/// Parsed `modrinth.index.json`, with file environments resolved for one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackManifest {
    pub name: Option<String>,
    pub version_id: Option<String>,
    pub dependencies: BTreeMap<String, String>,
    pub files: Vec<FileEntry>,
}

impl PackManifest {
    /// Build the manifest from the raw index. Every file path is checked
    /// against `root` so later downloads cannot land outside it.
    pub fn from_index(index: ModrinthIndex, side: Side, root: &Path) -> InstallerResult<Self> {
        let files = index
            .files
            .into_iter()
            .map(|file| {
                let relative_path = normalize_relative(root, &file.path)?;
                let environment = file
                    .env
                    .as_ref()
                    .and_then(|env| env.for_side(side))
                    .unwrap_or_default();
                Ok(FileEntry {
                    relative_path,
                    sha1: file.hashes.sha1,
                    size_bytes: file.file_size,
                    environment,
                    mirror_urls: file.downloads,
                })
            })
            .collect::<InstallerResult<Vec<_>>>()?;

        Ok(Self {
            name: index.name,
            version_id: index.version_id,
            dependencies: index.dependencies,
            files,
        })
    }

    pub fn game_version(&self) -> Option<&str> {
        self.dependencies.get(MINECRAFT_DEPENDENCY).map(String::as_str)
    }
}

// ── Wire format ─────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModrinthIndex {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version_id: Option<String>,
    pub dependencies: BTreeMap<String, String>,
    pub files: Vec<ModrinthIndexFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModrinthIndexFile {
    pub path: String,
    pub hashes: FileHashes,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub env: Option<FileEnv>,
    pub downloads: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileHashes {
    pub sha1: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileEnv {
    #[serde(default)]
    pub client: Option<Environment>,
    #[serde(default)]
    pub server: Option<Environment>,
}

impl FileEnv {
    fn for_side(&self, side: Side) -> Option<Environment> {
        match side {
            Side::Client => self.client,
            Side::Server => self.server,
        }
    }
}
